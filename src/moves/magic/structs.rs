use serde::{Deserialize, Serialize};

/// A single magic bitboard entry used to compute sliding piece attacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicEntry {
    /// The magic number used to hash blocker bitboards into attack indices.
    pub magic: u64,

    /// The number of bits to shift after multiplication to get the table index.
    pub shift: u32,

    /// The precomputed relevant-occupancy mask for this square.
    pub mask: u64,

    /// The precomputed attack table indexed by (blockers * magic) >> shift.
    pub table: Box<[u64]>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RookMagicTables {
    pub entries: Vec<MagicEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BishopMagicTables {
    pub entries: Vec<MagicEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MagicTables {
    pub rook: RookMagicTables,
    pub bishop: BishopMagicTables,
}

impl RookMagicTables {
    #[inline(always)]
    pub fn get_attacks(&self, square: usize, blockers: u64) -> u64 {
        let entry = &self.entries[square];
        let masked = blockers & entry.mask;
        let index = ((masked.wrapping_mul(entry.magic)) >> entry.shift) as usize;
        entry.table[index]
    }
}

impl BishopMagicTables {
    #[inline(always)]
    pub fn get_attacks(&self, square: usize, blockers: u64) -> u64 {
        let entry = &self.entries[square];
        let masked = blockers & entry.mask;
        let index = ((masked.wrapping_mul(entry.magic)) >> entry.shift) as usize;
        entry.table[index]
    }
}

impl MagicTables {
    /// Queen attacks are the union of rook and bishop lookups from the same square.
    #[inline(always)]
    pub fn queen_attacks(&self, square: usize, blockers: u64) -> u64 {
        let rook = self.rook.get_attacks(square, blockers);
        let bishop = self.bishop.get_attacks(square, blockers);
        rook | bishop
    }
}
