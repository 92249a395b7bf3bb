use super::precompute::generate_magic_tables;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use crate::rng::MAGIC_SEED;
use once_cell::sync::OnceCell;

static MAGIC_TABLES: OnceCell<MagicTables> = OnceCell::new();

fn clone_entry(entry: &MagicEntry) -> MagicEntry {
    MagicEntry {
        magic: entry.magic,
        shift: entry.shift,
        mask: entry.mask,
        table: entry.table.clone(),
    }
}

/// Returns the magic bitboard tables, generating them once from the fixed
/// seed and reusing the same instance for every later caller.
pub fn load_magic_tables() -> MagicTables {
    let cached = MAGIC_TABLES
        .get_or_init(|| generate_magic_tables(MAGIC_SEED).expect("magic number search exhausted"));

    MagicTables {
        rook: RookMagicTables {
            entries: cached.rook.entries.iter().map(clone_entry).collect(),
        },
        bishop: BishopMagicTables {
            entries: cached.bishop.entries.iter().map(clone_entry).collect(),
        },
    }
}
