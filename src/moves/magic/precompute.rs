use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use crate::rng::Xorshift32;

/// Relevant occupancy mask for a rook on `square`: the four rays, excluding
/// the edge square each ray terminates on (the edge itself never needs to be
/// part of the blocker key, since a piece there always blocks the ray).
pub fn relevant_rook_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }

    mask
}

/// Relevant occupancy mask for a bishop on `square`: the four diagonals,
/// excluding the edge squares.
pub fn relevant_bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    let mut r = rank + 1;
    let mut f = file + 1;
    while r < 7 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    let mut r = rank - 1;
    let mut f = file - 1;
    while r > 0 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    let mut r = rank + 1;
    let mut f = file - 1;
    while r < 7 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    let mut r = rank - 1;
    let mut f = file + 1;
    while r > 0 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }

    mask
}

/// Enumerates every subset of `mask` via the carry-rippler trick.
fn occupancy_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_rook_table(square: usize, rng: &mut Xorshift32) -> Result<MagicEntry, String> {
    let mask = relevant_rook_mask(square);
    let shift = 64 - mask.count_ones();
    let occupancies = occupancy_subsets(mask);
    let attacks: Vec<u64> = occupancies
        .iter()
        .map(|&occ| rook_attacks_per_square(square, occ))
        .collect();

    let magic = find_magic_number_for_square(&occupancies, &attacks, shift, rng)?;

    let mut table = vec![0u64; 1usize << (64 - shift)];
    for (occ, &atk) in occupancies.iter().zip(attacks.iter()) {
        let index = (occ.wrapping_mul(magic) >> shift) as usize;
        table[index] = atk;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

fn build_bishop_table(square: usize, rng: &mut Xorshift32) -> Result<MagicEntry, String> {
    let mask = relevant_bishop_mask(square);
    let shift = 64 - mask.count_ones();
    let occupancies = occupancy_subsets(mask);
    let attacks: Vec<u64> = occupancies
        .iter()
        .map(|&occ| bishop_attacks_per_square(square, occ))
        .collect();

    let magic = find_magic_number_for_square(&occupancies, &attacks, shift, rng)?;

    let mut table = vec![0u64; 1usize << (64 - shift)];
    for (occ, &atk) in occupancies.iter().zip(attacks.iter()) {
        let index = (occ.wrapping_mul(magic) >> shift) as usize;
        table[index] = atk;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

/// Generates magic bitboard tables for both sliders across all 64 squares,
/// deterministically, from a single seed.
pub fn generate_magic_tables(seed: u32) -> Result<MagicTables, String> {
    let mut rng = Xorshift32::new(seed);

    let mut rook_entries = Vec::with_capacity(64);
    for square in 0..64 {
        rook_entries.push(build_rook_table(square, &mut rng)?);
    }

    let mut bishop_entries = Vec::with_capacity(64);
    for square in 0..64 {
        bishop_entries.push(build_bishop_table(square, &mut rng)?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}
