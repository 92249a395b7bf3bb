use crate::rng::Xorshift32;
use std::collections::HashMap;

/// Returns a sparse magic-number candidate by AND-ing three draws, which
/// biases toward a low population count and reduces collision risk.
#[inline(always)]
pub fn random_sparse_u64(rng: &mut Xorshift32) -> u64 {
    rng.next_magic_candidate()
}

pub fn is_magic_candidate_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let mut seen: HashMap<u64, u64> = HashMap::new();

    for i in 0..blockers.len() {
        let blocker = blockers[i];
        let attack = attacks[i];
        let product = blocker.wrapping_mul(magic);
        let index = product >> shift;

        if let std::collections::hash_map::Entry::Vacant(e) = seen.entry(index) {
            e.insert(attack);
        } else if seen[&index] != attack {
            return false;
        }
    }

    true
}

pub fn find_magic_number_for_square(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut Xorshift32,
) -> Result<u64, String> {
    for _attempt in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_candidate_valid(blockers, attacks, magic, shift) {
            return Ok(magic);
        }
    }
    Err("failed to find a valid magic number after 1,000,000 attempts".to_string())
}
