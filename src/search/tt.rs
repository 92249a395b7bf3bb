use crate::moves::types::Move;

/// Scores at or beyond this magnitude encode a forced mate rather than a
/// material evaluation.
pub const MATE_THRESHOLD: i32 = 30000;

/// Returned by `probe` when the entry carries no usable information for the
/// requested window — a value outside the normal score range.
pub const NO_HASH_ENTRY: i32 = i32::MIN;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeType {
    Exact = 0,
    LowerBound = 1, // beta cutoff (failed high)
    UpperBound = 2, // alpha cutoff (failed low)
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub bound: u8, // 0=Exact, 1=Lower, 2=Upper
    pub generation: u8,
}

pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    pub generation: u8,
}

/// Converts a root-relative score into one that is independent of the
/// current ply, so that a mate found N plies deep reads the same from any
/// probing ply. Inverted by `score_from_tt`.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

const EMPTY_ENTRY: TTEntry = TTEntry {
    key: 0,
    best_move: None,
    score: 0,
    depth: 0,
    bound: 0,
    generation: 0,
};

impl TranspositionTable {
    /// Allocates a power-of-two entry count sized from `size_mb`. Retries at
    /// half the capacity on allocation failure, down to a single entry.
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = (size_mb.max(1) * 1024 * 1024) / entry_size;

        let mut capacity = 1;
        while capacity * 2 <= num_entries {
            capacity *= 2;
        }

        loop {
            let mut entries = Vec::new();
            match entries.try_reserve_exact(capacity) {
                Ok(()) => {
                    entries.resize(capacity, EMPTY_ENTRY);
                    return Self {
                        entries,
                        generation: 0,
                    };
                }
                Err(_) if capacity > 1 => capacity /= 2,
                Err(_) => {
                    entries.resize(1, EMPTY_ENTRY);
                    return Self {
                        entries,
                        generation: 0,
                    };
                }
            }
        }
    }

    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.key = 0;
            entry.best_move = None;
            entry.score = 0;
            entry.depth = 0;
            entry.bound = 0;
            entry.generation = 0;
        }
        self.generation = 0;
    }

    /// Stores a search result. `score` is relative to the current node;
    /// mate scores are made ply-independent before being written.
    pub fn save(&mut self, key: u64, mv: Option<Move>, score: i32, depth: u8, bound: u8, ply: i32) {
        let adjusted = score_to_tt(score, ply);
        let score_i16 = adjusted.clamp(-32000, 32000) as i16;

        let index = (key as usize) & (self.entries.len() - 1);
        let entry = &mut self.entries[index];

        if entry.key == 0 || depth >= entry.depth || entry.generation != self.generation {
            let best_move = if mv.is_some() { mv } else { entry.best_move };

            entry.key = key;
            entry.best_move = best_move;
            entry.score = score_i16;
            entry.depth = depth;
            entry.bound = bound;
            entry.generation = self.generation;
        }
    }

    /// Returns the best move recorded for `key`, if any, ignoring depth and
    /// window gating — used for move ordering even when the score itself
    /// isn't usable as a cutoff.
    pub fn best_move(&self, key: u64) -> Option<Move> {
        let index = (key as usize) & (self.entries.len() - 1);
        let entry = &self.entries[index];
        if entry.key == key { entry.best_move } else { None }
    }

    /// Returns a usable score for (depth, alpha, beta) at `ply`, or
    /// `NO_HASH_ENTRY` if the entry is absent, too shallow, or its bound
    /// doesn't license a cutoff against the current window.
    pub fn probe(&self, key: u64, depth: u8, alpha: i32, beta: i32, ply: i32) -> i32 {
        let index = (key as usize) & (self.entries.len() - 1);
        let entry = &self.entries[index];

        if entry.key != key || entry.depth < depth {
            return NO_HASH_ENTRY;
        }

        let score = score_from_tt(entry.score as i32, ply);

        match entry.bound {
            0 => score,
            2 if score <= alpha => alpha,
            1 if score >= beta => beta,
            _ => NO_HASH_ENTRY,
        }
    }
}
