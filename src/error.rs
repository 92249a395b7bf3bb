use thiserror::Error;

/// Fallible outcomes that can occur during engine setup. The search and
/// move-generation hot paths never raise; they report rejection via return
/// values (illegal move, no usable TT entry) rather than `Result`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to allocate {requested_mb} MB transposition table")]
    TranspositionAlloc { requested_mb: usize },

    #[error("magic search exhausted for {piece} on square {square}")]
    MagicSearchExhausted { square: u8, piece: &'static str },

    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}
