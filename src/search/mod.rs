pub mod context;
pub mod eval;
pub mod ordering;
pub mod pesto;
pub mod search;
pub mod tt;
