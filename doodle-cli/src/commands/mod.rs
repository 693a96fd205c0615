//! CLI command implementations.

pub mod play;
pub mod replay;
pub mod score;
