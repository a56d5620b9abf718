pub mod board;
pub mod movegen;
pub mod state;

// Re-export important types
pub use board::*;
pub use movegen::pseudo_legal_moves;
pub use state::*;
