pub mod room;
pub mod session;
pub mod store;

// Re-export important types
pub use room::*;
pub use session::*;
pub use store::*;
