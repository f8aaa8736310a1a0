pub mod common;
pub mod discovery;

// Re-export handler functions
pub use common::*;
pub use discovery::*;
