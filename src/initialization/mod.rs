//! Application initialization.
//!
//! This module provides the setup the binary performs before building a
//! producer. The library itself only logs through the `log` facade.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
