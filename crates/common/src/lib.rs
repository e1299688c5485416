//! Flipstage Common Utilities
//!
//! Shared infrastructure for all Flipstage crates:
//! - Error types, result aliases, and the non-fatal degradation taxonomy
//! - Clock utilities for frame timing
//! - Tick scheduling with cancellation tokens
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use scheduler::*;
