//! Common types and utilities shared by the trellis crates.
//!
//! - String interning (`Atom`, `ShardedInterner`) for class and member names
//! - Tracing subscriber setup driven by environment variables

// String interning for name deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Subscriber configuration (TRELLIS_LOG / TRELLIS_LOG_FORMAT)
pub mod tracing_config;
