//! Core handler infrastructure.
//!
//! The handler trait, per-command context, and the context-scoped registry.

pub mod context;
pub mod registry;

pub use context::{Context, Handler};
pub use registry::Registry;
