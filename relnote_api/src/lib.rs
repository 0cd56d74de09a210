//! Shared release-notes data models consumed by the core library and probes.

pub mod chain;
pub mod facts;
pub mod record;

pub use chain::*;
pub use facts::*;
pub use record::*;
