//! Snapshot sinks

pub mod sinks;

pub use sinks::{DirectorySink, MemorySink, NullSink};
