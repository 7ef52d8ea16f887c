//! Shred ingestion: receive on TVU and repair ports, verify against the
//! leader schedule, assemble per-slot state, and emit signed repair
//! requests for missing indices.

mod assembler;
pub mod capability;
mod config;
mod error;
mod pipeline;
mod shred;
mod stats;

pub use assembler::InsertOutcome;
pub use config::ShredConfig;
pub use error::{Result, ShredError};
pub use pipeline::{ProcessSummary, ShredPipeline};
pub use shred::Shred;
pub use stats::{ShredStats, ShredStatsSnapshot};
