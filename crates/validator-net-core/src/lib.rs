//! Ties GossipEngine, ShredPipeline, TxPipeline, and QuicTransport together
//! into one running validator network stack: builds the capability-handle
//! adapters each component needs, spawns one long-lived thread per receive
//! loop, and exposes a single `stop()` that joins them all.

mod capability;
mod config;
mod daemon;
mod error;
mod leader;

pub use config::ValidatorNetConfig;
pub use daemon::ValidatorNet;
pub use error::{Result, ValidatorNetError};
pub use leader::StaticLeaderSchedule;
