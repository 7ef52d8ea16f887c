//! Gossip protocol driver: entrypoint bootstrap, ping/pong liveness,
//! pull/push anti-entropy cadence, and CRDS value ingestion into a shared
//! [`gossip_crds::CrdsTable`].

mod config;
mod engine;
mod entrypoint;
mod error;
mod peer;
mod signing;
mod stats;

pub use config::GossipConfig;
pub use engine::GossipEngine;
pub use error::{GossipError, Result};
pub use peer::PeerInfo;
pub use stats::{GossipStats, GossipStatsSnapshot};
