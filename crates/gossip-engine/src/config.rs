/// Explicit, construction-time configuration for a [`crate::GossipEngine`].
/// Never reads env/argv itself — the daemon binary parses `clap::Parser`
/// args and builds this struct.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    pub bind_port: u16,
    pub pull_interval_ms: u64,
    pub push_interval_ms: u64,
    pub ping_interval_ms: u64,
    pub prune_interval_ms: u64,
    pub max_push_fanout: usize,
    pub batch_size: usize,
    /// Peers the local CRDS table has no entry for are pruned after this
    /// many idle milliseconds.
    pub peer_timeout_ms: u64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            bind_port: 8001,
            pull_interval_ms: 15_000,
            push_interval_ms: 500,
            ping_interval_ms: 2_000,
            prune_interval_ms: 10_000,
            max_push_fanout: 6,
            batch_size: 128,
            peer_timeout_ms: 60_000,
        }
    }
}
