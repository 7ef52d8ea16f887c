use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters, safe to read from any thread (e.g. a periodic
/// daemon-level logger) while the engine's own loop keeps running.
#[derive(Default)]
pub struct GossipStats {
    pub pulls_sent: AtomicU64,
    pub pushes_sent: AtomicU64,
    pub pings_sent: AtomicU64,
    pub pongs_received: AtomicU64,
    pub packets_dropped: AtomicU64,
    pub unknown_tag_count: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GossipStatsSnapshot {
    pub pulls_sent: u64,
    pub pushes_sent: u64,
    pub pings_sent: u64,
    pub pongs_received: u64,
    pub packets_dropped: u64,
    pub unknown_tag_count: u64,
}

impl GossipStats {
    pub fn snapshot(&self) -> GossipStatsSnapshot {
        GossipStatsSnapshot {
            pulls_sent: self.pulls_sent.load(Ordering::Relaxed),
            pushes_sent: self.pushes_sent.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
            pongs_received: self.pongs_received.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            unknown_tag_count: self.unknown_tag_count.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
