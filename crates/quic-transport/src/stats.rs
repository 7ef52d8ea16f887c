use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct QuicStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub packets_lost: AtomicU64,
    pub auth_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuicStatsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub packets_lost: u64,
    pub auth_failures: u64,
}

impl QuicStats {
    pub fn snapshot(&self) -> QuicStatsSnapshot {
        QuicStatsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            packets_lost: self.packets_lost.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dec(counter: &AtomicU64) {
        counter.fetch_sub(1, Ordering::Relaxed);
    }
}
