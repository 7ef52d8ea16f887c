use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ShredStats {
    pub shreds_received: AtomicU64,
    pub shreds_inserted: AtomicU64,
    pub shreds_duplicate: AtomicU64,
    pub shreds_invalid: AtomicU64,
    pub slots_completed: AtomicU64,
    pub repairs_sent: AtomicU64,
    pub repairs_received: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShredStatsSnapshot {
    pub shreds_received: u64,
    pub shreds_inserted: u64,
    pub shreds_duplicate: u64,
    pub shreds_invalid: u64,
    pub slots_completed: u64,
    pub repairs_sent: u64,
    pub repairs_received: u64,
}

impl ShredStats {
    pub fn snapshot(&self) -> ShredStatsSnapshot {
        ShredStatsSnapshot {
            shreds_received: self.shreds_received.load(Ordering::Relaxed),
            shreds_inserted: self.shreds_inserted.load(Ordering::Relaxed),
            shreds_duplicate: self.shreds_duplicate.load(Ordering::Relaxed),
            shreds_invalid: self.shreds_invalid.load(Ordering::Relaxed),
            slots_completed: self.slots_completed.load(Ordering::Relaxed),
            repairs_sent: self.repairs_sent.load(Ordering::Relaxed),
            repairs_received: self.repairs_received.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
