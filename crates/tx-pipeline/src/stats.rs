use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct TxStats {
    pub packets_received: AtomicU64,
    pub transactions_admitted: AtomicU64,
    pub transactions_invalid: AtomicU64,
    pub transactions_duplicate: AtomicU64,
    pub transactions_dropped_full: AtomicU64,
    pub transactions_forwarded: AtomicU64,
    pub votes_admitted: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TxStatsSnapshot {
    pub packets_received: u64,
    pub transactions_admitted: u64,
    pub transactions_invalid: u64,
    pub transactions_duplicate: u64,
    pub transactions_dropped_full: u64,
    pub transactions_forwarded: u64,
    pub votes_admitted: u64,
}

impl TxStats {
    pub fn snapshot(&self) -> TxStatsSnapshot {
        TxStatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            transactions_admitted: self.transactions_admitted.load(Ordering::Relaxed),
            transactions_invalid: self.transactions_invalid.load(Ordering::Relaxed),
            transactions_duplicate: self.transactions_duplicate.load(Ordering::Relaxed),
            transactions_dropped_full: self.transactions_dropped_full.load(Ordering::Relaxed),
            transactions_forwarded: self.transactions_forwarded.load(Ordering::Relaxed),
            votes_admitted: self.votes_admitted.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
