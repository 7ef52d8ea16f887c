use std::collections::HashMap;
use std::sync::Mutex;

use shred_pipeline::capability::LeaderLookup;
use wire_codec::types::Identity;

/// Slot-to-leader mapping kept in this core only because the real schedule
/// lives in the bank, an external collaborator this core never links
/// against. Whatever owns the bank is expected to call `set_leader` as the
/// schedule becomes known; an unset slot simply fails shred/tx
/// verification rather than panicking.
#[derive(Default)]
pub struct StaticLeaderSchedule {
    by_slot: Mutex<HashMap<u64, Identity>>,
}

impl StaticLeaderSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_leader(&self, slot: u64, identity: Identity) {
        self.by_slot.lock().unwrap().insert(slot, identity);
    }

    /// Drops entries for slots older than `below_slot`, bounding memory use
    /// as the cluster advances.
    pub fn evict_below(&self, below_slot: u64) {
        self.by_slot.lock().unwrap().retain(|&slot, _| slot >= below_slot);
    }
}

impl LeaderLookup for StaticLeaderSchedule {
    fn leader_for_slot(&self, slot: u64) -> Option<Identity> {
        self.by_slot.lock().unwrap().get(&slot).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_returns_none() {
        let schedule = StaticLeaderSchedule::new();
        assert_eq!(schedule.leader_for_slot(5), None);
    }

    #[test]
    fn set_then_evict_removes_old_slots() {
        let schedule = StaticLeaderSchedule::new();
        schedule.set_leader(1, [1u8; 32]);
        schedule.set_leader(100, [2u8; 32]);
        schedule.evict_below(50);
        assert_eq!(schedule.leader_for_slot(1), None);
        assert_eq!(schedule.leader_for_slot(100), Some([2u8; 32]));
    }
}
