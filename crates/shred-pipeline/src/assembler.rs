use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::shred::Shred;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
    CompletedSlot,
}

struct SlotState {
    received: HashSet<u32>,
    shreds: BTreeMap<u32, Shred>,
    terminal_index: Option<u32>,
    completed: bool,
}

impl SlotState {
    fn new() -> Self {
        Self {
            received: HashSet::new(),
            shreds: BTreeMap::new(),
            terminal_index: None,
            completed: false,
        }
    }

    fn is_complete(&self) -> bool {
        match self.terminal_index {
            Some(terminal) => (0..=terminal).all(|i| self.received.contains(&i)),
            None => false,
        }
    }
}

/// Per-slot assembly state, with a bounded window of in-progress slots so a
/// slot that never completes (crashed leader, lost shreds) doesn't grow
/// memory without bound. Eviction never touches a slot at or above
/// `max_slot - window`; completion is decided purely from shreds actually
/// received, so evicting an old slot cannot retroactively complete it.
pub struct ShredAssembler {
    slots: Mutex<BTreeMap<u64, SlotState>>,
    max_slot: AtomicU64,
    window: u64,
}

impl ShredAssembler {
    pub fn new(window: u64) -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
            max_slot: AtomicU64::new(0),
            window,
        }
    }

    pub fn max_slot(&self) -> u64 {
        self.max_slot.load(Ordering::Relaxed)
    }

    fn advance_max_slot(&self, slot: u64) {
        let mut current = self.max_slot.load(Ordering::Relaxed);
        while slot > current {
            match self
                .max_slot
                .compare_exchange_weak(current, slot, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn insert(&self, shred: Shred) -> InsertOutcome {
        self.advance_max_slot(shred.slot);
        let mut slots = self.slots.lock().unwrap();
        self.evict_stale(&mut slots);

        let state = slots.entry(shred.slot).or_insert_with(SlotState::new);
        if state.completed || state.received.contains(&shred.index) {
            return InsertOutcome::Duplicate;
        }
        state.received.insert(shred.index);
        if shred.is_last_in_slot() {
            state.terminal_index = Some(shred.index);
        }
        state.shreds.insert(shred.index, shred);

        if !state.completed && state.is_complete() {
            state.completed = true;
            InsertOutcome::CompletedSlot
        } else {
            InsertOutcome::Inserted
        }
    }

    pub fn shreds_for_slot(&self, slot: u64) -> Vec<Shred> {
        self.slots
            .lock()
            .unwrap()
            .get(&slot)
            .map(|s| s.shreds.values().cloned().collect())
            .unwrap_or_default()
    }

    fn evict_stale(&self, slots: &mut BTreeMap<u64, SlotState>) {
        let max_slot = self.max_slot();
        let floor = max_slot.saturating_sub(self.window);
        slots.retain(|&slot, _| slot >= floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shred(slot: u64, index: u32, last: bool) -> Shred {
        Shred::new(slot, index, true, last, vec![0xAB])
    }

    #[test]
    fn completion_fires_once_terminal_and_every_lower_index_present() {
        let assembler = ShredAssembler::new(1000);
        assert_eq!(assembler.insert(shred(1, 0, false)), InsertOutcome::Inserted);
        assert_eq!(assembler.insert(shred(1, 2, true)), InsertOutcome::Inserted);
        assert_eq!(assembler.insert(shred(1, 1, false)), InsertOutcome::CompletedSlot);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let assembler = ShredAssembler::new(1000);
        assembler.insert(shred(5, 0, false));
        assert_eq!(assembler.insert(shred(5, 0, false)), InsertOutcome::Duplicate);
    }

    #[test]
    fn far_older_slot_is_evicted_and_restarts_fresh() {
        let assembler = ShredAssembler::new(2);
        assembler.insert(shred(1, 0, false));
        assembler.insert(shred(10, 0, false));
        // slot 1 is now more than `window` behind slot 10 and is evicted.
        assert!(assembler.shreds_for_slot(1).is_empty());
    }
}
