use std::collections::BinaryHeap;
use std::cmp::Ordering;

use wire_codec::types::{Identity, Signature};

use crate::transaction::Transaction;

/// A transaction admitted into the pipeline, ordered for banking-stage
/// consumption by descending priority and, within a priority, by arrival
/// order (earlier arrivals drain first).
#[derive(Debug, Clone)]
pub struct QueuedTx {
    pub transaction: Transaction,
    pub priority: u64,
    pub is_vote: bool,
    ordinal: u64,
}

impl QueuedTx {
    pub fn signature(&self) -> Signature {
        self.transaction.first_signature().unwrap_or([0u8; 64])
    }

    pub fn fee_payer(&self) -> Option<Identity> {
        self.transaction.fee_payer()
    }
}

impl PartialEq for QueuedTx {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.ordinal == other.ordinal
    }
}
impl Eq for QueuedTx {}

impl PartialOrd for QueuedTx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.ordinal.cmp(&self.ordinal))
    }
}

/// Bounded max-priority queue. Once full, a newly admitted transaction only
/// displaces the current lowest-priority entry if it is strictly higher
/// priority; ties favor whatever already holds the slot.
pub struct PriorityQueue {
    capacity: usize,
    heap: BinaryHeap<QueuedTx>,
    next_ordinal: u64,
}

impl PriorityQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
            next_ordinal: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` if the transaction was admitted (either there was
    /// room, or it evicted a strictly lower-priority occupant).
    pub fn push(&mut self, transaction: Transaction, is_vote: bool) -> bool {
        let priority = transaction.priority();
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let candidate = QueuedTx {
            transaction,
            priority,
            is_vote,
            ordinal,
        };

        if self.heap.len() < self.capacity {
            self.heap.push(candidate);
            return true;
        }

        let min_priority = match self.heap.iter().map(|q| q.priority).min() {
            Some(p) => p,
            None => {
                self.heap.push(candidate);
                return true;
            }
        };
        if priority <= min_priority {
            return false;
        }
        let mut items: Vec<QueuedTx> = std::mem::take(&mut self.heap).into_vec();
        if let Some(pos) = items.iter().position(|q| q.priority == min_priority) {
            items.swap_remove(pos);
        }
        items.push(candidate);
        self.heap = BinaryHeap::from(items);
        true
    }

    /// Drains up to `n` highest-priority entries in priority order.
    pub fn drain(&mut self, n: usize) -> Vec<QueuedTx> {
        let mut out = Vec::with_capacity(n.min(self.heap.len()));
        for _ in 0..n {
            match self.heap.pop() {
                Some(tx) => out.push(tx),
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Instruction;

    fn tx_with_priority(priority: u64) -> Transaction {
        let data = {
            let mut d = vec![3u8];
            d.extend_from_slice(&priority.to_le_bytes());
            d
        };
        Transaction {
            signatures: vec![[0u8; 64]],
            num_required_signatures: 1,
            account_keys: vec![[1u8; 32], crate::transaction::COMPUTE_BUDGET_PROGRAM_ID],
            recent_blockhash: [0u8; 32],
            instructions: vec![Instruction {
                program_id_index: 1,
                accounts: vec![],
                data,
            }],
            message_bytes: vec![],
        }
    }

    #[test]
    fn drains_in_descending_priority_order() {
        let mut q = PriorityQueue::new(10);
        q.push(tx_with_priority(5), false);
        q.push(tx_with_priority(50), false);
        q.push(tx_with_priority(1), false);
        let drained = q.drain(3);
        let priorities: Vec<u64> = drained.iter().map(|q| q.priority).collect();
        assert_eq!(priorities, vec![50, 5, 1]);
    }

    #[test]
    fn full_queue_only_evicts_for_strictly_higher_priority() {
        let mut q = PriorityQueue::new(2);
        assert!(q.push(tx_with_priority(10), false));
        assert!(q.push(tx_with_priority(10), false));
        assert!(!q.push(tx_with_priority(10), false));
        assert!(q.push(tx_with_priority(11), false));
        assert_eq!(q.len(), 2);
        let drained = q.drain(2);
        assert_eq!(drained[0].priority, 11);
    }
}
