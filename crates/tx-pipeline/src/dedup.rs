use std::collections::HashSet;

use wire_codec::types::Signature;

/// Bounded dedup set keyed on first signature. Once full, a newly observed
/// signature is dropped rather than tracked — the existing entries are left
/// untouched.
pub struct DedupSet {
    capacity: usize,
    seen: HashSet<Signature>,
}

impl DedupSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` if `signature` was newly inserted, `false` if already
    /// present or the set is at capacity.
    pub fn insert(&mut self, signature: Signature) -> bool {
        if self.seen.contains(&signature) {
            return false;
        }
        if self.seen.len() >= self.capacity {
            return false;
        }
        self.seen.insert(signature);
        true
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.seen.contains(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_signature() {
        let mut d = DedupSet::new(4);
        let sig = [7u8; 64];
        assert!(d.insert(sig));
        assert!(!d.insert(sig));
    }

    #[test]
    fn overflow_drops_newest_and_keeps_existing_entries() {
        let mut d = DedupSet::new(2);
        assert!(d.insert([1u8; 64]));
        assert!(d.insert([2u8; 64]));
        assert!(!d.insert([3u8; 64]));
        assert!(d.contains(&[1u8; 64]));
        assert!(d.contains(&[2u8; 64]));
        assert!(!d.contains(&[3u8; 64]));
    }
}
