use std::net::SocketAddr;

use wire_codec::types::{Identity, Signature};

/// Abstract handles passed in at construction time so this component never
/// reaches back into whatever owns it (gossip, the ledger, the signing
/// identity) — it only ever calls forward through these traits.
pub trait LeaderLookup: Send + Sync {
    fn leader_for_slot(&self, slot: u64) -> Option<Identity>;
}

pub trait LedgerSink: Send + Sync {
    fn store_shred(&self, slot: u64, index: u32, bytes: &[u8]);
}

pub trait PeerDirectory: Send + Sync {
    /// Up to `n` peers known (via gossip) to advertise a non-zero
    /// `serve_repair` address.
    fn repair_candidates(&self, n: usize) -> Vec<(Identity, SocketAddr)>;
}

pub trait Signer: Send + Sync {
    fn identity(&self) -> Identity;
    fn sign(&self, bytes: &[u8]) -> Signature;
}

/// No-op `LedgerSink` for tests and standalone runs without a real ledger.
pub struct NullLedger;

impl LedgerSink for NullLedger {
    fn store_shred(&self, _slot: u64, _index: u32, _bytes: &[u8]) {}
}

/// Empty `PeerDirectory`; callers fall back to `ShredConfig::static_repair_peers`.
pub struct EmptyPeerDirectory;

impl PeerDirectory for EmptyPeerDirectory {
    fn repair_candidates(&self, _n: usize) -> Vec<(Identity, SocketAddr)> {
        Vec::new()
    }
}
