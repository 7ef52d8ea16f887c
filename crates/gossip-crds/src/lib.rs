//! Keyed store of the latest gossip value per originator, with monotonic
//! wallclock replacement and an insertion-order ordinal for change feeds.
//!
//! A single mutex serializes every operation (matching the teacher's
//! single-lock discipline for shared aggregates): no caller ever observes an
//! intermediate state mid-insert or mid-prune.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use wire_codec::contact_info::SocketTag;
use wire_codec::crds_value::{CrdsData, CrdsValue};
use wire_codec::types::Identity;

/// A contact's resolved service addresses, projected uniformly out of
/// whichever contact-info variant (legacy or modern) was last accepted for
/// that identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerContact {
    pub identity: Identity,
    pub wallclock: u64,
    pub shred_version: u16,
    pub sockets: Vec<(SocketTag, SocketAddr)>,
}

impl PeerContact {
    pub fn socket_for(&self, tag: SocketTag) -> Option<SocketAddr> {
        self.sockets
            .iter()
            .find(|(t, addr)| *t == tag && addr.port() != 0)
            .map(|(_, addr)| *addr)
    }

    fn from_crds_data(data: &CrdsData) -> Option<Self> {
        match data {
            CrdsData::ContactInfo(ci) => Some(PeerContact {
                identity: ci.identity,
                wallclock: ci.wallclock_ms,
                shred_version: ci.shred_version,
                sockets: ci.sockets.clone(),
            }),
            CrdsData::LegacyContactInfo(ci) => Some(PeerContact {
                identity: ci.identity,
                wallclock: ci.wallclock,
                shred_version: ci.shred_version,
                sockets: vec![
                    (SocketTag::Gossip, ci.gossip),
                    (SocketTag::Tvu, ci.tvu),
                    (SocketTag::Repair, ci.repair),
                    (SocketTag::Tpu, ci.tpu),
                    (SocketTag::TpuForwards, ci.tpu_forwards),
                    (SocketTag::TpuVote, ci.tpu_vote),
                    (SocketTag::Rpc, ci.rpc),
                    (SocketTag::RpcPubsub, ci.rpc_pubsub),
                    (SocketTag::ServeRepair, ci.serve_repair),
                ],
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CrdsEntry {
    value: CrdsValue,
    ordinal: u64,
    local_arrival_ms: u64,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Default)]
pub struct CrdsTable {
    inner: Mutex<HashMap<Identity, CrdsEntry>>,
    next_ordinal: AtomicU64,
}

impl CrdsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `value` if its wallclock is strictly greater than the
    /// currently stored wallclock for the same identity (or if there is no
    /// stored entry yet). Returns whether it was stored.
    pub fn insert(&self, value: CrdsValue) -> bool {
        let identity = value.data.identity();
        let wallclock = value.data.wallclock();
        let mut table = self.inner.lock().unwrap();
        if let Some(existing) = table.get(&identity) {
            if wallclock <= existing.value.data.wallclock() {
                return false;
            }
        }
        let ordinal = self.next_ordinal.fetch_add(1, Ordering::Relaxed);
        table.insert(
            identity,
            CrdsEntry {
                value,
                ordinal,
                local_arrival_ms: now_ms(),
            },
        );
        true
    }

    pub fn get(&self, identity: &Identity) -> Option<CrdsValue> {
        self.inner.lock().unwrap().get(identity).map(|e| e.value.clone())
    }

    pub fn get_ordinal(&self, identity: &Identity) -> Option<u64> {
        self.inner.lock().unwrap().get(identity).map(|e| e.ordinal)
    }

    pub fn list_contacts(&self) -> Vec<PeerContact> {
        self.inner
            .lock()
            .unwrap()
            .values()
            .filter_map(|e| PeerContact::from_crds_data(&e.value.data))
            .collect()
    }

    pub fn list_contacts_with_tag(&self, tag: SocketTag) -> Vec<PeerContact> {
        self.list_contacts()
            .into_iter()
            .filter(|c| c.socket_for(tag).is_some())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Removes entries whose local arrival time is older than `timeout_ms`.
    /// Stale keys are collected into a local buffer first so iteration and
    /// mutation never interleave.
    pub fn prune_stale(&self, timeout_ms: u64) -> usize {
        let now = now_ms();
        let mut table = self.inner.lock().unwrap();
        let stale: Vec<Identity> = table
            .iter()
            .filter(|(_, e)| now.saturating_sub(e.local_arrival_ms) > timeout_ms)
            .map(|(k, _)| *k)
            .collect();
        for key in &stale {
            table.remove(key);
        }
        if !stale.is_empty() {
            debug!("crds: pruned {} stale entries", stale.len());
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use wire_codec::contact_info::{LegacyContactInfo, VersionRecord};
    use wire_codec::crds_value::CrdsData;

    fn legacy_value(identity: Identity, wallclock: u64) -> CrdsValue {
        let zero = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 0);
        CrdsValue {
            signature: [0u8; 64],
            data: CrdsData::LegacyContactInfo(LegacyContactInfo {
                identity,
                gossip: zero,
                tvu: zero,
                tvu_forwards: zero,
                repair: zero,
                tpu: zero,
                tpu_forwards: zero,
                tpu_vote: zero,
                rpc: zero,
                rpc_pubsub: zero,
                serve_repair: zero,
                wallclock,
                shred_version: 0,
            }),
        }
    }

    #[test]
    fn insert_into_empty_table_then_get_returns_same_wallclock() {
        let table = CrdsTable::new();
        let id = [1u8; 32];
        assert!(table.insert(legacy_value(id, 500)));
        let got = table.get(&id).unwrap();
        assert_eq!(got.data.wallclock(), 500);
    }

    #[test]
    fn higher_wallclock_wins_regardless_of_insertion_order() {
        for (first, second) in [(500u64, 1000u64), (1000u64, 500u64)] {
            let table = CrdsTable::new();
            let id = [2u8; 32];
            table.insert(legacy_value(id, first));
            table.insert(legacy_value(id, second));
            let got = table.get(&id).unwrap();
            assert_eq!(got.data.wallclock(), 1000);
            assert_eq!(table.count(), 1);
        }
    }

    #[test]
    fn equal_wallclock_is_rejected() {
        let table = CrdsTable::new();
        let id = [3u8; 32];
        assert!(table.insert(legacy_value(id, 100)));
        assert!(!table.insert(legacy_value(id, 100)));
    }

    #[test]
    fn unrelated_identity_version_record_defaults_are_unused_here() {
        let _ = VersionRecord::default();
    }
}
