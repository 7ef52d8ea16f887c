use gossip_crds::PeerContact;
use wire_codec::types::Identity;

/// Everything the engine tracks about a peer beyond its last-accepted CRDS
/// value. `last_seen_ms` drives random peer selection for pull/push
/// targets; `last_pong_ms` is the liveness signal a ping/pong round-trip
/// updates.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub identity: Identity,
    pub contact: PeerContact,
    pub last_seen_ms: u64,
    pub last_pong_ms: Option<u64>,
}
