use std::net::SocketAddr;
use std::sync::Arc;

use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use log::debug;

use gossip_engine::GossipEngine;
use shred_pipeline::capability::{LedgerSink, PeerDirectory, Signer};
use wire_codec::contact_info::SocketTag;
use wire_codec::types::{Identity, Signature};

/// Adapts the gossip engine's peer table to the shred pipeline's narrower
/// `PeerDirectory` view: only identities advertising a `ServeRepair`
/// socket are repair candidates.
pub struct GossipPeerDirectory {
    gossip: Arc<GossipEngine>,
}

impl GossipPeerDirectory {
    pub fn new(gossip: Arc<GossipEngine>) -> Self {
        Self { gossip }
    }
}

impl PeerDirectory for GossipPeerDirectory {
    fn repair_candidates(&self, n: usize) -> Vec<(Identity, SocketAddr)> {
        self.gossip
            .peers_snapshot()
            .into_iter()
            .filter_map(|peer| {
                peer.contact
                    .socket_for(SocketTag::ServeRepair)
                    .map(|addr| (peer.identity, addr))
            })
            .take(n)
            .collect()
    }
}

/// Signs on behalf of the validator's own identity keypair. Shared by
/// every component that needs to produce a signed message (repair
/// requests, PATH_RESPONSE challenges, etc.) without each holding its own
/// copy of the key material.
pub struct IdentitySigner {
    signing_key: SigningKey,
    identity: Identity,
}

impl IdentitySigner {
    pub fn new(signing_key: SigningKey) -> Self {
        let identity = signing_key.verifying_key().to_bytes();
        Self {
            signing_key,
            identity,
        }
    }
}

impl Signer for IdentitySigner {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn sign(&self, bytes: &[u8]) -> Signature {
        self.signing_key.sign(bytes).to_bytes()
    }
}

/// Stand-in for the real ledger store (an external collaborator this core
/// never links against): logs every insertion at debug level instead of
/// persisting it. A real deployment replaces this with an adapter to its
/// own ledger crate.
pub struct LoggingLedgerSink;

impl LedgerSink for LoggingLedgerSink {
    fn store_shred(&self, slot: u64, index: u32, bytes: &[u8]) {
        debug!("ledger: would store {} bytes for slot {slot} index {index}", bytes.len());
    }
}
