use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use ed25519_dalek::SigningKey;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::RngCore;

use gossip_crds::CrdsTable;
use packet_fabric::{FabricConfig, PacketBuffer, PacketFabric};
use wire_codec::contact_info::{ContactInfo, SocketTag, VersionRecord};
use wire_codec::crds_value::{CrdsData, CrdsValue};
use wire_codec::protocol::{CrdsValueList, GossipMessage, Ping, Pong, PullRequest};
use wire_codec::sign::{pong_hash, signable_bytes_for_crds_value, signable_bytes_for_ping};
use wire_codec::{CodecError, Writer};
use wire_codec::types::Identity;

use crate::config::GossipConfig;
use crate::entrypoint::Entrypoint;
use crate::error::{GossipError, Result};
use crate::peer::PeerInfo;
use crate::signing::Keypair;
use crate::stats::{GossipStats, GossipStatsSnapshot};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The light gossip member driving this core's anti-entropy surface: it
/// speaks pull/push/ping/prune to a configured set of entrypoints and any
/// peer it learns about, without ever building pull-responses itself.
pub struct GossipEngine {
    config: GossipConfig,
    stats: GossipStats,
    crds: CrdsTable,
    peers: Mutex<HashMap<Identity, PeerInfo>>,
    entrypoints: Mutex<Vec<Entrypoint>>,
    keypair: Mutex<Keypair>,
    self_identity: Mutex<Option<Identity>>,
    self_contact: Mutex<Option<ContactInfo>>,
    fabric: Mutex<PacketFabric>,
    running: AtomicBool,
    last_pull_ms: AtomicU64,
    last_push_ms: AtomicU64,
    last_ping_ms: AtomicU64,
    last_prune_ms: AtomicU64,
}

impl GossipEngine {
    pub fn new(config: GossipConfig) -> Result<Self> {
        let bind_addr: SocketAddr = ([0, 0, 0, 0], config.bind_port).into();
        let mut fabric_config = FabricConfig::new(bind_addr);
        fabric_config.batch_size = config.batch_size;
        let fabric = PacketFabric::open(fabric_config)?;
        Ok(Self {
            config,
            stats: GossipStats::default(),
            crds: CrdsTable::new(),
            peers: Mutex::new(HashMap::new()),
            entrypoints: Mutex::new(Vec::new()),
            keypair: Mutex::new(Keypair::default()),
            self_identity: Mutex::new(None),
            self_contact: Mutex::new(None),
            fabric: Mutex::new(fabric),
            running: AtomicBool::new(false),
            last_pull_ms: AtomicU64::new(0),
            last_push_ms: AtomicU64::new(0),
            last_ping_ms: AtomicU64::new(0),
            last_prune_ms: AtomicU64::new(0),
        })
    }

    pub fn add_entrypoint(&self, host: impl Into<String>, port: u16) {
        let entry = Entrypoint::new(host.into(), port, now_ms());
        self.entrypoints.lock().unwrap().push(entry);
    }

    pub fn set_self(&self, identity: Identity, ip: IpAddr, ports: &[(SocketTag, u16)], shred_version: u16) {
        *self.self_identity.lock().unwrap() = Some(identity);
        let sockets = ports
            .iter()
            .map(|(tag, port)| (*tag, SocketAddr::new(ip, *port)))
            .collect();
        *self.self_contact.lock().unwrap() = Some(ContactInfo {
            identity,
            wallclock_ms: now_ms(),
            instance_creation_us: now_ms() * 1000,
            shred_version,
            version: VersionRecord::default(),
            sockets,
        });
    }

    pub fn set_keypair(&self, signer: SigningKey) {
        self.keypair.lock().unwrap().set(signer);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    /// Snapshot of every peer currently tracked, for components that need
    /// to pick repair or forwarding targets without reaching into the
    /// engine's internal locking.
    pub fn peers_snapshot(&self) -> Vec<PeerInfo> {
        self.peers.lock().unwrap().values().cloned().collect()
    }

    pub fn get_stats(&self) -> GossipStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Runs the gossip cadence loop until `stop()` is called from another
    /// thread. Each cadence tracks its own last-fire timestamp so a slow
    /// pull cycle never delays push/ping/prune.
    pub fn run(&self) {
        self.running.store(true, Ordering::Relaxed);
        while self.running.load(Ordering::Relaxed) {
            self.process_inbound();

            let now = now_ms();
            let pull_interval = if self.peer_count() == 0 {
                1_000
            } else {
                self.config.pull_interval_ms
            };
            if now.saturating_sub(self.last_pull_ms.load(Ordering::Relaxed)) >= pull_interval {
                self.fire_pull();
                self.last_pull_ms.store(now, Ordering::Relaxed);
            }
            if now.saturating_sub(self.last_push_ms.load(Ordering::Relaxed)) >= self.config.push_interval_ms {
                self.fire_push();
                self.last_push_ms.store(now, Ordering::Relaxed);
            }
            if now.saturating_sub(self.last_ping_ms.load(Ordering::Relaxed)) >= self.config.ping_interval_ms {
                self.fire_ping();
                self.last_ping_ms.store(now, Ordering::Relaxed);
            }
            if now.saturating_sub(self.last_prune_ms.load(Ordering::Relaxed)) >= self.config.prune_interval_ms {
                self.prune_stale();
                self.last_prune_ms.store(now, Ordering::Relaxed);
            }

            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }

    fn process_inbound(&self) {
        let mut batch = Vec::new();
        let recvd = {
            let mut fabric = self.fabric.lock().unwrap();
            fabric.recv_batch(&mut batch)
        };
        match recvd {
            Ok(_) => {
                for packet in &batch {
                    self.dispatch_packet(packet.payload(), packet.src_addr);
                }
            }
            Err(e) => warn!("gossip: fabric recv_batch failed: {e}"),
        }
    }

    fn dispatch_packet(&self, bytes: &[u8], src: SocketAddr) {
        let message = match GossipMessage::read(bytes) {
            Ok(m) => m,
            Err(CodecError::InvalidEnumTag) => {
                GossipStats::inc(&self.stats.unknown_tag_count);
                return;
            }
            Err(_) => {
                GossipStats::inc(&self.stats.packets_dropped);
                debug!("gossip: dropped malformed packet from {src}");
                return;
            }
        };

        match message {
            GossipMessage::Ping(ping) => self.handle_ping(&ping, src),
            GossipMessage::Pong(pong) => self.handle_pong(&pong),
            GossipMessage::PullRequest(_) => {
                // Light member: parsing is permitted, but this core never
                // builds a pull-response.
            }
            GossipMessage::PullResponse(list) | GossipMessage::Push(list) => {
                self.ingest_values(list)
            }
            GossipMessage::Prune(_) => {}
        }
    }

    fn handle_ping(&self, ping: &Ping, src: SocketAddr) {
        let hash = pong_hash(&ping.token);
        let identity = self.self_identity.lock().unwrap().unwrap_or([0u8; 32]);
        let signature = self.keypair.lock().unwrap().sign(&hash);
        let pong = Pong {
            identity,
            hash,
            signature,
        };
        let mut buf = vec![0u8; Pong::WIRE_LEN];
        let mut w = Writer::new(&mut buf);
        if pong.write(&mut w).is_ok() {
            let len = w.position();
            self.send_bytes(&buf[..len], src);
        }
    }

    fn handle_pong(&self, pong: &Pong) {
        GossipStats::inc(&self.stats.pongs_received);
        let mut peers = self.peers.lock().unwrap();
        if let Some(peer) = peers.get_mut(&pong.identity) {
            peer.last_pong_ms = Some(now_ms());
        }
    }

    fn ingest_values(&self, list: CrdsValueList) {
        for value in list.values {
            let identity = value.data.identity();
            let accepted = self.crds.insert(value.clone());
            if accepted {
                if let CrdsData::ContactInfo(_) | CrdsData::LegacyContactInfo(_) = &value.data {
                    if let Some(contact) = self.crds.get(&identity).and_then(|v| peer_contact_of(&v)) {
                        let mut peers = self.peers.lock().unwrap();
                        let entry = peers.entry(identity).or_insert_with(|| PeerInfo {
                            identity,
                            contact: contact.clone(),
                            last_seen_ms: now_ms(),
                            last_pong_ms: None,
                        });
                        entry.contact = contact;
                        entry.last_seen_ms = now_ms();
                    }
                }
            }
        }
    }

    fn fire_pull(&self) {
        let Some(value) = self.self_crds_value() else {
            return;
        };
        let request = PullRequest {
            filter: wire_codec::bloom::CrdsFilter::accept_all(),
            value,
        };
        let mut buf = vec![0u8; 4096];
        let mut w = Writer::new(&mut buf);
        if request.write(&mut w).is_err() {
            return;
        }
        let len = w.position();
        let targets = self.pull_targets();
        for dst in targets {
            self.send_bytes(&buf[..len], dst);
            GossipStats::inc(&self.stats.pulls_sent);
        }
    }

    fn fire_push(&self) {
        let Some(value) = self.self_crds_value() else {
            return;
        };
        let identity = self.self_identity.lock().unwrap().unwrap_or([0u8; 32]);
        let list = CrdsValueList {
            sender: identity,
            values: vec![value],
        };
        let mut buf = vec![0u8; 4096];
        let mut w = Writer::new(&mut buf);
        if list.write_push(&mut w).is_err() {
            return;
        }
        let len = w.position();
        let targets = self.push_targets();
        for dst in targets {
            self.send_bytes(&buf[..len], dst);
            GossipStats::inc(&self.stats.pushes_sent);
        }
    }

    fn fire_ping(&self) {
        let identity = self.self_identity.lock().unwrap().unwrap_or([0u8; 32]);
        let entrypoints = self.resolved_entrypoints();
        for dst in entrypoints {
            let mut token = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut token);
            let signature = self.keypair.lock().unwrap().sign(&signable_bytes_for_ping(&token));
            let ping = Ping {
                identity,
                token,
                signature,
            };
            let mut buf = vec![0u8; Ping::WIRE_LEN];
            let mut w = Writer::new(&mut buf);
            if ping.write(&mut w).is_ok() {
                let len = w.position();
                self.send_bytes(&buf[..len], dst);
                GossipStats::inc(&self.stats.pings_sent);
            }
        }
    }

    fn prune_stale(&self) {
        self.crds.prune_stale(self.config.peer_timeout_ms);
        let now = now_ms();
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|_, p| now.saturating_sub(p.last_seen_ms) <= self.config.peer_timeout_ms);
    }

    fn self_crds_value(&self) -> Option<CrdsValue> {
        let mut contact_guard = self.self_contact.lock().unwrap();
        let contact = contact_guard.as_mut()?;
        contact.wallclock_ms = now_ms();
        let data = CrdsData::ContactInfo(contact.clone());
        let mut payload = vec![0u8; contact.wire_len() + 16];
        let mut w = Writer::new(&mut payload);
        data.write_payload(&mut w).ok()?;
        let payload_len = w.position();
        let signable = signable_bytes_for_crds_value(data.variant_tag(), &payload[..payload_len]);
        let signature = self.keypair.lock().unwrap().sign(&signable);
        Some(CrdsValue { signature, data })
    }

    fn pull_targets(&self) -> Vec<SocketAddr> {
        let mut targets = self.random_peer_addrs(3);
        targets.extend(self.resolved_entrypoints());
        targets
    }

    fn push_targets(&self) -> Vec<SocketAddr> {
        let random = self.random_peer_addrs(self.config.max_push_fanout);
        if random.is_empty() {
            self.resolved_entrypoints()
        } else {
            random
        }
    }

    fn random_peer_addrs(&self, n: usize) -> Vec<SocketAddr> {
        let peers = self.peers.lock().unwrap();
        let mut addrs: Vec<SocketAddr> = peers
            .values()
            .filter_map(|p| p.contact.socket_for(SocketTag::Gossip))
            .collect();
        let mut rng = rand::thread_rng();
        addrs.shuffle(&mut rng);
        addrs.truncate(n);
        addrs
    }

    fn resolved_entrypoints(&self) -> Vec<SocketAddr> {
        let mut entrypoints = self.entrypoints.lock().unwrap();
        let now = now_ms();
        entrypoints.iter_mut().for_each(|e| e.try_resolve(now));
        entrypoints.iter().filter_map(|e| e.resolved).collect()
    }

    fn send_bytes(&self, bytes: &[u8], dst: SocketAddr) {
        let packet = PacketBuffer::from_slice(bytes, dst, 0);
        let mut fabric = self.fabric.lock().unwrap();
        if let Err(e) = fabric.send_batch(&[packet], dst) {
            warn!("gossip: send to {dst} failed: {e}");
        }
    }
}

fn peer_contact_of(value: &CrdsValue) -> Option<gossip_crds::PeerContact> {
    match &value.data {
        CrdsData::ContactInfo(ci) => Some(gossip_crds::PeerContact {
            identity: ci.identity,
            wallclock: ci.wallclock_ms,
            shred_version: ci.shred_version,
            sockets: ci.sockets.clone(),
        }),
        CrdsData::LegacyContactInfo(ci) => Some(gossip_crds::PeerContact {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_engine_binds_a_portable_fabric_on_an_ephemeral_port() {
        let config = GossipConfig {
            bind_port: 0,
            ..GossipConfig::default()
        };
        let engine = GossipEngine::new(config).expect("engine should bind");
        assert_eq!(engine.peer_count(), 0);
    }

    #[test]
    fn unknown_outer_tag_increments_unknown_tag_count_not_dropped() {
        let config = GossipConfig {
            bind_port: 0,
            ..GossipConfig::default()
        };
        let engine = GossipEngine::new(config).unwrap();
        let bytes = 99u32.to_le_bytes();
        engine.dispatch_packet(&bytes, "127.0.0.1:9999".parse().unwrap());
        assert_eq!(engine.get_stats().unknown_tag_count, 1);
        assert_eq!(engine.get_stats().packets_dropped, 0);
    }
}
