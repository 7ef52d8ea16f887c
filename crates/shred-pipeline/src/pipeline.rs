use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use packet_fabric::{FabricConfig, PacketBuffer, PacketFabric};
use wire_codec::repair::WindowIndexRequest;
use wire_codec::types::Identity;
use wire_codec::Writer;

use crate::assembler::{InsertOutcome, ShredAssembler};
use crate::capability::{EmptyPeerDirectory, LeaderLookup, LedgerSink, NullLedger, PeerDirectory, Signer};
use crate::config::ShredConfig;
use crate::error::Result;
use crate::shred::Shred;
use crate::stats::{ShredStats, ShredStatsSnapshot};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSummary {
    pub shreds_processed: u64,
    pub slots_completed: u64,
    pub repairs_received: u64,
}

struct NullSigner;

impl Signer for NullSigner {
    fn identity(&self) -> Identity {
        [0u8; 32]
    }
    fn sign(&self, _bytes: &[u8]) -> wire_codec::types::Signature {
        [0u8; 64]
    }
}

pub struct ShredPipeline {
    config: ShredConfig,
    tvu_fabric: Mutex<PacketFabric>,
    repair_fabric: Mutex<PacketFabric>,
    assembler: ShredAssembler,
    completed: Mutex<VecDeque<u64>>,
    stats: ShredStats,
    running: AtomicBool,
    leader_lookup: Mutex<Option<Box<dyn LeaderLookup>>>,
    ledger: Mutex<Box<dyn LedgerSink>>,
    peer_directory: Mutex<Box<dyn PeerDirectory>>,
    signer: Mutex<Box<dyn Signer>>,
}

impl ShredPipeline {
    pub fn start(config: ShredConfig) -> Result<Self> {
        let tvu_addr: SocketAddr = ([0, 0, 0, 0], config.tvu_port).into();
        let repair_addr: SocketAddr = ([0, 0, 0, 0], config.repair_port).into();
        let mut tvu_fc = FabricConfig::new(tvu_addr);
        tvu_fc.batch_size = config.batch_size;
        let mut repair_fc = FabricConfig::new(repair_addr);
        repair_fc.batch_size = config.batch_size;

        let window = config.assembler_window;
        Ok(Self {
            config,
            tvu_fabric: Mutex::new(PacketFabric::open(tvu_fc)?),
            repair_fabric: Mutex::new(PacketFabric::open(repair_fc)?),
            assembler: ShredAssembler::new(window),
            completed: Mutex::new(VecDeque::new()),
            stats: ShredStats::default(),
            running: AtomicBool::new(true),
            leader_lookup: Mutex::new(None),
            ledger: Mutex::new(Box::new(NullLedger)),
            peer_directory: Mutex::new(Box::new(EmptyPeerDirectory)),
            signer: Mutex::new(Box::new(NullSigner)),
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn set_leader_schedule(&self, lookup: Box<dyn LeaderLookup>) {
        *self.leader_lookup.lock().unwrap() = Some(lookup);
    }

    pub fn set_ledger(&self, ledger: Box<dyn LedgerSink>) {
        *self.ledger.lock().unwrap() = ledger;
    }

    pub fn set_gossip(&self, directory: Box<dyn PeerDirectory>) {
        *self.peer_directory.lock().unwrap() = directory;
    }

    pub fn set_signer(&self, signer: Box<dyn Signer>) {
        *self.signer.lock().unwrap() = signer;
    }

    pub fn get_stats(&self) -> ShredStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn max_slot(&self) -> u64 {
        self.assembler.max_slot()
    }

    pub fn take_completed_slot(&self) -> Option<u64> {
        self.completed.lock().unwrap().pop_front()
    }

    pub fn shreds_for_slot(&self, slot: u64) -> Vec<Shred> {
        self.assembler.shreds_for_slot(slot)
    }

    pub fn process_packets(&self) -> ProcessSummary {
        let mut summary = ProcessSummary::default();
        self.drain_fabric(&self.tvu_fabric, false, &mut summary);
        self.drain_fabric(&self.repair_fabric, true, &mut summary);
        summary
    }

    fn drain_fabric(&self, fabric: &Mutex<PacketFabric>, from_repair_port: bool, summary: &mut ProcessSummary) {
        let mut batch = Vec::new();
        let received = {
            let mut f = fabric.lock().unwrap();
            f.recv_batch(&mut batch)
        };
        if received.is_err() {
            return;
        }
        for packet in &batch {
            self.process_one(packet.payload(), from_repair_port, summary);
        }
    }

    fn process_one(&self, bytes: &[u8], from_repair_port: bool, summary: &mut ProcessSummary) {
        ShredStats::inc(&self.stats.shreds_received);
        let shred = match Shred::parse(bytes) {
            Ok(s) => s,
            Err(_) => {
                ShredStats::inc(&self.stats.shreds_invalid);
                debug!("shred-pipeline: dropped unparseable packet");
                return;
            }
        };

        let leader = self
            .leader_lookup
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|l| l.leader_for_slot(shred.slot));
        match leader {
            Some(leader_identity) if shred.verify_signature(&leader_identity) => {}
            _ => {
                ShredStats::inc(&self.stats.shreds_invalid);
                return;
            }
        }

        if from_repair_port {
            ShredStats::inc(&self.stats.repairs_received);
            summary.repairs_received += 1;
        }

        let outcome = self.assembler.insert(shred.clone());
        match outcome {
            InsertOutcome::Duplicate => {
                ShredStats::inc(&self.stats.shreds_duplicate);
            }
            InsertOutcome::Inserted | InsertOutcome::CompletedSlot => {
                ShredStats::inc(&self.stats.shreds_inserted);
                self.ledger
                    .lock()
                    .unwrap()
                    .store_shred(shred.slot, shred.index, &shred.payload);
                summary.shreds_processed += 1;
                if outcome == InsertOutcome::CompletedSlot {
                    ShredStats::inc(&self.stats.slots_completed);
                    summary.slots_completed += 1;
                    self.completed.lock().unwrap().push_back(shred.slot);
                }
            }
        }
    }

    /// Emits a signed `WindowIndexRequest` to up to three repair-capable
    /// peers per missing index, falling back to the static configured list
    /// when the peer directory has nothing yet.
    pub fn request_repairs(&self, slot: u64, missing_indices: &[u32]) {
        let signer = self.signer.lock().unwrap();
        let sender = signer.identity();
        let candidates = self.peer_directory.lock().unwrap().repair_candidates(3);
        let targets: Vec<(Identity, SocketAddr)> = if candidates.is_empty() {
            self.config
                .static_repair_peers
                .iter()
                .map(|addr| ([0u8; 32], *addr))
                .collect()
        } else {
            candidates
        };

        for &index in missing_indices {
            for (recipient, addr) in targets.iter().take(3) {
                let now = now_ms();
                let nonce = (now & 0xFFFF_FFFF) as u32;
                let Ok(signable) =
                    WindowIndexRequest::signable_bytes(&sender, recipient, now, nonce, slot, index as u64)
                else {
                    continue;
                };
                let request = WindowIndexRequest {
                    signature: signer.sign(&signable),
                    sender,
                    recipient: *recipient,
                    timestamp_ms: now,
                    nonce,
                    slot,
                    shred_index: index as u64,
                };
                let mut buf = vec![0u8; WindowIndexRequest::WIRE_LEN];
                let mut w = Writer::new(&mut buf);
                if request.write(&mut w).is_ok() {
                    let len = w.position();
                    let packet = PacketBuffer::from_slice(&buf[..len], *addr, 0);
                    if self.repair_fabric.lock().unwrap().send_batch(&[packet], *addr).is_ok() {
                        ShredStats::inc(&self.stats.repairs_sent);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ShredConfig {
        ShredConfig {
            tvu_port: 0,
            repair_port: 0,
            ..ShredConfig::default()
        }
    }

    #[test]
    fn start_binds_both_ports_on_ephemeral_addresses() {
        let pipeline = ShredPipeline::start(test_config()).expect("pipeline should start");
        assert_eq!(pipeline.max_slot(), 0);
        assert!(pipeline.take_completed_slot().is_none());
    }

    #[test]
    fn request_repairs_falls_back_to_static_peers_without_panicking() {
        let mut config = test_config();
        config.static_repair_peers = vec!["127.0.0.1:9000".parse().unwrap()];
        let pipeline = ShredPipeline::start(config).unwrap();
        pipeline.request_repairs(10, &[0, 1, 2]);
        assert!(pipeline.get_stats().repairs_sent >= 1);
    }

    #[test]
    fn unverifiable_shred_without_leader_schedule_is_counted_invalid() {
        let pipeline = ShredPipeline::start(test_config()).unwrap();
        let shred = Shred::new(1, 0, true, true, vec![1, 2, 3]);
        let mut buf = vec![0u8; 256];
        let mut w = Writer::new(&mut buf);
        shred.write(&mut w).unwrap();
        let len = w.position();
        let mut summary = ProcessSummary::default();
        pipeline.process_one(&buf[..len], false, &mut summary);
        assert_eq!(pipeline.get_stats().shreds_invalid, 1);
        assert_eq!(summary.shreds_processed, 0);
    }
}
