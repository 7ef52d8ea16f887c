use std::net::IpAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use gossip_engine::GossipEngine;
use quic_transport::QuicTransport;
use shred_pipeline::ShredPipeline;
use tx_pipeline::TxPipeline;
use wire_codec::contact_info::SocketTag;

use crate::capability::{GossipPeerDirectory, IdentitySigner, LoggingLedgerSink};
use crate::config::ValidatorNetConfig;
use crate::error::Result;
use crate::leader::StaticLeaderSchedule;

/// Idle-receive yield, matching the "no cooperative async runtime; sleep
/// ~10ms when receive returns empty" scheduling rule every component here
/// follows.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Owns every long-lived component and the threads that drive them. Wiring
/// between components happens here, through the capability-handle traits
/// each component exposes — no component ever holds a reference to
/// `ValidatorNet` itself.
pub struct ValidatorNet {
    pub gossip: Arc<GossipEngine>,
    pub shreds: Arc<ShredPipeline>,
    pub transactions: Arc<TxPipeline>,
    pub quic: Arc<QuicTransport>,
    pub leader_schedule: Arc<StaticLeaderSchedule>,
    threads: Vec<JoinHandle<()>>,
}

impl ValidatorNet {
    pub fn start(config: ValidatorNetConfig, advertise_ip: IpAddr) -> Result<Self> {
        let gossip = Arc::new(GossipEngine::new(config.gossip.clone())?);
        gossip.set_keypair(clone_signing_key(&config.identity));
        let identity = config.identity.verifying_key().to_bytes();
        gossip.set_self(
            identity,
            advertise_ip,
            &[
                (SocketTag::Gossip, config.gossip.bind_port),
                (SocketTag::Tvu, config.shred.tvu_port),
                (SocketTag::Repair, config.shred.repair_port),
                (SocketTag::ServeRepair, config.shred.repair_port),
                (SocketTag::Tpu, config.tx.tpu_port),
                (SocketTag::TpuForwards, config.tx.tpu_forwards_port),
                (SocketTag::TvuQuic, config.quic.listen_port),
            ],
            config.shred_version,
        );

        let shreds = Arc::new(ShredPipeline::start(config.shred)?);
        let leader_schedule = Arc::new(StaticLeaderSchedule::new());
        shreds.set_leader_schedule(Box::new(StaticLeaderScheduleHandle(leader_schedule.clone())));
        shreds.set_ledger(Box::new(LoggingLedgerSink));
        shreds.set_gossip(Box::new(GossipPeerDirectory::new(gossip.clone())));
        shreds.set_signer(Box::new(IdentitySigner::new(clone_signing_key(&config.identity))));

        let transactions = Arc::new(TxPipeline::start(config.tx)?);
        let quic = Arc::new(QuicTransport::start(config.quic, clone_signing_key(&config.identity))?);

        Ok(Self {
            gossip,
            shreds,
            transactions,
            quic,
            leader_schedule,
            threads: Vec::new(),
        })
    }

    /// Spawns one named, long-lived thread per receive loop plus the
    /// gossip periodic loop, matching the concurrency model's "parallel
    /// OS-level threads, no cooperative async runtime" rule.
    pub fn spawn_threads(&mut self) {
        self.threads.push(
            thread::Builder::new()
                .name("validator-net-gossip".into())
                .spawn({
                    let gossip = self.gossip.clone();
                    move || gossip.run()
                })
                .expect("failed to spawn gossip thread"),
        );

        self.threads.push(
            thread::Builder::new()
                .name("validator-net-shreds".into())
                .spawn({
                    let shreds = self.shreds.clone();
                    move || loop {
                        let summary = shreds.process_packets();
                        if summary.shreds_processed == 0 {
                            thread::sleep(IDLE_SLEEP);
                        }
                    }
                })
                .expect("failed to spawn shred thread"),
        );

        self.threads.push(
            thread::Builder::new()
                .name("validator-net-tx".into())
                .spawn({
                    let transactions = self.transactions.clone();
                    move || loop {
                        let processed = transactions.process_packets();
                        if processed == 0 {
                            thread::sleep(IDLE_SLEEP);
                        }
                    }
                })
                .expect("failed to spawn tx thread"),
        );

        self.threads.push(
            thread::Builder::new()
                .name("validator-net-quic".into())
                .spawn({
                    let quic = self.quic.clone();
                    move || loop {
                        let processed = quic.process_packets();
                        if processed == 0 {
                            thread::sleep(IDLE_SLEEP);
                        }
                    }
                })
                .expect("failed to spawn quic thread"),
        );

        info!("validator-net: {} component threads running", self.threads.len());
    }

    pub fn stop(&mut self) {
        self.gossip.stop();
        self.shreds.stop();
        self.transactions.stop();
        self.quic.stop();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                warn!("validator-net: a component thread panicked while shutting down");
            }
        }
    }
}

/// `StaticLeaderSchedule` is shared by `Arc`, but `ShredPipeline::set_leader_schedule`
/// takes ownership of a boxed trait object; this thin wrapper lets the
/// daemon retain its own handle to mutate the schedule as new leader
/// information arrives from the bank.
struct StaticLeaderScheduleHandle(Arc<StaticLeaderSchedule>);

impl shred_pipeline::capability::LeaderLookup for StaticLeaderScheduleHandle {
    fn leader_for_slot(&self, slot: u64) -> Option<wire_codec::types::Identity> {
        self.0.leader_for_slot(slot)
    }
}

fn clone_signing_key(key: &ed25519_dalek::SigningKey) -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::from_bytes(&key.to_bytes())
}
