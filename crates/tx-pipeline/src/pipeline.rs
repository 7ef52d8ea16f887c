use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;
use packet_fabric::{FabricConfig, PacketBuffer, PacketFabric};

use crate::config::TxConfig;
use crate::dedup::DedupSet;
use crate::error::Result;
use crate::queue::{PriorityQueue, QueuedTx};
use crate::stats::{TxStats, TxStatsSnapshot};
use crate::transaction::Transaction;

pub struct TxPipeline {
    config: TxConfig,
    tpu_fabric: Mutex<PacketFabric>,
    tpu_forwards_fabric: Mutex<PacketFabric>,
    queue: Mutex<PriorityQueue>,
    dedup: Mutex<DedupSet>,
    stats: TxStats,
    running: AtomicBool,
}

impl TxPipeline {
    pub fn start(config: TxConfig) -> Result<Self> {
        let tpu_addr: SocketAddr = ([0, 0, 0, 0], config.tpu_port).into();
        let forwards_addr: SocketAddr = ([0, 0, 0, 0], config.tpu_forwards_port).into();
        let mut tpu_fc = FabricConfig::new(tpu_addr);
        tpu_fc.batch_size = config.batch_size;
        let mut forwards_fc = FabricConfig::new(forwards_addr);
        forwards_fc.batch_size = config.batch_size;

        let queue_capacity = config.queue_capacity;
        let dedup_capacity = config.dedup_capacity;
        Ok(Self {
            config,
            tpu_fabric: Mutex::new(PacketFabric::open(tpu_fc)?),
            tpu_forwards_fabric: Mutex::new(PacketFabric::open(forwards_fc)?),
            queue: Mutex::new(PriorityQueue::new(queue_capacity)),
            dedup: Mutex::new(DedupSet::new(dedup_capacity)),
            stats: TxStats::default(),
            running: AtomicBool::new(true),
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TxStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Drains both TPU ports and admits well-formed, signed, non-duplicate
    /// transactions into the priority queue. Returns the number of packets
    /// read, not the number admitted.
    pub fn process_packets(&self) -> u64 {
        let mut processed = 0u64;
        processed += self.drain_fabric(&self.tpu_fabric);
        processed += self.drain_fabric(&self.tpu_forwards_fabric);
        processed
    }

    fn drain_fabric(&self, fabric: &Mutex<PacketFabric>) -> u64 {
        let mut batch = Vec::new();
        let received = {
            let mut f = fabric.lock().unwrap();
            f.recv_batch(&mut batch)
        };
        if received.is_err() {
            return 0;
        }
        for packet in &batch {
            TxStats::inc(&self.stats.packets_received);
            self.admit(packet.payload());
        }
        batch.len() as u64
    }

    /// Parses, verifies, and admits a raw transaction payload. Used both by
    /// `process_packets` for network-received bytes and directly for
    /// locally-originated submissions.
    pub fn submit_transaction(&self, bytes: &[u8]) -> bool {
        self.admit(bytes)
    }

    /// Vote transactions are admitted through the same pipeline; callers
    /// that need to distinguish votes for banking-stage prioritization rely
    /// on `QueuedTx::is_vote`, which this simplified core leaves `false` for
    /// since vote detection requires the real vote-program id.
    pub fn submit_vote_transaction(&self, bytes: &[u8]) -> bool {
        if self.admit(bytes) {
            TxStats::inc(&self.stats.votes_admitted);
            true
        } else {
            false
        }
    }

    fn admit(&self, bytes: &[u8]) -> bool {
        let transaction = match Transaction::parse(bytes) {
            Ok(t) => t,
            Err(_) => {
                TxStats::inc(&self.stats.transactions_invalid);
                debug!("tx-pipeline: dropped unparseable transaction");
                return false;
            }
        };
        if !transaction.verify_signatures() {
            TxStats::inc(&self.stats.transactions_invalid);
            return false;
        }
        let signature = match transaction.first_signature() {
            Some(s) => s,
            None => {
                TxStats::inc(&self.stats.transactions_invalid);
                return false;
            }
        };
        if !self.dedup.lock().unwrap().insert(signature) {
            TxStats::inc(&self.stats.transactions_duplicate);
            return false;
        }
        if self.queue.lock().unwrap().push(transaction, false) {
            TxStats::inc(&self.stats.transactions_admitted);
            true
        } else {
            TxStats::inc(&self.stats.transactions_dropped_full);
            false
        }
    }

    /// Removes up to `n` highest-priority transactions for the banking
    /// stage to execute.
    pub fn drain_for_banking(&self, n: usize) -> Vec<QueuedTx> {
        self.queue.lock().unwrap().drain(n)
    }

    /// Forwards the given transactions' raw bytes to the current leader's
    /// TPU-forwards socket, returning how many sends succeeded.
    pub fn forward_to_leader(&self, leader_tpu: SocketAddr, txs: &[QueuedTx]) -> u64 {
        let mut forwarded = 0u64;
        let mut buf = vec![0u8; packet_fabric::PACKET_DATA_SIZE];
        let mut fabric = self.tpu_forwards_fabric.lock().unwrap();
        for queued in txs {
            let mut writer = wire_codec::Writer::new(&mut buf);
            if queued.transaction.write(&mut writer).is_err() {
                continue;
            }
            let len = writer.position();
            let packet = PacketBuffer::from_slice(&buf[..len], leader_tpu, 0);
            if fabric.send_batch(&[packet], leader_tpu).is_ok() {
                forwarded += 1;
                TxStats::inc(&self.stats.transactions_forwarded);
            }
        }
        forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TxConfig {
        TxConfig {
            tpu_port: 0,
            tpu_forwards_port: 0,
            ..TxConfig::default()
        }
    }

    #[test]
    fn start_binds_both_ports_on_ephemeral_addresses() {
        let pipeline = TxPipeline::start(test_config()).expect("pipeline should start");
        assert_eq!(pipeline.queue_len(), 0);
    }

    #[test]
    fn rejects_unparseable_submission() {
        let pipeline = TxPipeline::start(test_config()).unwrap();
        assert!(!pipeline.submit_transaction(&[1, 2, 3]));
        assert_eq!(pipeline.get_stats().transactions_invalid, 1);
    }

    #[test]
    fn drain_for_banking_returns_nothing_when_queue_is_empty() {
        let pipeline = TxPipeline::start(test_config()).unwrap();
        assert!(pipeline.drain_for_banking(10).is_empty());
    }
}
