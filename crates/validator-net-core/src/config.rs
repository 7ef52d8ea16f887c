use ed25519_dalek::SigningKey;
use gossip_engine::GossipConfig;
use quic_transport::QuicConfig;
use shred_pipeline::ShredConfig;
use tx_pipeline::TxConfig;

pub struct ValidatorNetConfig {
    pub identity: SigningKey,
    pub shred_version: u16,
    pub gossip: GossipConfig,
    pub shred: ShredConfig,
    pub tx: TxConfig,
    pub quic: QuicConfig,
}
