use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorNetError {
    #[error("gossip error: {0}")]
    Gossip(#[from] gossip_engine::GossipError),
    #[error("shred pipeline error: {0}")]
    Shred(#[from] shred_pipeline::ShredError),
    #[error("transaction pipeline error: {0}")]
    Tx(#[from] tx_pipeline::TxError),
    #[error("transport error: {0}")]
    Transport(#[from] quic_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, ValidatorNetError>;
