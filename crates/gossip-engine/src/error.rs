use thiserror::Error;

#[derive(Error, Debug)]
pub enum GossipError {
    #[error("fabric error: {0}")]
    Fabric(#[from] packet_fabric::FabricError),
    #[error("dns resolution failed for {host}: {source}")]
    Dns {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("gossip engine already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, GossipError>;
