use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShredError {
    #[error("fabric error: {0}")]
    Fabric(#[from] packet_fabric::FabricError),
    #[error("codec error: {0}")]
    Codec(#[from] wire_codec::CodecError),
    #[error("no leader schedule configured")]
    NoLeaderSchedule,
}

pub type Result<T> = std::result::Result<T, ShredError>;
