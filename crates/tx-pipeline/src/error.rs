use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("fabric error: {0}")]
    Fabric(#[from] packet_fabric::FabricError),
    #[error("codec error: {0}")]
    Codec(#[from] wire_codec::CodecError),
}

pub type Result<T> = std::result::Result<T, TxError>;
