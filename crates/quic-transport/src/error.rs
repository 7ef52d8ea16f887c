use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("fabric error: {0}")]
    Fabric(#[from] packet_fabric::FabricError),
    #[error("codec error: {0}")]
    Codec(#[from] wire_codec::CodecError),
    #[error("key exchange failed")]
    KeyExchangeFailed,
    #[error("finished verification failed")]
    FinishedVerificationFailed,
    #[error("active migration is disabled by the peer's transport parameters")]
    MigrationDisabled,
    #[error("unsupported cipher suite: {0:#06x}")]
    UnsupportedCipherSuite(u16),
    #[error("handshake in invalid state for this operation")]
    HandshakeInvalidState,
    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
