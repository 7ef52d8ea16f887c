//! Little-endian "bincode" plus Solana-specific compact-u16 and LEB128-varint
//! codec for the gossip wire protocol: fixed-width primitives, contact info
//! (legacy and modern), CRDS values, bloom/CRDS filters, the outer gossip
//! message frame, signable-byte definitions, and the shred repair request.
//!
//! Every `deserialize_X` here is total: malformed input produces a
//! `CodecError`, never a panic. Every `serialize_X` bounds-checks its
//! destination buffer.

pub mod bloom;
pub mod contact_info;
pub mod crds_value;
pub mod error;
pub mod protocol;
pub mod reader;
pub mod repair;
pub mod sign;
pub mod types;
pub mod writer;

pub use error::{CodecError, Result};
pub use reader::Reader;
pub use writer::Writer;
