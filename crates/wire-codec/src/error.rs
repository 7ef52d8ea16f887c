use thiserror::Error;

/// Errors surfaced by every `serialize_X` / `deserialize_X` pair in this crate.
///
/// Deserialization never panics: short input, unknown discriminants, and
/// oversized varints are all reported here rather than indexed-out-of-bounds.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("input too short or otherwise malformed")]
    InvalidData,
    #[error("unrecognized enum discriminant")]
    InvalidEnumTag,
    #[error("destination buffer too small")]
    BufferTooSmall,
    #[error("varint exceeds 64 bits")]
    VarIntOverflow,
}

pub type Result<T> = std::result::Result<T, CodecError>;
