//! Each gossip message type defines its own signable-byte range. These are
//! kept as three distinct pure functions rather than one shared helper: a
//! ping signs its bare token, a pong signs the SHA-256 of that token, and a
//! CRDS value signs its variant tag plus payload — conflating any of these
//! would let a signature for one message type verify against another.
use sha2::{Digest, Sha256};

const PING_PONG_DOMAIN: &[u8] = b"SOLANA_PING_PONG";

/// Signable bytes for a ping: the 32-byte token alone. The sender's identity
/// is not part of the signed input.
pub fn signable_bytes_for_ping(token: &[u8; 32]) -> Vec<u8> {
    token.to_vec()
}

/// The pong hash: SHA-256("SOLANA_PING_PONG" ++ token).
pub fn pong_hash(token: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(PING_PONG_DOMAIN);
    hasher.update(token);
    hasher.finalize().into()
}

/// Signable bytes for a pong: the pong hash itself.
pub fn signable_bytes_for_pong(token: &[u8; 32]) -> [u8; 32] {
    pong_hash(token)
}

/// Signable bytes for a CRDS value: the 4-byte little-endian variant
/// discriminant followed by the serialized variant payload.
pub fn signable_bytes_for_crds_value(variant_tag: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&variant_tag.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pong_hash_matches_definition_for_any_token() {
        let token = [42u8; 32];
        let mut hasher = Sha256::new();
        hasher.update(PING_PONG_DOMAIN);
        hasher.update(token);
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(pong_hash(&token), expected);
    }

    #[test]
    fn ping_signable_bytes_excludes_identity() {
        let token = [7u8; 32];
        assert_eq!(signable_bytes_for_ping(&token), token.to_vec());
    }
}
