use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, TransportError};

/// Published QUIC v1 initial salt (RFC 9001 §5.2).
pub const INITIAL_SALT: [u8; 20] = [
    0x38, 0x76, 0x2c, 0xf7, 0xf5, 0x59, 0x34, 0xb3, 0x4d, 0x17, 0x9a, 0xe6, 0xa4, 0xc8, 0x0c, 0xad,
    0xcc, 0xbb, 0x7f, 0x0a,
];

pub const CIPHER_SUITE_AES_128_GCM_SHA256: u16 = 0x1301;
pub const CIPHER_SUITE_CHACHA20_POLY1305_SHA256: u16 = 0x1303;

pub type Secret = [u8; 32];

/// Per-direction traffic keys derived from a secret: packet-protection key,
/// IV, and header-protection key.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalKeys {
    pub key: [u8; 16],
    pub iv: [u8; 12],
    pub hp: [u8; 16],
}

fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> Secret {
    let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), ikm);
    let mut out = [0u8; 32];
    out.copy_from_slice(&prk);
    out
}

/// TLS 1.3 HKDF-Expand-Label: a wire-format wrapper around HKDF-Expand that
/// prefixes the label with `"tls13 "` and encodes (length, label, context)
/// per RFC 8446 §7.1. `len` is capped implicitly by HKDF-Expand's own
/// 255-block limit (8160 bytes for SHA-256); callers here never ask for
/// more than 32.
pub fn hkdf_expand_label(secret: &Secret, label: &str, context: &[u8], len: usize) -> Result<Vec<u8>> {
    let full_label = format!("tls13 {label}");
    if full_label.len() > 255 || context.len() > 255 {
        return Err(TransportError::KeyExchangeFailed);
    }
    let mut info = Vec::with_capacity(2 + 1 + full_label.len() + 1 + context.len());
    info.extend_from_slice(&(len as u16).to_be_bytes());
    info.push(full_label.len() as u8);
    info.extend_from_slice(full_label.as_bytes());
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    let hk = Hkdf::<Sha256>::from_prk(secret).map_err(|_| TransportError::KeyExchangeFailed)?;
    let mut out = vec![0u8; len];
    hk.expand(&info, &mut out)
        .map_err(|_| TransportError::KeyExchangeFailed)?;
    Ok(out)
}

fn derive_secret(secret: &Secret, label: &str) -> Result<Secret> {
    let bytes = hkdf_expand_label(secret, label, &[], 32)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn derive_directional_keys(secret: &Secret) -> Result<DirectionalKeys> {
    let key_bytes = hkdf_expand_label(secret, "quic key", &[], 16)?;
    let iv_bytes = hkdf_expand_label(secret, "quic iv", &[], 12)?;
    let hp_bytes = hkdf_expand_label(secret, "quic hp", &[], 16)?;
    let mut key = [0u8; 16];
    let mut iv = [0u8; 12];
    let mut hp = [0u8; 16];
    key.copy_from_slice(&key_bytes);
    iv.copy_from_slice(&iv_bytes);
    hp.copy_from_slice(&hp_bytes);
    Ok(DirectionalKeys { key, iv, hp })
}

pub struct InitialSecrets {
    pub client: Secret,
    pub server: Secret,
}

/// Derives the initial client/server traffic secrets from a destination
/// connection id, per RFC 9001 §5.2.
pub fn initial_secrets(dst_connection_id: &[u8]) -> Result<InitialSecrets> {
    let initial_secret = hkdf_extract(&INITIAL_SALT, dst_connection_id);
    Ok(InitialSecrets {
        client: derive_secret(&initial_secret, "client in")?,
        server: derive_secret(&initial_secret, "server in")?,
    })
}

pub fn handshake_traffic_secret(shared_secret: &[u8], is_client: bool) -> Result<Secret> {
    let early_secret = hkdf_extract(&[0u8; 32], &[0u8; 32]);
    let derived = derive_secret(&early_secret, "derived")?;
    let handshake_secret = hkdf_extract(&derived, shared_secret);
    let label = if is_client { "c hs traffic" } else { "s hs traffic" };
    derive_secret(&handshake_secret, label)
}

pub fn application_traffic_secret(master_secret: &Secret, is_client: bool) -> Result<Secret> {
    let label = if is_client { "c ap traffic" } else { "s ap traffic" };
    derive_secret(master_secret, label)
}

pub fn early_data_secret(resumption_secret: &Secret) -> Result<Secret> {
    derive_secret(resumption_secret, "c e traffic")
}

pub fn update_traffic_secret(current: &Secret) -> Result<Secret> {
    derive_secret(current, "traffic upd")
}

/// HMAC-SHA-256(finished_key, transcript_hash), used both to produce and to
/// verify the handshake Finished message.
pub fn finished_verify_data(finished_key: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(finished_key).expect("HMAC accepts any key length");
    mac.update(transcript_hash);
    mac.finalize().into_bytes().to_vec()
}

pub fn finished_key(base_secret: &Secret) -> Result<Secret> {
    derive_secret(base_secret, "finished")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_secrets_are_deterministic_and_directionally_distinct() {
        let dcid = [0xAAu8; 8];
        let a = initial_secrets(&dcid).unwrap();
        let b = initial_secrets(&dcid).unwrap();
        assert_eq!(a.client, b.client);
        assert_ne!(a.client, a.server);
    }

    #[test]
    fn directional_keys_have_expected_lengths() {
        let secret = [7u8; 32];
        let keys = derive_directional_keys(&secret).unwrap();
        assert_eq!(keys.key.len(), 16);
        assert_eq!(keys.iv.len(), 12);
        assert_eq!(keys.hp.len(), 16);
    }
}
