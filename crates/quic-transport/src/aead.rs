use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes128Gcm;
use chacha20poly1305::ChaCha20Poly1305;

use crate::error::{Result, TransportError};
use crate::keyschedule::{
    CIPHER_SUITE_AES_128_GCM_SHA256, CIPHER_SUITE_CHACHA20_POLY1305_SHA256,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    Aes128Gcm,
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            CIPHER_SUITE_AES_128_GCM_SHA256 => Ok(Self::Aes128Gcm),
            CIPHER_SUITE_CHACHA20_POLY1305_SHA256 => Ok(Self::ChaCha20Poly1305),
            other => Err(TransportError::UnsupportedCipherSuite(other)),
        }
    }
}

enum Inner {
    Aes128Gcm(Aes128Gcm),
    ChaCha20Poly1305(ChaCha20Poly1305),
}

/// A packet-protection AEAD bound to one direction's key and IV. The nonce
/// for a given packet number is computed fresh each call per RFC 9001 §5.3.
pub struct PacketAead {
    inner: Inner,
    iv: [u8; 12],
}

impl PacketAead {
    pub fn new(suite: CipherSuite, key: &[u8; 16], iv: [u8; 12]) -> Self {
        let inner = match suite {
            CipherSuite::Aes128Gcm => Inner::Aes128Gcm(Aes128Gcm::new(key.into())),
            CipherSuite::ChaCha20Poly1305 => {
                let mut key32 = [0u8; 32];
                key32[..16].copy_from_slice(key);
                Inner::ChaCha20Poly1305(ChaCha20Poly1305::new((&key32).into()))
            }
        };
        Self { inner, iv }
    }

    fn nonce_for(&self, packet_number: u64) -> [u8; 12] {
        let mut nonce = self.iv;
        let pn_bytes = packet_number.to_be_bytes();
        for i in 0..8 {
            nonce[4 + i] ^= pn_bytes[i];
        }
        nonce
    }

    pub fn seal(&self, packet_number: u64, header: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = self.nonce_for(packet_number);
        let payload = Payload {
            msg: plaintext,
            aad: header,
        };
        match &self.inner {
            Inner::Aes128Gcm(c) => c
                .encrypt((&nonce).into(), payload)
                .map_err(|_| TransportError::KeyExchangeFailed),
            Inner::ChaCha20Poly1305(c) => c
                .encrypt((&nonce).into(), payload)
                .map_err(|_| TransportError::KeyExchangeFailed),
        }
    }

    pub fn open(&self, packet_number: u64, header: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let nonce = self.nonce_for(packet_number);
        let payload = Payload {
            msg: ciphertext,
            aad: header,
        };
        match &self.inner {
            Inner::Aes128Gcm(c) => c
                .decrypt((&nonce).into(), payload)
                .map_err(|_| TransportError::FinishedVerificationFailed),
            Inner::ChaCha20Poly1305(c) => c
                .decrypt((&nonce).into(), payload)
                .map_err(|_| TransportError::FinishedVerificationFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_gcm_roundtrips() {
        let aead = PacketAead::new(CipherSuite::Aes128Gcm, &[1u8; 16], [2u8; 12]);
        let ct = aead.seal(0, b"header", b"hello quic").unwrap();
        let pt = aead.open(0, b"header", &ct).unwrap();
        assert_eq!(pt, b"hello quic");
    }

    #[test]
    fn chacha_roundtrips() {
        let aead = PacketAead::new(CipherSuite::ChaCha20Poly1305, &[1u8; 16], [2u8; 12]);
        let ct = aead.seal(5, b"header", b"hello quic").unwrap();
        let pt = aead.open(5, b"header", &ct).unwrap();
        assert_eq!(pt, b"hello quic");
    }

    #[test]
    fn tampered_aad_fails_to_open() {
        let aead = PacketAead::new(CipherSuite::Aes128Gcm, &[1u8; 16], [2u8; 12]);
        let ct = aead.seal(0, b"header", b"hello quic").unwrap();
        assert!(aead.open(0, b"wrong header", &ct).is_err());
    }
}
