use ed25519_dalek::{Signer, SigningKey};
use wire_codec::types::Signature;

/// Thin wrapper so the engine can hold an optional signer without every
/// call site matching on `Option`. Signing with no keypair present produces
/// an all-zero signature — peers will reject the message, which is the
/// documented degrade-gracefully behavior for a misconfigured node.
#[derive(Default)]
pub struct Keypair {
    inner: Option<SigningKey>,
}

impl Keypair {
    pub fn set(&mut self, signer: SigningKey) {
        self.inner = Some(signer);
    }

    pub fn is_set(&self) -> bool {
        self.inner.is_some()
    }

    pub fn public_identity(&self) -> Option<[u8; 32]> {
        self.inner.as_ref().map(|k| k.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        match &self.inner {
            Some(key) => key.sign(message).to_bytes(),
            None => [0u8; 64],
        }
    }
}
