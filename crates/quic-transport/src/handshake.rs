use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{Result, TransportError};
use crate::keyschedule::{finished_key, finished_verify_data, Secret};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingClientHello,
    Processing,
    SendingServerHello,
    SendingEncryptedExtensions,
    SendingCertificate,
    SendingCertificateVerify,
    SendingFinished,
    AwaitingClientFinished,
    Complete,
    Failed,
}

const CERTIFICATE_VERIFY_CONTEXT: &[u8] = b"TLS 1.3, server CertificateVerify";

/// Builds the content a CertificateVerify signature covers: 64 space
/// bytes, the context string, a zero separator byte, and the transcript
/// hash so far (RFC 8446 §4.4.3).
pub fn certificate_verify_content(transcript_hash: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(64 + CERTIFICATE_VERIFY_CONTEXT.len() + 1 + transcript_hash.len());
    content.extend(std::iter::repeat(b' ').take(64));
    content.extend_from_slice(CERTIFICATE_VERIFY_CONTEXT);
    content.push(0);
    content.extend_from_slice(transcript_hash);
    content
}

pub fn sign_certificate_verify(signing_key: &SigningKey, transcript_hash: &[u8]) -> Signature {
    let content = certificate_verify_content(transcript_hash);
    signing_key.sign(&content)
}

pub fn verify_certificate_verify(
    verifying_key: &VerifyingKey,
    transcript_hash: &[u8],
    signature: &Signature,
) -> bool {
    let content = certificate_verify_content(transcript_hash);
    verifying_key.verify(&content, signature).is_ok()
}

/// Accumulates the handshake transcript hash incrementally, matching how a
/// real TLS stack folds each message into a running `Sha256` as it's sent
/// or received rather than hashing the whole log at once.
#[derive(Default, Clone)]
pub struct Transcript {
    hasher_state: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, message: &[u8]) {
        self.hasher_state.extend_from_slice(message);
    }

    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.hasher_state);
        hasher.finalize().into()
    }
}

/// Server-side QUIC/TLS handshake state machine (RFC 9001 §4).
pub struct ServerHandshake {
    pub state: HandshakeState,
    pub transcript: Transcript,
    signing_key: SigningKey,
}

impl ServerHandshake {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            state: HandshakeState::AwaitingClientHello,
            transcript: Transcript::new(),
            signing_key,
        }
    }

    fn require_state(&self, expected: HandshakeState) -> Result<()> {
        if self.state != expected {
            return Err(TransportError::HandshakeInvalidState);
        }
        Ok(())
    }

    pub fn on_client_hello(&mut self, client_hello: &[u8]) -> Result<()> {
        self.require_state(HandshakeState::AwaitingClientHello)?;
        self.transcript.update(client_hello);
        self.state = HandshakeState::Processing;
        Ok(())
    }

    pub fn advance_to_server_hello(&mut self, server_hello: &[u8]) -> Result<()> {
        self.require_state(HandshakeState::Processing)?;
        self.transcript.update(server_hello);
        self.state = HandshakeState::SendingServerHello;
        Ok(())
    }

    pub fn advance_to_encrypted_extensions(&mut self, encrypted_extensions: &[u8]) -> Result<()> {
        self.require_state(HandshakeState::SendingServerHello)?;
        self.transcript.update(encrypted_extensions);
        self.state = HandshakeState::SendingEncryptedExtensions;
        Ok(())
    }

    pub fn advance_to_certificate(&mut self, certificate: &[u8]) -> Result<()> {
        self.require_state(HandshakeState::SendingEncryptedExtensions)?;
        self.transcript.update(certificate);
        self.state = HandshakeState::SendingCertificate;
        Ok(())
    }

    /// Produces the CertificateVerify signature over the transcript hash
    /// accumulated up to (but not including) this message.
    pub fn advance_to_certificate_verify(&mut self) -> Result<Signature> {
        self.require_state(HandshakeState::SendingCertificate)?;
        let signature = sign_certificate_verify(&self.signing_key, &self.transcript.hash());
        self.transcript.update(&signature.to_bytes());
        self.state = HandshakeState::SendingCertificateVerify;
        Ok(signature)
    }

    /// Produces the Finished verify data and transitions to awaiting the
    /// client's own Finished message.
    pub fn advance_to_finished(&mut self, handshake_traffic_secret: &Secret) -> Result<Vec<u8>> {
        self.require_state(HandshakeState::SendingCertificateVerify)?;
        let finished_key = finished_key(handshake_traffic_secret)?;
        let verify_data = finished_verify_data(&finished_key, &self.transcript.hash());
        self.transcript.update(&verify_data);
        self.state = HandshakeState::SendingFinished;
        Ok(verify_data)
    }

    pub fn expect_client_finished(&mut self) -> Result<()> {
        self.require_state(HandshakeState::SendingFinished)?;
        self.state = HandshakeState::AwaitingClientFinished;
        Ok(())
    }

    /// Verifies the client's Finished message against the client
    /// handshake-traffic secret; completes the handshake on success, fails
    /// it (terminally) otherwise.
    pub fn on_client_finished(
        &mut self,
        client_handshake_traffic_secret: &Secret,
        received_verify_data: &[u8],
    ) -> Result<()> {
        self.require_state(HandshakeState::AwaitingClientFinished)?;
        let finished_key = finished_key(client_handshake_traffic_secret)?;
        let expected = finished_verify_data(&finished_key, &self.transcript.hash());
        if expected != received_verify_data {
            self.state = HandshakeState::Failed;
            return Err(TransportError::FinishedVerificationFailed);
        }
        self.state = HandshakeState::Complete;
        Ok(())
    }

    pub fn fail(&mut self) {
        self.state = HandshakeState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn certificate_verify_signature_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let transcript_hash = [1u8; 32];
        let signature = sign_certificate_verify(&signing_key, &transcript_hash);
        assert!(verify_certificate_verify(&verifying_key, &transcript_hash, &signature));
    }

    #[test]
    fn handshake_progresses_through_states_to_complete() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut hs = ServerHandshake::new(signing_key);
        hs.on_client_hello(b"client hello").unwrap();
        hs.advance_to_server_hello(b"server hello").unwrap();
        hs.advance_to_encrypted_extensions(b"ee").unwrap();
        hs.advance_to_certificate(b"cert").unwrap();
        hs.advance_to_certificate_verify().unwrap();
        let secret: Secret = [5u8; 32];
        hs.advance_to_finished(&secret).unwrap();
        hs.expect_client_finished().unwrap();

        let finished_key_bytes = finished_key(&secret).unwrap();
        let expected = finished_verify_data(&finished_key_bytes, &hs.transcript.hash());
        hs.on_client_finished(&secret, &expected).unwrap();
        assert_eq!(hs.state, HandshakeState::Complete);
    }

    #[test]
    fn wrong_finished_verify_data_fails_the_handshake() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut hs = ServerHandshake::new(signing_key);
        hs.state = HandshakeState::AwaitingClientFinished;
        let secret: Secret = [5u8; 32];
        let err = hs.on_client_finished(&secret, b"garbage").unwrap_err();
        assert!(matches!(err, TransportError::FinishedVerificationFailed));
        assert_eq!(hs.state, HandshakeState::Failed);
    }

    #[test]
    fn operation_out_of_order_is_rejected() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut hs = ServerHandshake::new(signing_key);
        assert!(hs.advance_to_server_hello(b"too early").is_err());
    }
}
