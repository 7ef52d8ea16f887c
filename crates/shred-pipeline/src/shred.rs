use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

use wire_codec::error::{CodecError, Result};
use wire_codec::reader::Reader;
use wire_codec::types::{read_signature, write_signature, Identity, Signature};
use wire_codec::writer::Writer;

const FLAG_IS_DATA: u8 = 0b01;
const FLAG_IS_LAST_IN_SLOT: u8 = 0b10;

/// Treated as a black box beyond the handful of accessors this core needs:
/// `slot`, `index`, `is_data`, `is_last_in_slot`, and signature verification
/// against the slot's leader. The payload itself is forwarded to the ledger
/// sink untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shred {
    pub signature: Signature,
    pub slot: u64,
    pub index: u32,
    flags: u8,
    pub payload: Vec<u8>,
}

impl Shred {
    pub fn new(slot: u64, index: u32, is_data: bool, is_last_in_slot: bool, payload: Vec<u8>) -> Self {
        let mut flags = 0;
        if is_data {
            flags |= FLAG_IS_DATA;
        }
        if is_last_in_slot {
            flags |= FLAG_IS_LAST_IN_SLOT;
        }
        Self {
            signature: [0u8; 64],
            slot,
            index,
            flags,
            payload,
        }
    }

    pub fn is_data(&self) -> bool {
        self.flags & FLAG_IS_DATA != 0
    }

    pub fn is_last_in_slot(&self) -> bool {
        self.flags & FLAG_IS_LAST_IN_SLOT != 0
    }

    /// Bytes covered by the shred's signature: everything after the
    /// signature field.
    fn signable_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + 4 + 1 + self.payload.len());
        out.extend_from_slice(&self.slot.to_le_bytes());
        out.extend_from_slice(&self.index.to_le_bytes());
        out.push(self.flags);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn verify_signature(&self, leader: &Identity) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(leader) else {
            return false;
        };
        let Ok(signature) = DalekSignature::from_slice(&self.signature) else {
            return false;
        };
        verifying_key.verify(&self.signable_bytes(), &signature).is_ok()
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        write_signature(w, &self.signature)?;
        w.write_u64(self.slot)?;
        w.write_u32(self.index)?;
        w.write_u8(self.flags)?;
        w.write_len_prefixed_bytes(&self.payload)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let signature = read_signature(&mut r)?;
        let slot = r.read_u64()?;
        let index = r.read_u32()?;
        let flags = r.read_u8()?;
        let payload = r.read_len_prefixed_bytes()?;
        if payload.is_empty() {
            return Err(CodecError::InvalidData);
        }
        Ok(Self {
            signature,
            slot,
            index,
            flags,
            payload,
        })
    }

    pub fn sign_with(&mut self, identity_unused: &Identity, signer: impl Fn(&[u8]) -> Signature) {
        let _ = identity_unused;
        self.signature = signer(&self.signable_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_short_input_not_panicking() {
        assert!(Shred::parse(&[1, 2, 3]).is_err());
    }

    #[test]
    fn roundtrips_slot_index_and_flags() {
        let shred = Shred::new(42, 7, true, false, vec![1, 2, 3, 4]);
        let mut buf = vec![0u8; 256];
        let mut w = Writer::new(&mut buf);
        shred.write(&mut w).unwrap();
        let len = w.position();
        let parsed = Shred::parse(&buf[..len]).unwrap();
        assert_eq!(parsed.slot, 42);
        assert_eq!(parsed.index, 7);
        assert!(parsed.is_data());
        assert!(!parsed.is_last_in_slot());
        assert_eq!(parsed.payload, vec![1, 2, 3, 4]);
    }
}
