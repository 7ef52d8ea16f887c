use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

use wire_codec::error::{CodecError, Result};
use wire_codec::reader::Reader;
use wire_codec::types::{Identity, Signature};
use wire_codec::writer::Writer;

/// The program id this cluster's compute-budget program is deployed at.
/// `SetComputeUnitPrice` is the fourth instruction variant (discriminant 3).
pub const COMPUTE_BUDGET_PROGRAM_ID: Identity = [
    3, 6, 70, 111, 229, 33, 23, 50, 255, 236, 173, 186, 114, 195, 155, 231, 188, 140, 229, 187,
    151, 6, 215, 198, 109, 100, 142, 13, 249, 0, 0, 0,
];
const SET_COMPUTE_UNIT_PRICE_DISCRIMINANT: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// A simplified legacy-format Solana transaction: compact-array of
/// signatures, then a message of (header, account keys, recent blockhash,
/// instructions). Versioned transactions and address-lookup tables are out
/// of scope for this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub num_required_signatures: u8,
    pub account_keys: Vec<Identity>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<Instruction>,
    message_bytes: Vec<u8>,
}

impl Transaction {
    pub fn first_signature(&self) -> Option<Signature> {
        self.signatures.first().copied()
    }

    pub fn fee_payer(&self) -> Option<Identity> {
        self.account_keys.first().copied()
    }

    /// Verifies every required signature against the serialized message.
    /// Malformed public keys or signatures fail closed.
    pub fn verify_signatures(&self) -> bool {
        if self.signatures.len() < self.num_required_signatures as usize {
            return false;
        }
        if self.account_keys.len() < self.num_required_signatures as usize {
            return false;
        }
        for i in 0..self.num_required_signatures as usize {
            let Ok(verifying_key) = VerifyingKey::from_bytes(&self.account_keys[i]) else {
                return false;
            };
            let Ok(signature) = DalekSignature::from_slice(&self.signatures[i]) else {
                return false;
            };
            if verifying_key.verify(&self.message_bytes, &signature).is_err() {
                return false;
            }
        }
        true
    }

    /// Scans instructions for a `SetComputeUnitPrice` call against the
    /// compute-budget program, returning the requested micro-lamport price.
    /// Zero if no such instruction is present.
    pub fn priority(&self) -> u64 {
        for ix in &self.instructions {
            let Some(program_id) = self.account_keys.get(ix.program_id_index as usize) else {
                continue;
            };
            if program_id != &COMPUTE_BUDGET_PROGRAM_ID {
                continue;
            }
            if ix.data.len() < 9 || ix.data[0] != SET_COMPUTE_UNIT_PRICE_DISCRIMINANT {
                continue;
            }
            let mut price_bytes = [0u8; 8];
            price_bytes.copy_from_slice(&ix.data[1..9]);
            return u64::from_le_bytes(price_bytes);
        }
        0
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let sig_count = r.read_compact_u16()? as usize;
        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            signatures.push(r.read_array::<64>()?);
        }

        let message_start = r.position();
        let num_required_signatures = r.read_u8()?;
        let _num_readonly_signed = r.read_u8()?;
        let _num_readonly_unsigned = r.read_u8()?;

        let key_count = r.read_compact_u16()? as usize;
        let mut account_keys = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            account_keys.push(r.read_array::<32>()?);
        }

        let recent_blockhash = r.read_array::<32>()?;

        let ix_count = r.read_compact_u16()? as usize;
        let mut instructions = Vec::with_capacity(ix_count);
        for _ in 0..ix_count {
            let program_id_index = r.read_u8()?;
            let account_count = r.read_compact_u16()? as usize;
            let mut accounts = Vec::with_capacity(account_count);
            for _ in 0..account_count {
                accounts.push(r.read_u8()?);
            }
            let data = r.read_len_prefixed_bytes()?;
            instructions.push(Instruction {
                program_id_index,
                accounts,
                data,
            });
        }

        if num_required_signatures as usize > account_keys.len() {
            return Err(CodecError::InvalidData);
        }

        let message_end = r.position();
        let message_bytes = bytes[message_start..message_end].to_vec();

        Ok(Self {
            signatures,
            num_required_signatures,
            account_keys,
            recent_blockhash,
            instructions,
            message_bytes,
        })
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_compact_u16(self.signatures.len() as u16)?;
        for sig in &self.signatures {
            w.write_bytes(sig)?;
        }
        w.write_u8(self.num_required_signatures)?;
        w.write_u8(0)?;
        w.write_u8(0)?;
        w.write_compact_u16(self.account_keys.len() as u16)?;
        for key in &self.account_keys {
            w.write_bytes(key)?;
        }
        w.write_bytes(&self.recent_blockhash)?;
        w.write_compact_u16(self.instructions.len() as u16)?;
        for ix in &self.instructions {
            w.write_u8(ix.program_id_index)?;
            w.write_compact_u16(ix.accounts.len() as u16)?;
            for a in &ix.accounts {
                w.write_u8(*a)?;
            }
            w.write_len_prefixed_bytes(&ix.data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            signatures: vec![[0u8; 64]],
            num_required_signatures: 1,
            account_keys: vec![[1u8; 32], COMPUTE_BUDGET_PROGRAM_ID],
            recent_blockhash: [2u8; 32],
            instructions: vec![Instruction {
                program_id_index: 1,
                accounts: vec![],
                data: {
                    let mut d = vec![SET_COMPUTE_UNIT_PRICE_DISCRIMINANT];
                    d.extend_from_slice(&12_345u64.to_le_bytes());
                    d
                },
            }],
            message_bytes: vec![],
        }
    }

    #[test]
    fn parse_rejects_truncated_input() {
        assert!(Transaction::parse(&[1]).is_err());
    }

    #[test]
    fn roundtrips_and_extracts_priority_from_compute_budget_instruction() {
        let tx = sample();
        let mut buf = vec![0u8; 512];
        let mut w = Writer::new(&mut buf);
        tx.write(&mut w).unwrap();
        let len = w.position();
        let parsed = Transaction::parse(&buf[..len]).unwrap();
        assert_eq!(parsed.priority(), 12_345);
        assert_eq!(parsed.fee_payer(), Some([1u8; 32]));
        assert_eq!(parsed.first_signature(), Some([0u8; 64]));
    }

    #[test]
    fn no_compute_budget_instruction_yields_zero_priority() {
        let mut tx = sample();
        tx.instructions.clear();
        let mut buf = vec![0u8; 512];
        let mut w = Writer::new(&mut buf);
        tx.write(&mut w).unwrap();
        let len = w.position();
        let parsed = Transaction::parse(&buf[..len]).unwrap();
        assert_eq!(parsed.priority(), 0);
    }
}
