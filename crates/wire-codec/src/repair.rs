use crate::error::Result;
use crate::reader::Reader;
use crate::types::{read_identity, write_identity, Identity, Signature};
use crate::writer::Writer;

pub const WINDOW_INDEX_REQUEST_TYPE: u32 = 8;

/// Signed shred-repair "window index" request: exactly 160 bytes. Bytes
/// `68..160` are the signable range; the signature itself occupies
/// `4..68`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowIndexRequest {
    pub signature: Signature,
    pub sender: Identity,
    pub recipient: Identity,
    pub timestamp_ms: u64,
    pub nonce: u32,
    pub slot: u64,
    pub shred_index: u64,
}

impl WindowIndexRequest {
    pub const WIRE_LEN: usize = 4 + 64 + 32 + 32 + 8 + 4 + 8 + 8;
    pub const SIGNATURE_RANGE: std::ops::Range<usize> = 4..68;
    pub const SIGNED_RANGE: std::ops::Range<usize> = 68..160;

    /// The bytes that must be signed: sender, recipient, timestamp, nonce,
    /// slot, and shred index — everything after the signature.
    pub fn signable_bytes(
        sender: &Identity,
        recipient: &Identity,
        timestamp_ms: u64,
        nonce: u32,
        slot: u64,
        shred_index: u64,
    ) -> Result<[u8; 92]> {
        let mut buf = [0u8; 92];
        let mut w = Writer::new(&mut buf);
        write_identity(&mut w, sender)?;
        write_identity(&mut w, recipient)?;
        w.write_u64(timestamp_ms)?;
        w.write_u32(nonce)?;
        w.write_u64(slot)?;
        w.write_u64(shred_index)?;
        Ok(buf)
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(WINDOW_INDEX_REQUEST_TYPE)?;
        w.write_bytes(&self.signature)?;
        write_identity(w, &self.sender)?;
        write_identity(w, &self.recipient)?;
        w.write_u64(self.timestamp_ms)?;
        w.write_u32(self.nonce)?;
        w.write_u64(self.slot)?;
        w.write_u64(self.shred_index)
    }

    pub fn read(r: &mut Reader) -> Result<Self> {
        let msg_type = r.read_u32()?;
        if msg_type != WINDOW_INDEX_REQUEST_TYPE {
            return Err(crate::error::CodecError::InvalidEnumTag);
        }
        let signature = r.read_array::<64>()?;
        let sender = read_identity(r)?;
        let recipient = read_identity(r)?;
        let timestamp_ms = r.read_u64()?;
        let nonce = r.read_u32()?;
        let slot = r.read_u64()?;
        let shred_index = r.read_u64()?;
        Ok(Self {
            signature,
            sender,
            recipient,
            timestamp_ms,
            nonce,
            slot,
            shred_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_index_request_is_160_bytes_with_signed_range_68_160() {
        let req = WindowIndexRequest {
            signature: [1u8; 64],
            sender: [2u8; 32],
            recipient: [3u8; 32],
            timestamp_ms: 1_000,
            nonce: 1_000,
            slot: 42,
            shred_index: 7,
        };
        let mut buf = vec![0u8; 256];
        let mut w = Writer::new(&mut buf);
        req.write(&mut w).unwrap();
        assert_eq!(w.position(), WindowIndexRequest::WIRE_LEN);
        assert_eq!(w.position(), 160);

        let signable =
            WindowIndexRequest::signable_bytes(&req.sender, &req.recipient, req.timestamp_ms, req.nonce, req.slot, req.shred_index)
                .unwrap();
        assert_eq!(&buf[68..160], &signable[..]);

        let mut r = Reader::new(&buf[..160]);
        let decoded = WindowIndexRequest::read(&mut r).unwrap();
        assert_eq!(decoded, req);
    }
}
