use std::net::SocketAddr;

/// Default maximum payload: the largest UDP datagram a cluster peer will
/// accept without fragmentation risk.
pub const PACKET_DATA_SIZE: usize = 1232;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketFlags {
    pub staked: bool,
    pub tracer: bool,
    pub discard: bool,
    pub forwarded: bool,
    pub repair: bool,
}

/// One received or to-be-sent datagram. Owned by its batch; buffers are
/// released (and may be reused) when the batch is cleared.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    bytes: [u8; PACKET_DATA_SIZE],
    len: usize,
    pub src_addr: SocketAddr,
    pub timestamp_us: u64,
    pub flags: PacketFlags,
}

impl PacketBuffer {
    pub fn empty(src_addr: SocketAddr) -> Self {
        Self {
            bytes: [0u8; PACKET_DATA_SIZE],
            len: 0,
            src_addr,
            timestamp_us: 0,
            flags: PacketFlags::default(),
        }
    }

    /// Builds a packet from payload bytes, silently truncating to
    /// `PACKET_DATA_SIZE` (the fabric never grows a buffer past the wire
    /// limit; callers that need more must fragment at a higher layer).
    pub fn from_slice(data: &[u8], src_addr: SocketAddr, timestamp_us: u64) -> Self {
        let len = data.len().min(PACKET_DATA_SIZE);
        let mut bytes = [0u8; PACKET_DATA_SIZE];
        bytes[..len].copy_from_slice(&data[..len]);
        Self {
            bytes,
            len,
            src_addr,
            timestamp_us,
            flags: PacketFlags::default(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(PACKET_DATA_SIZE);
    }

    pub fn capacity_mut(&mut self) -> &mut [u8; PACKET_DATA_SIZE] {
        &mut self.bytes
    }
}
