use std::net::{SocketAddr, UdpSocket};

use crate::backend::{BackendKind, FabricBackend};
use crate::error::FabricError;
use crate::packet::PacketBuffer;

/// Simple per-socket non-blocking receive loop. Returns as soon as the
/// kernel yields `WouldBlock` rather than looping until a full batch fills.
pub struct PortableBackend {
    socket: UdpSocket,
}

impl PortableBackend {
    pub fn bind(addr: SocketAddr) -> Result<Self, FabricError> {
        let socket = UdpSocket::bind(addr).map_err(FabricError::BindFailed)?;
        socket.set_nonblocking(true).map_err(FabricError::BindFailed)?;
        Ok(Self { socket })
    }
}

impl FabricBackend for PortableBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Portable
    }

    fn recv_batch(&mut self, out: &mut Vec<PacketBuffer>, max: usize) -> Result<usize, FabricError> {
        let mut buf = [0u8; crate::packet::PACKET_DATA_SIZE];
        let mut received = 0;
        while received < max {
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => {
                    let ts = crate::now_micros();
                    out.push(PacketBuffer::from_slice(&buf[..len], src, ts));
                    received += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(FabricError::Custom(e.to_string())),
            }
        }
        Ok(received)
    }

    fn send_batch(&mut self, packets: &[PacketBuffer], dst: SocketAddr) -> Result<usize, FabricError> {
        let mut sent = 0;
        for packet in packets {
            match self.socket.send_to(packet.payload(), dst) {
                Ok(_) => sent += 1,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(FabricError::Custom(e.to_string())),
            }
        }
        Ok(sent)
    }

    fn close(&mut self) {}
}
