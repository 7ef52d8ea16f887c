use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::writer::Writer;

/// 32-byte ed25519 public key. Fixed-width, no length prefix.
pub type Identity = [u8; 32];
/// 64-byte ed25519 signature. Fixed-width, no length prefix.
pub type Signature = [u8; 64];
/// 32-byte hash (SHA-256 in this codec). Fixed-width, no length prefix.
pub type Hash = [u8; 32];

pub fn read_identity(r: &mut Reader) -> Result<Identity> {
    r.read_array::<32>()
}

pub fn write_identity(w: &mut Writer, id: &Identity) -> Result<()> {
    w.write_bytes(id)
}

pub fn read_signature(r: &mut Reader) -> Result<Signature> {
    r.read_array::<64>()
}

pub fn write_signature(w: &mut Writer, sig: &Signature) -> Result<()> {
    w.write_bytes(sig)
}

pub fn read_hash(r: &mut Reader) -> Result<Hash> {
    r.read_array::<32>()
}

pub fn write_hash(w: &mut Writer, h: &Hash) -> Result<()> {
    w.write_bytes(h)
}

/// A tagged socket address: 4-byte little-endian family discriminant (0 =
/// IPv4, 1 = IPv6), then 4 or 16 address bytes, then a 2-byte port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl SocketAddress {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn family_discriminant(&self) -> u32 {
        match self.ip {
            IpAddr::V4(_) => 0,
            IpAddr::V6(_) => 1,
        }
    }

    /// Total encoded length: 4 (family) + 4 or 16 (address) + 2 (port).
    pub fn wire_len(&self) -> usize {
        4 + match self.ip {
            IpAddr::V4(_) => 4,
            IpAddr::V6(_) => 16,
        } + 2
    }
}

pub fn read_socket_address(r: &mut Reader) -> Result<SocketAddress> {
    let family = r.read_u32()?;
    let ip = match family {
        0 => {
            let b = r.read_array::<4>()?;
            IpAddr::V4(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        1 => {
            let b = r.read_array::<16>()?;
            IpAddr::V6(Ipv6Addr::from(b))
        }
        _ => return Err(CodecError::InvalidEnumTag),
    };
    let port = r.read_u16()?;
    Ok(SocketAddress { ip, port })
}

pub fn write_socket_address(w: &mut Writer, addr: &SocketAddress) -> Result<()> {
    w.write_u32(addr.family_discriminant())?;
    match addr.ip {
        IpAddr::V4(v4) => w.write_bytes(&v4.octets())?,
        IpAddr::V6(v6) => w.write_bytes(&v6.octets())?,
    }
    w.write_u16(addr.port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_socket_address_is_ten_bytes_exactly() {
        let addr = SocketAddress::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)), 8001);
        let mut buf = [0u8; 10];
        let mut w = Writer::new(&mut buf);
        write_socket_address(&mut w, &addr).unwrap();
        assert_eq!(w.position(), 10);
        assert_eq!(
            buf,
            [0x00, 0x00, 0x00, 0x00, 0xC0, 0xA8, 0x01, 0x64, 0x41, 0x1F]
        );
    }

    #[test]
    fn socket_address_roundtrip_ipv6() {
        let addr = SocketAddress::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        let mut buf = [0u8; 22];
        let mut w = Writer::new(&mut buf);
        write_socket_address(&mut w, &addr).unwrap();
        let mut r = Reader::new(&buf);
        let decoded = read_socket_address(&mut r).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn buffer_too_small_never_panics() {
        let addr = SocketAddress::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 1);
        let mut buf = [0u8; 3];
        let mut w = Writer::new(&mut buf);
        assert_eq!(
            write_socket_address(&mut w, &addr),
            Err(CodecError::BufferTooSmall)
        );
    }
}
