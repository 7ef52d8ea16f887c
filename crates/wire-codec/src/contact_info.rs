use std::net::{IpAddr, SocketAddr};

use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::types::{read_identity, write_identity, Identity};
use crate::writer::{compact_u16_len, varint_u64_len, Writer};

/// Socket role tags used by the modern contact-info socket-entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SocketTag {
    Gossip = 0,
    Repair = 1,
    Rpc = 2,
    RpcPubsub = 3,
    ServeRepair = 4,
    Tpu = 5,
    TpuForwards = 6,
    TpuForwardsQuic = 7,
    TpuQuic = 8,
    TpuVote = 9,
    Tvu = 10,
    TvuQuic = 11,
}

impl SocketTag {
    pub fn from_u8(v: u8) -> Option<Self> {
        use SocketTag::*;
        Some(match v {
            0 => Gossip,
            1 => Repair,
            2 => Rpc,
            3 => RpcPubsub,
            4 => ServeRepair,
            5 => Tpu,
            6 => TpuForwards,
            7 => TpuForwardsQuic,
            8 => TpuQuic,
            9 => TpuVote,
            10 => Tvu,
            11 => TvuQuic,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionRecord {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub commit: u32,
    pub feature_set: u32,
    pub client: u16,
}

/// The ten fixed-layout socket roles of `LegacyContactInfo`, in wire order.
pub const LEGACY_SOCKET_ORDER: [SocketTag; 10] = [
    SocketTag::Gossip,
    SocketTag::Tvu,
    SocketTag::Tvu, // tvu_forwards: legacy has no distinct tag; kept positional, see struct field.
    SocketTag::Repair,
    SocketTag::Tpu,
    SocketTag::TpuForwards,
    SocketTag::TpuVote,
    SocketTag::Rpc,
    SocketTag::RpcPubsub,
    SocketTag::ServeRepair,
];

/// `LegacyContactInfo`: identity, ten positional IPv4 socket addresses, then a
/// u64 wallclock and a u16 shred version. Field order is fixed and matches
/// `LEGACY_SOCKET_ORDER`'s role names (not its (reused) `SocketTag` values,
/// which only disambiguate repeated roles for documentation purposes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyContactInfo {
    pub identity: Identity,
    pub gossip: SocketAddr,
    pub tvu: SocketAddr,
    pub tvu_forwards: SocketAddr,
    pub repair: SocketAddr,
    pub tpu: SocketAddr,
    pub tpu_forwards: SocketAddr,
    pub tpu_vote: SocketAddr,
    pub rpc: SocketAddr,
    pub rpc_pubsub: SocketAddr,
    pub serve_repair: SocketAddr,
    pub wallclock: u64,
    pub shred_version: u16,
}

fn write_legacy_socket(w: &mut Writer, addr: &SocketAddr) -> Result<()> {
    let family: u32 = match addr.ip() {
        IpAddr::V4(_) => 0,
        IpAddr::V6(_) => 1,
    };
    w.write_u32(family)?;
    match addr.ip() {
        IpAddr::V4(v4) => w.write_bytes(&v4.octets())?,
        IpAddr::V6(_) => return Err(CodecError::InvalidData), // legacy wire form is IPv4-only
    }
    w.write_u16(addr.port())
}

fn read_legacy_socket(r: &mut Reader) -> Result<SocketAddr> {
    let family = r.read_u32()?;
    if family != 0 {
        return Err(CodecError::InvalidEnumTag);
    }
    let b = r.read_array::<4>()?;
    let port = r.read_u16()?;
    Ok(SocketAddr::new(
        IpAddr::V4(std::net::Ipv4Addr::new(b[0], b[1], b[2], b[3])),
        port,
    ))
}

impl LegacyContactInfo {
    pub fn write(&self, w: &mut Writer) -> Result<()> {
        write_identity(w, &self.identity)?;
        for addr in [
            &self.gossip,
            &self.tvu,
            &self.tvu_forwards,
            &self.repair,
            &self.tpu,
            &self.tpu_forwards,
            &self.tpu_vote,
            &self.rpc,
            &self.rpc_pubsub,
            &self.serve_repair,
        ] {
            write_legacy_socket(w, addr)?;
        }
        w.write_u64(self.wallclock)?;
        w.write_u16(self.shred_version)
    }

    pub fn read(r: &mut Reader) -> Result<Self> {
        let identity = read_identity(r)?;
        let gossip = read_legacy_socket(r)?;
        let tvu = read_legacy_socket(r)?;
        let tvu_forwards = read_legacy_socket(r)?;
        let repair = read_legacy_socket(r)?;
        let tpu = read_legacy_socket(r)?;
        let tpu_forwards = read_legacy_socket(r)?;
        let tpu_vote = read_legacy_socket(r)?;
        let rpc = read_legacy_socket(r)?;
        let rpc_pubsub = read_legacy_socket(r)?;
        let serve_repair = read_legacy_socket(r)?;
        let wallclock = r.read_u64()?;
        let shred_version = r.read_u16()?;
        Ok(Self {
            identity,
            gossip,
            tvu,
            tvu_forwards,
            repair,
            tpu,
            tpu_forwards,
            tpu_vote,
            rpc,
            rpc_pubsub,
            serve_repair,
            wallclock,
            shred_version,
        })
    }

    /// 32 (identity) + 10 * 10 (fixed socket slots) + 8 (wallclock) + 2
    /// (shred_version) = 142 bytes for IPv4. Derived arithmetically from the
    /// component sizes; see DESIGN.md for the 142-vs-152 discrepancy note.
    pub const WIRE_LEN_IPV4: usize = 32 + 10 * 10 + 8 + 2;
}

/// One entry in the modern contact-info socket-entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketEntry {
    pub tag: u8,
    pub addr_index: u8,
    pub port: u16,
}

/// `ContactInfo` (modern): deduplicated address table plus tagged,
/// delta-encoded socket entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub identity: Identity,
    pub wallclock_ms: u64,
    pub instance_creation_us: u64,
    pub shred_version: u16,
    pub version: VersionRecord,
    /// Per-role service address. A role absent from this map has no socket
    /// entry emitted for it.
    pub sockets: Vec<(SocketTag, SocketAddr)>,
}

impl ContactInfo {
    fn unique_addresses(&self) -> Vec<IpAddr> {
        let mut addrs: Vec<IpAddr> = Vec::new();
        for (_, addr) in &self.sockets {
            if !addrs.contains(&addr.ip()) {
                addrs.push(addr.ip());
            }
        }
        addrs
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        write_identity(w, &self.identity)?;
        w.write_varint_u64(self.wallclock_ms)?;
        w.write_u64(self.instance_creation_us)?;
        w.write_u16(self.shred_version)?;
        w.write_varint_u64(self.version.major as u64)?;
        w.write_varint_u64(self.version.minor as u64)?;
        w.write_varint_u64(self.version.patch as u64)?;
        w.write_u32(self.version.commit)?;
        w.write_u32(self.version.feature_set)?;
        w.write_varint_u64(self.version.client as u64)?;

        let addresses = self.unique_addresses();
        w.write_compact_u16(addresses.len() as u16)?;
        for ip in &addresses {
            let family: u32 = match ip {
                IpAddr::V4(_) => 0,
                IpAddr::V6(_) => 1,
            };
            w.write_u32(family)?;
            match ip {
                IpAddr::V4(v4) => w.write_bytes(&v4.octets())?,
                IpAddr::V6(v6) => w.write_bytes(&v6.octets())?,
            }
        }

        let mut entries: Vec<(u8, u8, u16)> = self
            .sockets
            .iter()
            .map(|(tag, addr)| {
                let addr_index = addresses.iter().position(|a| a == &addr.ip()).unwrap() as u8;
                (*tag as u8, addr_index, addr.port())
            })
            .collect();
        entries.sort_by_key(|(_, _, port)| *port);

        w.write_compact_u16(entries.len() as u16)?;
        let mut prev_port: u16 = 0;
        for (i, (tag, addr_index, port)) in entries.iter().enumerate() {
            let delta = if i == 0 { *port } else { port - prev_port };
            w.write_u8(*tag)?;
            w.write_u8(*addr_index)?;
            w.write_compact_u16(delta)?;
            prev_port = *port;
        }

        // Extensions: always empty in this core.
        w.write_compact_u16(0)
    }

    pub fn read(r: &mut Reader) -> Result<Self> {
        let identity = read_identity(r)?;
        let wallclock_ms = r.read_varint_u64()?;
        let instance_creation_us = r.read_u64()?;
        let shred_version = r.read_u16()?;
        let major = r.read_varint_u64()? as u16;
        let minor = r.read_varint_u64()? as u16;
        let patch = r.read_varint_u64()? as u16;
        let commit = r.read_u32()?;
        let feature_set = r.read_u32()?;
        let client = r.read_varint_u64()? as u16;

        let addr_count = r.read_compact_u16()?;
        let mut addresses = Vec::with_capacity(addr_count as usize);
        for _ in 0..addr_count {
            let family = r.read_u32()?;
            let ip = match family {
                0 => IpAddr::V4(std::net::Ipv4Addr::from(r.read_array::<4>()?)),
                1 => IpAddr::V6(std::net::Ipv6Addr::from(r.read_array::<16>()?)),
                _ => return Err(CodecError::InvalidEnumTag),
            };
            addresses.push(ip);
        }

        let socket_count = r.read_compact_u16()?;
        let mut sockets = Vec::with_capacity(socket_count as usize);
        let mut prev_port: u16 = 0;
        for i in 0..socket_count {
            let tag_byte = r.read_u8()?;
            let tag = SocketTag::from_u8(tag_byte).ok_or(CodecError::InvalidEnumTag)?;
            let addr_index = r.read_u8()?;
            let delta = r.read_compact_u16()?;
            let port = if i == 0 {
                delta
            } else {
                prev_port.checked_add(delta).ok_or(CodecError::InvalidData)?
            };
            prev_port = port;
            let ip = *addresses
                .get(addr_index as usize)
                .ok_or(CodecError::InvalidData)?;
            sockets.push((tag, SocketAddr::new(ip, port)));
        }

        // Extensions: compact-u16 count, 4 bytes each. Always decoded (to
        // keep offset tracking correct for callers chaining further reads)
        // even though this core only ever emits zero.
        let ext_count = r.read_compact_u16()?;
        for _ in 0..ext_count {
            let _ = r.read_array::<4>()?;
        }

        Ok(Self {
            identity,
            wallclock_ms,
            instance_creation_us,
            shred_version,
            version: VersionRecord {
                major,
                minor,
                patch,
                commit,
                feature_set,
                client,
            },
            sockets,
        })
    }

    /// Exact serialized length, matching the sum of component lengths.
    pub fn wire_len(&self) -> usize {
        let addresses = self.unique_addresses();
        let address_bytes: usize = addresses
            .iter()
            .map(|ip| 4 + if ip.is_ipv4() { 4 } else { 16 })
            .sum();

        let mut ports: Vec<u16> = self.sockets.iter().map(|(_, a)| a.port()).collect();
        ports.sort_unstable();
        let mut socket_bytes = 0usize;
        let mut prev_port: u16 = 0;
        for (i, port) in ports.iter().enumerate() {
            let delta = if i == 0 { *port } else { port - prev_port };
            socket_bytes += 1 + 1 + compact_u16_len(delta);
            prev_port = *port;
        }

        32 + varint_u64_len(self.wallclock_ms)
            + 8
            + 2
            + varint_u64_len(self.version.major as u64)
            + varint_u64_len(self.version.minor as u64)
            + varint_u64_len(self.version.patch as u64)
            + 4
            + 4
            + varint_u64_len(self.version.client as u64)
            + compact_u16_len(addresses.len() as u16)
            + address_bytes
            + compact_u16_len(self.sockets.len() as u16)
            + socket_bytes
            + compact_u16_len(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn sample() -> ContactInfo {
        ContactInfo {
            identity: [7u8; 32],
            wallclock_ms: 1_700_000_000_123,
            instance_creation_us: 42,
            shred_version: 9604,
            version: VersionRecord {
                major: 2,
                minor: 3,
                patch: 4,
                commit: 0xdeadbeef,
                feature_set: 0x1234,
                client: 1,
            },
            sockets: vec![
                (
                    SocketTag::Gossip,
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8001),
                ),
                (
                    SocketTag::Tpu,
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8003),
                ),
                (
                    SocketTag::Rpc,
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 8899),
                ),
            ],
        }
    }

    #[test]
    fn modern_contact_info_roundtrips() {
        let ci = sample();
        let mut buf = vec![0u8; 512];
        let mut w = Writer::new(&mut buf);
        ci.write(&mut w).unwrap();
        let len = w.position();
        let mut r = Reader::new(&buf[..len]);
        let decoded = ContactInfo::read(&mut r).unwrap();
        assert_eq!(decoded.identity, ci.identity);
        assert_eq!(decoded.wallclock_ms, ci.wallclock_ms);
        assert_eq!(decoded.shred_version, ci.shred_version);
        assert_eq!(decoded.version, ci.version);
        let mut expected = ci.sockets.clone();
        expected.sort_by_key(|(_, a)| a.port());
        let mut got = decoded.sockets.clone();
        got.sort_by_key(|(_, a)| a.port());
        assert_eq!(got, expected);
        assert_eq!(r.position(), len);
    }

    #[test]
    fn legacy_contact_info_is_142_bytes_ipv4() {
        let zero_sock = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 0);
        let ci = LegacyContactInfo {
            identity: [0u8; 32],
            gossip: zero_sock,
            tvu: zero_sock,
            tvu_forwards: zero_sock,
            repair: zero_sock,
            tpu: zero_sock,
            tpu_forwards: zero_sock,
            tpu_vote: zero_sock,
            rpc: zero_sock,
            rpc_pubsub: zero_sock,
            serve_repair: zero_sock,
            wallclock: 0,
            shred_version: 0,
        };
        let mut buf = vec![0u8; 256];
        let mut w = Writer::new(&mut buf);
        ci.write(&mut w).unwrap();
        assert_eq!(w.position(), LegacyContactInfo::WIRE_LEN_IPV4);
        assert_eq!(w.position(), 142);
    }
}
