use crate::bloom::CrdsFilter;
use crate::crds_value::CrdsValue;
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::types::{read_identity, read_signature, write_identity, write_signature, Identity, Signature};
use crate::writer::Writer;

pub const TAG_PULL_REQUEST: u32 = 0;
pub const TAG_PULL_RESPONSE: u32 = 1;
pub const TAG_PUSH: u32 = 2;
pub const TAG_PRUNE: u32 = 3;
pub const TAG_PING: u32 = 4;
pub const TAG_PONG: u32 = 5;

pub const PING_TOKEN_OFFSET: usize = 4 + 32; // outer tag + originator identity

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    pub identity: Identity,
    pub token: [u8; 32],
    pub signature: Signature,
}

impl Ping {
    pub const WIRE_LEN: usize = 4 + 32 + 32 + 64;

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(TAG_PING)?;
        write_identity(w, &self.identity)?;
        w.write_bytes(&self.token)?;
        write_signature(w, &self.signature)
    }

    pub fn read_body(r: &mut Reader) -> Result<Self> {
        let identity = read_identity(r)?;
        let token = r.read_array::<32>()?;
        let signature = read_signature(r)?;
        Ok(Self {
            identity,
            token,
            signature,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    pub identity: Identity,
    pub hash: [u8; 32],
    pub signature: Signature,
}

impl Pong {
    pub const WIRE_LEN: usize = 4 + 32 + 32 + 64;

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(TAG_PONG)?;
        write_identity(w, &self.identity)?;
        w.write_bytes(&self.hash)?;
        write_signature(w, &self.signature)
    }

    pub fn read_body(r: &mut Reader) -> Result<Self> {
        let identity = read_identity(r)?;
        let hash = r.read_array::<32>()?;
        let signature = read_signature(r)?;
        Ok(Self {
            identity,
            hash,
            signature,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub filter: CrdsFilter,
    pub value: CrdsValue,
}

impl PullRequest {
    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(TAG_PULL_REQUEST)?;
        self.filter.write(w)?;
        self.value.write(w)
    }

    pub fn read_body(r: &mut Reader) -> Result<Self> {
        let filter = CrdsFilter::read(r)?;
        let value = CrdsValue::read(r)?;
        Ok(Self { filter, value })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdsValueList {
    pub sender: Identity,
    pub values: Vec<CrdsValue>,
}

impl CrdsValueList {
    fn write_with_tag(&self, w: &mut Writer, tag: u32) -> Result<()> {
        w.write_u32(tag)?;
        write_identity(w, &self.sender)?;
        w.write_u64(self.values.len() as u64)?;
        for v in &self.values {
            v.write(w)?;
        }
        Ok(())
    }

    pub fn write_push(&self, w: &mut Writer) -> Result<()> {
        self.write_with_tag(w, TAG_PUSH)
    }

    pub fn write_pull_response(&self, w: &mut Writer) -> Result<()> {
        self.write_with_tag(w, TAG_PULL_RESPONSE)
    }

    pub fn read_body(r: &mut Reader) -> Result<Self> {
        let sender = read_identity(r)?;
        let len = r.read_u64()? as usize;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(CrdsValue::read(r)?);
        }
        Ok(Self { sender, values })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prune {
    pub from: Identity,
    pub destination: Identity,
    pub prunes: Vec<Identity>,
    pub wallclock: u64,
    pub signature: Signature,
}

impl Prune {
    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(TAG_PRUNE)?;
        write_identity(w, &self.from)?;
        write_identity(w, &self.destination)?;
        w.write_u64(self.prunes.len() as u64)?;
        for p in &self.prunes {
            write_identity(w, p)?;
        }
        w.write_u64(self.wallclock)?;
        write_signature(w, &self.signature)
    }

    pub fn read_body(r: &mut Reader) -> Result<Self> {
        let from = read_identity(r)?;
        let destination = read_identity(r)?;
        let len = r.read_u64()? as usize;
        let mut prunes = Vec::with_capacity(len);
        for _ in 0..len {
            prunes.push(read_identity(r)?);
        }
        let wallclock = r.read_u64()?;
        let signature = read_signature(r)?;
        Ok(Self {
            from,
            destination,
            prunes,
            wallclock,
            signature,
        })
    }
}

/// The outer dispatch of every gossip datagram: a `u32` tag, then the
/// tag-specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GossipMessage {
    PullRequest(PullRequest),
    PullResponse(CrdsValueList),
    Push(CrdsValueList),
    Prune(Prune),
    Ping(Ping),
    Pong(Pong),
}

impl GossipMessage {
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let tag = r.read_u32()?;
        Ok(match tag {
            TAG_PULL_REQUEST => GossipMessage::PullRequest(PullRequest::read_body(&mut r)?),
            TAG_PULL_RESPONSE => GossipMessage::PullResponse(CrdsValueList::read_body(&mut r)?),
            TAG_PUSH => GossipMessage::Push(CrdsValueList::read_body(&mut r)?),
            TAG_PRUNE => GossipMessage::Prune(Prune::read_body(&mut r)?),
            TAG_PING => GossipMessage::Ping(Ping::read_body(&mut r)?),
            TAG_PONG => GossipMessage::Pong(Pong::read_body(&mut r)?),
            _ => return Err(CodecError::InvalidEnumTag),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds_value::{CrdsData, LegacyContactInfo};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    #[test]
    fn ping_and_pong_are_132_bytes() {
        let ping = Ping {
            identity: [1u8; 32],
            token: [2u8; 32],
            signature: [0u8; 64],
        };
        let mut buf = vec![0u8; 256];
        let mut w = Writer::new(&mut buf);
        ping.write(&mut w).unwrap();
        assert_eq!(w.position(), 132);
        assert_eq!(Ping::WIRE_LEN, 132);

        let pong = Pong {
            identity: [1u8; 32],
            hash: [3u8; 32],
            signature: [0u8; 64],
        };
        let mut buf2 = vec![0u8; 256];
        let mut w2 = Writer::new(&mut buf2);
        pong.write(&mut w2).unwrap();
        assert_eq!(w2.position(), 132);
    }

    #[test]
    fn pull_request_scenario_matches_spec_example_2() {
        let zero_sock = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 0);
        let legacy = LegacyContactInfo {
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
        let req = PullRequest {
            filter: CrdsFilter::accept_all(),
            value: CrdsValue {
                signature: [0u8; 64],
                data: CrdsData::LegacyContactInfo(legacy),
            },
        };
        let mut buf = vec![0u8; 4096];
        let mut w = Writer::new(&mut buf);
        req.write(&mut w).unwrap();
        assert_eq!(&buf[0..4], &[0, 0, 0, 0]);
        let parsed = GossipMessage::read(&buf[..w.position()]).unwrap();
        assert_eq!(parsed, GossipMessage::PullRequest(req));
    }

    #[test]
    fn unknown_outer_tag_is_rejected_not_panicking() {
        let bytes = 99u32.to_le_bytes();
        assert_eq!(GossipMessage::read(&bytes), Err(CodecError::InvalidEnumTag));
    }
}
