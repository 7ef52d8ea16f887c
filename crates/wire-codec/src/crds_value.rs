use crate::contact_info::{ContactInfo, LegacyContactInfo};
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::types::{read_hash, read_identity, write_hash, write_identity, Hash, Identity};
use crate::writer::Writer;

macro_rules! fixed_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $ty,)*
        }
    };
}

fixed_struct!(Vote { from: Identity, transaction: Vec<u8>, wallclock: u64 });
fixed_struct!(LowestSlot { from: Identity, root: u64, lowest: u64, slots: Vec<u64>, wallclock: u64 });
fixed_struct!(HashEntry { slot: u64, hash: Hash });
fixed_struct!(LegacySnapshotHashes { from: Identity, hashes: Vec<HashEntry>, wallclock: u64 });
fixed_struct!(AccountsHashes { from: Identity, hashes: Vec<HashEntry>, wallclock: u64 });
fixed_struct!(EpochSlots { from: Identity, index: u8, wallclock: u64, compressed_slots: Vec<u8> });
fixed_struct!(LegacyVersion { from: Identity, wallclock: u64, major: u16, minor: u16, patch: u16 });
fixed_struct!(Version { from: Identity, wallclock: u64, major: u16, minor: u16, patch: u16, commit: u32 });
fixed_struct!(NodeInstance { from: Identity, wallclock: u64, timestamp: u64, token: u64 });
fixed_struct!(DuplicateShred {
    from: Identity,
    wallclock: u64,
    slot: u64,
    shred_index: u32,
    shred_type: u8,
    num_chunks: u8,
    chunk_index: u8,
    chunk: Vec<u8>,
});
fixed_struct!(SnapshotHashes {
    from: Identity,
    full_slot: u64,
    full_hash: Hash,
    incremental: Vec<HashEntry>,
    wallclock: u64,
});
fixed_struct!(RestartLastVotedForkSlots {
    from: Identity,
    wallclock: u64,
    last_voted_slot: u64,
    last_voted_hash: Hash,
    shred_version: u16,
    offsets: Vec<u8>,
});
fixed_struct!(RestartHeaviestFork {
    from: Identity,
    wallclock: u64,
    last_slot: u64,
    last_slot_hash: Hash,
    observed_stake: u64,
    shred_version: u16,
});

fn write_hash_entries(w: &mut Writer, entries: &[HashEntry]) -> Result<()> {
    w.write_u64(entries.len() as u64)?;
    for e in entries {
        w.write_u64(e.slot)?;
        write_hash(w, &e.hash)?;
    }
    Ok(())
}

fn read_hash_entries(r: &mut Reader) -> Result<Vec<HashEntry>> {
    let len = r.read_u64()? as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        let slot = r.read_u64()?;
        let hash = read_hash(r)?;
        out.push(HashEntry { slot, hash });
    }
    Ok(out)
}

/// Every recognized CRDS payload variant, tagged 0..13 per the wire format.
/// Each arm implements `wallclock()` / `identity()` uniformly so CrdsTable
/// can compare across variants without matching on the tag again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrdsData {
    LegacyContactInfo(LegacyContactInfo),
    Vote(Vote),
    LowestSlot(LowestSlot),
    LegacySnapshotHashes(LegacySnapshotHashes),
    AccountsHashes(AccountsHashes),
    EpochSlots(EpochSlots),
    LegacyVersion(LegacyVersion),
    Version(Version),
    NodeInstance(NodeInstance),
    DuplicateShred(DuplicateShred),
    SnapshotHashes(SnapshotHashes),
    ContactInfo(ContactInfo),
    RestartLastVotedForkSlots(RestartLastVotedForkSlots),
    RestartHeaviestFork(RestartHeaviestFork),
}

impl CrdsData {
    pub fn variant_tag(&self) -> u32 {
        match self {
            CrdsData::LegacyContactInfo(_) => 0,
            CrdsData::Vote(_) => 1,
            CrdsData::LowestSlot(_) => 2,
            CrdsData::LegacySnapshotHashes(_) => 3,
            CrdsData::AccountsHashes(_) => 4,
            CrdsData::EpochSlots(_) => 5,
            CrdsData::LegacyVersion(_) => 6,
            CrdsData::Version(_) => 7,
            CrdsData::NodeInstance(_) => 8,
            CrdsData::DuplicateShred(_) => 9,
            CrdsData::SnapshotHashes(_) => 10,
            CrdsData::ContactInfo(_) => 11,
            CrdsData::RestartLastVotedForkSlots(_) => 12,
            CrdsData::RestartHeaviestFork(_) => 13,
        }
    }

    pub fn wallclock(&self) -> u64 {
        match self {
            CrdsData::LegacyContactInfo(v) => v.wallclock,
            CrdsData::Vote(v) => v.wallclock,
            CrdsData::LowestSlot(v) => v.wallclock,
            CrdsData::LegacySnapshotHashes(v) => v.wallclock,
            CrdsData::AccountsHashes(v) => v.wallclock,
            CrdsData::EpochSlots(v) => v.wallclock,
            CrdsData::LegacyVersion(v) => v.wallclock,
            CrdsData::Version(v) => v.wallclock,
            CrdsData::NodeInstance(v) => v.wallclock,
            CrdsData::DuplicateShred(v) => v.wallclock,
            CrdsData::SnapshotHashes(v) => v.wallclock,
            CrdsData::ContactInfo(v) => v.wallclock_ms,
            CrdsData::RestartLastVotedForkSlots(v) => v.wallclock,
            CrdsData::RestartHeaviestFork(v) => v.wallclock,
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            CrdsData::LegacyContactInfo(v) => v.identity,
            CrdsData::Vote(v) => v.from,
            CrdsData::LowestSlot(v) => v.from,
            CrdsData::LegacySnapshotHashes(v) => v.from,
            CrdsData::AccountsHashes(v) => v.from,
            CrdsData::EpochSlots(v) => v.from,
            CrdsData::LegacyVersion(v) => v.from,
            CrdsData::Version(v) => v.from,
            CrdsData::NodeInstance(v) => v.from,
            CrdsData::DuplicateShred(v) => v.from,
            CrdsData::SnapshotHashes(v) => v.from,
            CrdsData::ContactInfo(v) => v.identity,
            CrdsData::RestartLastVotedForkSlots(v) => v.from,
            CrdsData::RestartHeaviestFork(v) => v.from,
        }
    }

    pub fn write_payload(&self, w: &mut Writer) -> Result<()> {
        match self {
            CrdsData::LegacyContactInfo(v) => v.write(w),
            CrdsData::Vote(v) => {
                write_identity(w, &v.from)?;
                w.write_len_prefixed_bytes(&v.transaction)?;
                w.write_u64(v.wallclock)
            }
            CrdsData::LowestSlot(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.root)?;
                w.write_u64(v.lowest)?;
                w.write_u64(v.slots.len() as u64)?;
                for s in &v.slots {
                    w.write_u64(*s)?;
                }
                w.write_u64(v.wallclock)
            }
            CrdsData::LegacySnapshotHashes(v) => {
                write_identity(w, &v.from)?;
                write_hash_entries(w, &v.hashes)?;
                w.write_u64(v.wallclock)
            }
            CrdsData::AccountsHashes(v) => {
                write_identity(w, &v.from)?;
                write_hash_entries(w, &v.hashes)?;
                w.write_u64(v.wallclock)
            }
            CrdsData::EpochSlots(v) => {
                write_identity(w, &v.from)?;
                w.write_u8(v.index)?;
                w.write_u64(v.wallclock)?;
                w.write_len_prefixed_bytes(&v.compressed_slots)
            }
            CrdsData::LegacyVersion(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u16(v.major)?;
                w.write_u16(v.minor)?;
                w.write_u16(v.patch)
            }
            CrdsData::Version(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u16(v.major)?;
                w.write_u16(v.minor)?;
                w.write_u16(v.patch)?;
                w.write_u32(v.commit)
            }
            CrdsData::NodeInstance(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u64(v.timestamp)?;
                w.write_u64(v.token)
            }
            CrdsData::DuplicateShred(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u64(v.slot)?;
                w.write_u32(v.shred_index)?;
                w.write_u8(v.shred_type)?;
                w.write_u8(v.num_chunks)?;
                w.write_u8(v.chunk_index)?;
                w.write_len_prefixed_bytes(&v.chunk)
            }
            CrdsData::SnapshotHashes(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.full_slot)?;
                write_hash(w, &v.full_hash)?;
                write_hash_entries(w, &v.incremental)?;
                w.write_u64(v.wallclock)
            }
            CrdsData::ContactInfo(v) => v.write(w),
            CrdsData::RestartLastVotedForkSlots(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u64(v.last_voted_slot)?;
                write_hash(w, &v.last_voted_hash)?;
                w.write_u16(v.shred_version)?;
                w.write_len_prefixed_bytes(&v.offsets)
            }
            CrdsData::RestartHeaviestFork(v) => {
                write_identity(w, &v.from)?;
                w.write_u64(v.wallclock)?;
                w.write_u64(v.last_slot)?;
                write_hash(w, &v.last_slot_hash)?;
                w.write_u64(v.observed_stake)?;
                w.write_u16(v.shred_version)
            }
        }
    }

    pub fn read_payload(tag: u32, r: &mut Reader) -> Result<Self> {
        Ok(match tag {
            0 => CrdsData::LegacyContactInfo(LegacyContactInfo::read(r)?),
            1 => CrdsData::Vote(Vote {
                from: read_identity(r)?,
                transaction: r.read_len_prefixed_bytes()?,
                wallclock: r.read_u64()?,
            }),
            2 => {
                let from = read_identity(r)?;
                let root = r.read_u64()?;
                let lowest = r.read_u64()?;
                let slots_len = r.read_u64()? as usize;
                let mut slots = Vec::with_capacity(slots_len);
                for _ in 0..slots_len {
                    slots.push(r.read_u64()?);
                }
                let wallclock = r.read_u64()?;
                CrdsData::LowestSlot(LowestSlot {
                    from,
                    root,
                    lowest,
                    slots,
                    wallclock,
                })
            }
            3 => CrdsData::LegacySnapshotHashes(LegacySnapshotHashes {
                from: read_identity(r)?,
                hashes: read_hash_entries(r)?,
                wallclock: r.read_u64()?,
            }),
            4 => CrdsData::AccountsHashes(AccountsHashes {
                from: read_identity(r)?,
                hashes: read_hash_entries(r)?,
                wallclock: r.read_u64()?,
            }),
            5 => {
                let from = read_identity(r)?;
                let index = r.read_u8()?;
                let wallclock = r.read_u64()?;
                let compressed_slots = r.read_len_prefixed_bytes()?;
                CrdsData::EpochSlots(EpochSlots {
                    from,
                    index,
                    wallclock,
                    compressed_slots,
                })
            }
            6 => {
                let from = read_identity(r)?;
                let wallclock = r.read_u64()?;
                let major = r.read_u16()?;
                let minor = r.read_u16()?;
                let patch = r.read_u16()?;
                CrdsData::LegacyVersion(LegacyVersion {
                    from,
                    wallclock,
                    major,
                    minor,
                    patch,
                })
            }
            7 => {
                let from = read_identity(r)?;
                let wallclock = r.read_u64()?;
                let major = r.read_u16()?;
                let minor = r.read_u16()?;
                let patch = r.read_u16()?;
                let commit = r.read_u32()?;
                CrdsData::Version(Version {
                    from,
                    wallclock,
                    major,
                    minor,
                    patch,
                    commit,
                })
            }
            8 => CrdsData::NodeInstance(NodeInstance {
                from: read_identity(r)?,
                wallclock: r.read_u64()?,
                timestamp: r.read_u64()?,
                token: r.read_u64()?,
            }),
            9 => {
                let from = read_identity(r)?;
                let wallclock = r.read_u64()?;
                let slot = r.read_u64()?;
                let shred_index = r.read_u32()?;
                let shred_type = r.read_u8()?;
                let num_chunks = r.read_u8()?;
                let chunk_index = r.read_u8()?;
                let chunk = r.read_len_prefixed_bytes()?;
                CrdsData::DuplicateShred(DuplicateShred {
                    from,
                    wallclock,
                    slot,
                    shred_index,
                    shred_type,
                    num_chunks,
                    chunk_index,
                    chunk,
                })
            }
            10 => {
                let from = read_identity(r)?;
                let full_slot = r.read_u64()?;
                let full_hash = read_hash(r)?;
                let incremental = read_hash_entries(r)?;
                let wallclock = r.read_u64()?;
                CrdsData::SnapshotHashes(SnapshotHashes {
                    from,
                    full_slot,
                    full_hash,
                    incremental,
                    wallclock,
                })
            }
            11 => CrdsData::ContactInfo(ContactInfo::read(r)?),
            12 => {
                let from = read_identity(r)?;
                let wallclock = r.read_u64()?;
                let last_voted_slot = r.read_u64()?;
                let last_voted_hash = read_hash(r)?;
                let shred_version = r.read_u16()?;
                let offsets = r.read_len_prefixed_bytes()?;
                CrdsData::RestartLastVotedForkSlots(RestartLastVotedForkSlots {
                    from,
                    wallclock,
                    last_voted_slot,
                    last_voted_hash,
                    shred_version,
                    offsets,
                })
            }
            13 => {
                let from = read_identity(r)?;
                let wallclock = r.read_u64()?;
                let last_slot = r.read_u64()?;
                let last_slot_hash = read_hash(r)?;
                let observed_stake = r.read_u64()?;
                let shred_version = r.read_u16()?;
                CrdsData::RestartHeaviestFork(RestartHeaviestFork {
                    from,
                    wallclock,
                    last_slot,
                    last_slot_hash,
                    observed_stake,
                    shred_version,
                })
            }
            _ => return Err(CodecError::InvalidEnumTag),
        })
    }
}

/// The signed envelope carried in push/pull/pull-response messages:
/// `signature[64] ++ variant_tag:u32 ++ payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdsValue {
    pub signature: [u8; 64],
    pub data: CrdsData,
}

impl CrdsValue {
    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_bytes(&self.signature)?;
        w.write_u32(self.data.variant_tag())?;
        self.data.write_payload(w)
    }

    /// Parses one CRDS value starting at the reader's current position. The
    /// reader is advanced by exactly the variant's real serialized length —
    /// this is what lets callers iterate a vector of values without a
    /// separate length table.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let signature = r.read_array::<64>()?;
        let tag = r.read_u32()?;
        let data = CrdsData::read_payload(tag, r)?;
        Ok(Self { signature, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact_info::VersionRecord;

    #[test]
    fn duplicate_shred_roundtrips_and_advances_exactly() {
        let value = CrdsValue {
            signature: [9u8; 64],
            data: CrdsData::DuplicateShred(DuplicateShred {
                from: [1u8; 32],
                wallclock: 123,
                slot: 55,
                shred_index: 2,
                shred_type: 1,
                num_chunks: 3,
                chunk_index: 0,
                chunk: vec![1, 2, 3, 4, 5],
            }),
        };
        let mut buf = vec![0u8; 4096];
        let mut w = Writer::new(&mut buf);
        value.write(&mut w).unwrap();
        let len = w.position();

        // Two values back to back: parsing the first must not consume any of
        // the second's bytes.
        let mut doubled = buf[..len].to_vec();
        doubled.extend_from_slice(&buf[..len]);
        let mut r = Reader::new(&doubled);
        let first = CrdsValue::read(&mut r).unwrap();
        assert_eq!(r.position(), len);
        let second = CrdsValue::read(&mut r).unwrap();
        assert_eq!(first, value);
        assert_eq!(second, value);
        assert_eq!(r.position(), len * 2);
    }

    #[test]
    fn contact_info_variant_wallclock_and_identity_accessors() {
        let ci = ContactInfo {
            identity: [3u8; 32],
            wallclock_ms: 777,
            instance_creation_us: 1,
            shred_version: 1,
            version: VersionRecord::default(),
            sockets: vec![],
        };
        let data = CrdsData::ContactInfo(ci.clone());
        assert_eq!(data.wallclock(), 777);
        assert_eq!(data.identity(), [3u8; 32]);
        assert_eq!(data.variant_tag(), 11);
    }
}
