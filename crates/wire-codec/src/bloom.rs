use crate::error::Result;
use crate::reader::Reader;
use crate::writer::Writer;

/// Gossip-form bloom filter bit vector: `has_bits` discriminant, optionally
/// followed by the word capacity, the words themselves, and the live bit
/// count; a missing bit vector is represented by `has_bits = 0` and a zero
/// bit count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomBits {
    pub words: Option<Vec<u64>>,
    pub bit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bloom {
    pub keys: Vec<u64>,
    pub bits: BloomBits,
    pub num_bits_set: u64,
}

impl Bloom {
    /// The canonical "accept everything" filter used by a light gossip
    /// member's pull requests: three arbitrary keys, one zeroed word, no set
    /// bits.
    pub fn accept_all() -> Self {
        Self {
            keys: vec![0x1, 0x2, 0x3],
            bits: BloomBits {
                words: Some(vec![0u64]),
                bit_count: 0,
            },
            num_bits_set: 0,
        }
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        w.write_u64(self.keys.len() as u64)?;
        for k in &self.keys {
            w.write_u64(*k)?;
        }
        match &self.bits.words {
            Some(words) => {
                w.write_u8(1)?;
                w.write_u64(words.len() as u64)?;
                for word in words {
                    w.write_u64(*word)?;
                }
                w.write_u64(self.bits.bit_count)?;
            }
            None => {
                w.write_u8(0)?;
                w.write_u64(0)?;
            }
        }
        w.write_u64(self.num_bits_set)
    }

    pub fn read(r: &mut Reader) -> Result<Self> {
        let keys_len = r.read_u64()? as usize;
        let mut keys = Vec::with_capacity(keys_len);
        for _ in 0..keys_len {
            keys.push(r.read_u64()?);
        }
        let has_bits = r.read_u8()?;
        let bits = if has_bits != 0 {
            let cap = r.read_u64()? as usize;
            let mut words = Vec::with_capacity(cap);
            for _ in 0..cap {
                words.push(r.read_u64()?);
            }
            let bit_count = r.read_u64()?;
            BloomBits {
                words: Some(words),
                bit_count,
            }
        } else {
            let bit_count = r.read_u64()?;
            BloomBits {
                words: None,
                bit_count,
            }
        };
        let num_bits_set = r.read_u64()?;
        Ok(Self {
            keys,
            bits,
            num_bits_set,
        })
    }

    pub fn wire_len(&self) -> usize {
        let words_len = match &self.bits.words {
            Some(words) => 8 + words.len() * 8 + 8,
            None => 8,
        };
        8 + self.keys.len() * 8 + 1 + words_len + 8
    }
}

/// CRDS filter: a bloom summary plus a mask identifying which shard of the
/// key space the filter covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdsFilter {
    pub bloom: Bloom,
    pub mask: u64,
    pub mask_bits: u32,
}

impl CrdsFilter {
    pub fn accept_all() -> Self {
        Self {
            bloom: Bloom::accept_all(),
            mask: u64::MAX,
            mask_bits: 0,
        }
    }

    pub fn write(&self, w: &mut Writer) -> Result<()> {
        self.bloom.write(w)?;
        w.write_u64(self.mask)?;
        w.write_u32(self.mask_bits)
    }

    pub fn read(r: &mut Reader) -> Result<Self> {
        let bloom = Bloom::read(r)?;
        let mask = r.read_u64()?;
        let mask_bits = r.read_u32()?;
        Ok(Self {
            bloom,
            mask,
            mask_bits,
        })
    }

    pub fn wire_len(&self) -> usize {
        self.bloom.wire_len() + 8 + 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_filter_matches_spec_scenario_2() {
        let f = CrdsFilter::accept_all();
        assert_eq!(f.bloom.keys.len(), 3);
        assert_eq!(f.bloom.bits.words, Some(vec![0]));
        assert_eq!(f.bloom.num_bits_set, 0);
        assert_eq!(f.mask, u64::MAX);
        assert_eq!(f.mask_bits, 0);
    }

    #[test]
    fn bloom_roundtrips_with_and_without_bits() {
        for bloom in [
            Bloom {
                keys: vec![1, 2, 3, 4],
                bits: BloomBits {
                    words: Some(vec![0xFF, 0x00]),
                    bit_count: 128,
                },
                num_bits_set: 7,
            },
            Bloom {
                keys: vec![],
                bits: BloomBits {
                    words: None,
                    bit_count: 0,
                },
                num_bits_set: 0,
            },
        ] {
            let mut buf = vec![0u8; 4096];
            let mut w = Writer::new(&mut buf);
            bloom.write(&mut w).unwrap();
            let len = w.position();
            assert_eq!(len, bloom.wire_len());
            let mut r = Reader::new(&buf[..len]);
            assert_eq!(Bloom::read(&mut r).unwrap(), bloom);
        }
    }
}
