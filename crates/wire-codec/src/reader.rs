use crate::error::{CodecError, Result};

/// A cursor over an immutable byte slice with exhaustive bounds checks.
///
/// Every `read_*` method either advances the cursor and returns the value, or
/// leaves the cursor untouched and returns `CodecError::InvalidData` /
/// `VarIntOverflow`. Callers never need to pre-check remaining length.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::InvalidData);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(b);
        Ok(arr)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// `u64`-length-prefixed byte vector (the default "bincode" Vec<u8> layout).
    pub fn read_len_prefixed_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u64()?;
        let len = usize::try_from(len).map_err(|_| CodecError::InvalidData)?;
        self.read_bytes(len)
    }

    /// Solana compact-u16: 1, 2, or 3 bytes depending on magnitude.
    pub fn read_compact_u16(&mut self) -> Result<u16> {
        let b0 = self.read_u8()?;
        if b0 & 0x80 == 0 {
            return Ok(b0 as u16);
        }
        let b1 = self.read_u8()?;
        if b1 & 0x80 == 0 {
            let v = ((b0 & 0x7F) as u16) | ((b1 as u16) << 7);
            return Ok(v);
        }
        let b2 = self.read_u8()?;
        let v = ((b0 & 0x7F) as u16) | (((b1 & 0x7F) as u16) << 7) | ((b2 as u16) << 14);
        Ok(v)
    }

    /// Standard 7-bit LEB128 varint, rejecting values that would overflow 64 bits.
    pub fn read_varint_u64(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 {
                return Err(CodecError::VarIntOverflow);
            }
            let low = (byte & 0x7F) as u64;
            if shift == 63 && low > 1 {
                // would overflow the top bit
                return Err(CodecError::VarIntOverflow);
            }
            result |= low.checked_shl(shift).ok_or(CodecError::VarIntOverflow)?;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Option discriminant: 1 byte, then the value if non-zero.
    pub fn read_option<T>(
        &mut self,
        read_value: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        let tag = self.read_u8()?;
        match tag {
            0 => Ok(None),
            1 => Ok(Some(read_value(self)?)),
            _ => Err(CodecError::InvalidData),
        }
    }
}
