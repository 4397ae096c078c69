use crate::rdb::RdbError;

#[derive(Debug, PartialEq)]
pub(crate) enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

/// A forward-only cursor over the bytes of a snapshot.
#[derive(Debug)]
pub(crate) struct RdbReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> RdbReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], RdbError> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(RdbError::UnexpectedEof(self.cursor))?;

        let slice = &self.bytes[self.cursor..end];
        self.cursor = end;

        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, RdbError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], RdbError> {
        let position = self.cursor;

        self.read_bytes(N)?
            .try_into()
            .map_err(|_| RdbError::UnexpectedEof(position))
    }

    /// Reads a length-encoded header. The two most significant bits of the
    /// first byte select the form:
    ///
    /// * `00` - length in the remaining 6 bits
    /// * `01` - 14-bit length, 6 bits here plus the next byte
    /// * `10` - 32-bit (`0x80`) or 64-bit (`0x81`) big-endian length
    /// * `11` - a special string encoding named by the remaining 6 bits
    pub fn read_encoding(&mut self) -> Result<ValueEncoding, RdbError> {
        let byte = self.read_u8()?;

        match byte >> 6 {
            0b00 => Ok(ValueEncoding::Length((byte & 0b0011_1111) as usize)),
            0b01 => {
                let high_6_bits = ((byte & 0b0011_1111) as usize) << 8;
                let lower_8_bits = self.read_u8()? as usize;

                Ok(ValueEncoding::Length(high_6_bits | lower_8_bits))
            }
            _ if byte == 0x80 => Ok(ValueEncoding::Length(
                u32::from_be_bytes(self.read_array()?) as usize,
            )),
            _ if byte == 0x81 => Ok(ValueEncoding::Length(
                u64::from_be_bytes(self.read_array()?) as usize,
            )),
            0b11 => match byte & 0b0011_1111 {
                0 => Ok(ValueEncoding::Int8),
                1 => Ok(ValueEncoding::Int16),
                2 => Ok(ValueEncoding::Int32),
                3 => Ok(ValueEncoding::LzfCompressedString),
                _ => Err(RdbError::InvalidLengthEncoding(byte)),
            },
            _ => Err(RdbError::InvalidLengthEncoding(byte)),
        }
    }

    /// Reads a plain length, as used by database selectors and resize hints.
    pub fn read_length(&mut self) -> Result<usize, RdbError> {
        let position = self.cursor;

        match self.read_encoding()? {
            ValueEncoding::Length(length) => Ok(length),
            _ => Err(RdbError::InvalidLengthEncoding(self.bytes[position])),
        }
    }

    /// Reads a string, rendering integer-encoded strings in decimal.
    pub fn read_string(&mut self) -> Result<String, RdbError> {
        match self.read_encoding()? {
            ValueEncoding::Length(length) => {
                Ok(String::from_utf8_lossy(self.read_bytes(length)?).into_owned())
            }
            ValueEncoding::Int8 => Ok((self.read_u8()? as i8).to_string()),
            ValueEncoding::Int16 => Ok(i16::from_le_bytes(self.read_array()?).to_string()),
            ValueEncoding::Int32 => Ok(i32::from_le_bytes(self.read_array()?).to_string()),
            ValueEncoding::LzfCompressedString => Err(RdbError::CompressedString),
        }
    }
}
