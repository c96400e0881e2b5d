use bytemuck::Pod;

use crate::error::SerdeErr;

/// Cursor over a received byte buffer.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    position: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        if count > self.remaining() {
            return Err(SerdeErr::UnexpectedEof {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..self.position])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let mut output = [0u8; N];
        output.copy_from_slice(self.read_bytes(N)?);
        Ok(output)
    }

    pub fn read_length(&mut self) -> Result<usize, SerdeErr> {
        let length = u32::from_le_bytes(self.read_array::<4>()?);
        Ok(length as usize)
    }

    /// Reads a length-prefixed run of plain-old-data. The copy goes through a
    /// zeroed, properly aligned buffer since the source offset has no alignment.
    pub fn read_pod_vec<T: Pod>(&mut self) -> Result<Vec<T>, SerdeErr> {
        let count = self.read_length()?;
        let element_size = std::mem::size_of::<T>();
        let byte_count = count
            .checked_mul(element_size)
            .ok_or(SerdeErr::LengthOverflow { length: count })?;
        let bytes = self.read_bytes(byte_count)?;

        let mut output = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut output).copy_from_slice(bytes);
        Ok(output)
    }
}
