use bytemuck::Pod;

/// A growable little-endian writer. Unlike a fixed MTU-sized packet buffer it
/// can hold whole scenes, so mesh payloads never need to be fragmented.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Reuses an existing allocation, clearing its contents first.
    pub fn from_buffer(mut buffer: Vec<u8>) -> Self {
        buffer.clear();
        Self { buffer }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a `u32` length prefix. Lengths beyond `u32::MAX` are a caller
    /// error and saturate, which the reader will then reject as truncated.
    pub fn write_length(&mut self, length: usize) {
        let length = u32::try_from(length).unwrap_or(u32::MAX);
        self.write_bytes(&length.to_le_bytes());
    }

    /// Dumps a slice of plain-old-data as its raw bytes, prefixed by the element count.
    pub fn write_pod_slice<T: Pod>(&mut self, values: &[T]) {
        self.write_length(values.len());
        self.write_bytes(bytemuck::cast_slice(values));
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}
