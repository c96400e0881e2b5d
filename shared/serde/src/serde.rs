use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

/// A type that can be written to and read back from the wire
pub trait Serde: Sized {
    /// Writes the value into the given writer
    fn ser(&self, writer: &mut ByteWriter);

    /// Reads a value back out of the given reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;

    /// Number of bytes `ser` will write
    fn byte_length(&self) -> usize;
}

/// Implemented by types whose encoded size never varies
pub trait ConstByteLength {
    const BYTE_LENGTH: usize;
}

macro_rules! impl_serde_for_number {
    ($($t:ty),*) => {$(
        impl Serde for $t {
            fn ser(&self, writer: &mut ByteWriter) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                Ok(<$t>::from_le_bytes(reader.read_array()?))
            }

            fn byte_length(&self) -> usize {
                <Self as ConstByteLength>::BYTE_LENGTH
            }
        }

        impl ConstByteLength for $t {
            const BYTE_LENGTH: usize = std::mem::size_of::<$t>();
        }
    )*};
}

impl_serde_for_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_byte()? != 0)
    }

    fn byte_length(&self) -> usize {
        1
    }
}

impl ConstByteLength for bool {
    const BYTE_LENGTH: usize = 1;
}

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_length(self.len());
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = reader.read_length()?;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidUtf8)
    }

    fn byte_length(&self) -> usize {
        4 + self.len()
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_length(self.len());
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = reader.read_length()?;
        // don't trust the prefix for the allocation, a short buffer fails below anyway
        let mut output = Vec::with_capacity(length.min(reader.remaining()));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn byte_length(&self) -> usize {
        4 + self.iter().map(Serde::byte_length).sum::<usize>()
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => false.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn byte_length(&self) -> usize {
        1 + self.as_ref().map_or(0, Serde::byte_length)
    }
}

// Math

macro_rules! impl_serde_for_float_array {
    ($t:ty, $n:literal, $to:ident, $from:ident) => {
        impl Serde for $t {
            fn ser(&self, writer: &mut ByteWriter) {
                for component in self.$to() {
                    component.ser(writer);
                }
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let mut components = [0.0f32; $n];
                for component in components.iter_mut() {
                    *component = f32::de(reader)?;
                }
                Ok(<$t>::$from(&components))
            }

            fn byte_length(&self) -> usize {
                <Self as ConstByteLength>::BYTE_LENGTH
            }
        }

        impl ConstByteLength for $t {
            const BYTE_LENGTH: usize = $n * 4;
        }
    };
}

impl_serde_for_float_array!(Vec2, 2, to_array, from_slice);
impl_serde_for_float_array!(Vec3, 3, to_array, from_slice);
impl_serde_for_float_array!(Vec4, 4, to_array, from_slice);
impl_serde_for_float_array!(Quat, 4, to_array, from_slice);
impl_serde_for_float_array!(Mat4, 16, to_cols_array, from_cols_slice);
