use meshsync_serde::{checksum_bytes, checksum_pod, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::constants::INVALID_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum TextureType {
    #[default]
    Default = 0,
    NormalMap = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum TextureFormat {
    #[default]
    Unknown = 0,
    Ru8 = 1,
    RGu8 = 2,
    RGBu8 = 3,
    RGBAu8 = 4,
    Rf16 = 5,
    RGf16 = 6,
    RGBf16 = 7,
    RGBAf16 = 8,
    Rf32 = 9,
    RGf32 = 10,
    RGBf32 = 11,
    RGBAf32 = 12,
    /// Encoded image file (png, exr...) passed through untouched
    RawFile = 13,
}

impl TextureFormat {
    /// Bytes per pixel, `None` for formats without a fixed pixel layout
    pub fn pixel_size(&self) -> Option<usize> {
        match self {
            TextureFormat::Ru8 => Some(1),
            TextureFormat::RGu8 => Some(2),
            TextureFormat::RGBu8 => Some(3),
            TextureFormat::RGBAu8 => Some(4),
            TextureFormat::Rf16 => Some(2),
            TextureFormat::RGf16 => Some(4),
            TextureFormat::RGBf16 => Some(6),
            TextureFormat::RGBAf16 => Some(8),
            TextureFormat::Rf32 => Some(4),
            TextureFormat::RGf32 => Some(8),
            TextureFormat::RGBf32 => Some(12),
            TextureFormat::RGBAf32 => Some(16),
            TextureFormat::Unknown | TextureFormat::RawFile => None,
        }
    }
}

impl TryFrom<i32> for TextureType {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::NormalMap),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "TextureType",
                value: value.into(),
            }),
        }
    }
}

impl TryFrom<i32> for TextureFormat {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        let format = match value {
            0 => Self::Unknown,
            1 => Self::Ru8,
            2 => Self::RGu8,
            3 => Self::RGBu8,
            4 => Self::RGBAu8,
            5 => Self::Rf16,
            6 => Self::RGf16,
            7 => Self::RGBf16,
            8 => Self::RGBAf16,
            9 => Self::Rf32,
            10 => Self::RGf32,
            11 => Self::RGBf32,
            12 => Self::RGBAf32,
            13 => Self::RawFile,
            _ => {
                return Err(SerdeErr::InvalidDiscriminant {
                    type_name: "TextureFormat",
                    value: value.into(),
                })
            }
        };
        Ok(format)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: i32,
    pub name: String,
    pub texture_type: TextureType,
    pub format: TextureFormat,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn checksum(&self) -> u64 {
        checksum_bytes(&self.data).wrapping_add(checksum_pod(&[
            self.texture_type as i32,
            self.format as i32,
            self.width,
            self.height,
        ]))
    }
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            name: String::new(),
            texture_type: TextureType::Default,
            format: TextureFormat::Unknown,
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl Serde for Texture {
    fn ser(&self, writer: &mut ByteWriter) {
        self.id.ser(writer);
        self.name.ser(writer);
        (self.texture_type as i32).ser(writer);
        (self.format as i32).ser(writer);
        self.width.ser(writer);
        self.height.ser(writer);
        writer.write_pod_slice(&self.data);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: i32::de(reader)?,
            name: String::de(reader)?,
            texture_type: TextureType::try_from(i32::de(reader)?)?,
            format: TextureFormat::try_from(i32::de(reader)?)?,
            width: i32::de(reader)?,
            height: i32::de(reader)?,
            data: reader.read_pod_vec()?,
        })
    }

    fn byte_length(&self) -> usize {
        4 + self.name.byte_length() + 16 + 4 + self.data.len()
    }
}
