mod animation;
mod material;
mod texture;

pub use animation::{AnimationClip, Key, TransformAnimation};
pub use material::{Material, MaterialProperty, PropertyValue};
pub use texture::{Texture, TextureFormat, TextureType};

use meshsync_serde::{checksum_bytes, hash_bytes, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{constants::INVALID_ID, identifier::Identifier, scene::AxisConversion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum AssetType {
    File = 1,
    Audio = 2,
    Texture = 3,
    Material = 4,
    Animation = 5,
}

impl TryFrom<i32> for AssetType {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            1 => Ok(Self::File),
            2 => Ok(Self::Audio),
            3 => Ok(Self::Texture),
            4 => Ok(Self::Material),
            5 => Ok(Self::Animation),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "AssetType",
                value: value.into(),
            }),
        }
    }
}

/// Arbitrary file shipped to the receiving side as-is
#[derive(Debug, Clone, PartialEq)]
pub struct FileAsset {
    pub id: i32,
    pub name: String,
    pub data: Vec<u8>,
}

impl Default for FileAsset {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            name: String::new(),
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum AudioFormat {
    #[default]
    Unknown = 0,
    U8 = 1,
    S16 = 2,
    S24 = 3,
    S32 = 4,
    F32 = 5,
    RawFile = 6,
}

impl TryFrom<i32> for AudioFormat {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::U8),
            2 => Ok(Self::S16),
            3 => Ok(Self::S24),
            4 => Ok(Self::S32),
            5 => Ok(Self::F32),
            6 => Ok(Self::RawFile),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "AudioFormat",
                value: value.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub id: i32,
    pub name: String,
    pub format: AudioFormat,
    pub frequency: i32,
    pub channels: i32,
    /// Interleaved samples, or the encoded file for `RawFile`
    pub data: Vec<u8>,
}

impl Default for Audio {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            name: String::new(),
            format: AudioFormat::Unknown,
            frequency: 0,
            channels: 0,
            data: Vec::new(),
        }
    }
}

/// A non-hierarchical resource referenced by entities
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    File(FileAsset),
    Audio(Audio),
    Texture(Texture),
    Material(Material),
    Animation(AnimationClip),
}

impl Asset {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::File(_) => AssetType::File,
            Asset::Audio(_) => AssetType::Audio,
            Asset::Texture(_) => AssetType::Texture,
            Asset::Material(_) => AssetType::Material,
            Asset::Animation(_) => AssetType::Animation,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Asset::File(file) => file.id,
            Asset::Audio(audio) => audio.id,
            Asset::Texture(texture) => texture.id,
            Asset::Material(material) => material.id,
            Asset::Animation(clip) => clip.id,
        }
    }

    pub fn set_id(&mut self, id: i32) {
        match self {
            Asset::File(file) => file.id = id,
            Asset::Audio(audio) => audio.id = id,
            Asset::Texture(texture) => texture.id = id,
            Asset::Material(material) => material.id = id,
            Asset::Animation(clip) => clip.id = id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Asset::File(file) => &file.name,
            Asset::Audio(audio) => &audio.name,
            Asset::Texture(texture) => &texture.name,
            Asset::Material(material) => &material.name,
            Asset::Animation(clip) => &clip.name,
        }
    }

    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.name(), self.id())
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            Asset::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_material(&self) -> Option<&Material> {
        match self {
            Asset::Material(material) => Some(material),
            _ => None,
        }
    }

    pub fn checksum(&self) -> u64 {
        match self {
            Asset::Texture(texture) => texture.checksum(),
            Asset::Material(material) => material.checksum(),
            Asset::File(file) => checksum_bytes(&file.data),
            Asset::Audio(audio) => checksum_bytes(&audio.data),
            Asset::Animation(_) => self.hash(),
        }
    }

    /// Content identity over the encoded form
    pub fn hash(&self) -> u64 {
        let mut writer = ByteWriter::with_capacity(self.byte_length());
        self.ser(&mut writer);
        hash_bytes(&writer.to_bytes())
    }

    /// Only animation clips carry spatial data.
    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        if let Asset::Animation(clip) = self {
            clip.convert_axes(conversion);
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        if let Asset::Animation(clip) = self {
            clip.apply_scale_factor(scale);
        }
    }
}

impl Serde for Asset {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.asset_type() as i32).ser(writer);
        match self {
            Asset::File(file) => {
                file.id.ser(writer);
                file.name.ser(writer);
                writer.write_pod_slice(&file.data);
            }
            Asset::Audio(audio) => {
                audio.id.ser(writer);
                audio.name.ser(writer);
                (audio.format as i32).ser(writer);
                audio.frequency.ser(writer);
                audio.channels.ser(writer);
                writer.write_pod_slice(&audio.data);
            }
            Asset::Texture(texture) => texture.ser(writer),
            Asset::Material(material) => material.ser(writer),
            Asset::Animation(clip) => clip.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let asset = match AssetType::try_from(i32::de(reader)?)? {
            AssetType::File => Asset::File(FileAsset {
                id: i32::de(reader)?,
                name: String::de(reader)?,
                data: reader.read_pod_vec()?,
            }),
            AssetType::Audio => Asset::Audio(Audio {
                id: i32::de(reader)?,
                name: String::de(reader)?,
                format: AudioFormat::try_from(i32::de(reader)?)?,
                frequency: i32::de(reader)?,
                channels: i32::de(reader)?,
                data: reader.read_pod_vec()?,
            }),
            AssetType::Texture => Asset::Texture(Texture::de(reader)?),
            AssetType::Material => Asset::Material(Material::de(reader)?),
            AssetType::Animation => Asset::Animation(AnimationClip::de(reader)?),
        };
        Ok(asset)
    }

    fn byte_length(&self) -> usize {
        4 + match self {
            Asset::File(file) => 4 + file.name.byte_length() + 4 + file.data.len(),
            Asset::Audio(audio) => 4 + audio.name.byte_length() + 12 + 4 + audio.data.len(),
            Asset::Texture(texture) => texture.byte_length(),
            Asset::Material(material) => material.byte_length(),
            Asset::Animation(clip) => clip.byte_length(),
        }
    }
}

impl From<Texture> for Asset {
    fn from(texture: Texture) -> Self {
        Asset::Texture(texture)
    }
}

impl From<Material> for Asset {
    fn from(material: Material) -> Self {
        Asset::Material(material)
    }
}

impl From<AnimationClip> for Asset {
    fn from(clip: AnimationClip) -> Self {
        Asset::Animation(clip)
    }
}
