use meshsync_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::scene::convert::AxisConversion;

/// Coordinate convention of a scene. The receiving engine is left-handed and Y-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Handedness {
    #[default]
    Left = 0,
    Right = 1,
    LeftZUp = 2,
    RightZUp = 3,
}

impl Handedness {
    /// Conversion between this convention and left-handed Y-up, in either direction
    pub fn conversion(&self) -> AxisConversion {
        AxisConversion {
            flip_x: matches!(self, Handedness::Right | Handedness::RightZUp),
            swap_yz: matches!(self, Handedness::LeftZUp | Handedness::RightZUp),
        }
    }
}

impl TryFrom<i32> for Handedness {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            2 => Ok(Self::LeftZUp),
            3 => Ok(Self::RightZUp),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "Handedness",
                value: value.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub name: String,
    pub handedness: Handedness,
    /// Source units per engine unit
    pub scale_factor: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            name: String::from("Untitled"),
            handedness: Handedness::Left,
            scale_factor: 1.0,
        }
    }
}

impl Serde for SceneSettings {
    fn ser(&self, writer: &mut ByteWriter) {
        self.name.ser(writer);
        (self.handedness as i32).ser(writer);
        self.scale_factor.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            name: String::de(reader)?,
            handedness: Handedness::try_from(i32::de(reader)?)?,
            scale_factor: f32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        self.name.byte_length() + 8
    }
}
