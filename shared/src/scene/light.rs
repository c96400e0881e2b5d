use glam::Vec4;

use meshsync_serde::{checksum_pod, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::scene::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum LightType {
    Spot = 0,
    #[default]
    Directional = 1,
    Point = 2,
    Area = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ShadowType {
    #[default]
    None = 0,
    Hard = 1,
    Soft = 2,
}

impl TryFrom<i32> for LightType {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::Spot),
            1 => Ok(Self::Directional),
            2 => Ok(Self::Point),
            3 => Ok(Self::Area),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "LightType",
                value: value.into(),
            }),
        }
    }
}

impl TryFrom<i32> for ShadowType {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Soft),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "ShadowType",
                value: value.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub transform: Transform,
    pub light_type: LightType,
    pub shadow_type: ShadowType,
    pub color: Vec4,
    pub intensity: f32,
    pub range: f32,
    /// Cone angle in degrees, spot lights only
    pub spot_angle: f32,
    pub layer_mask: i32,
}

impl Light {
    pub fn new(path: impl Into<String>, light_type: LightType) -> Self {
        Self {
            transform: Transform::new(path),
            light_type,
            ..Self::default()
        }
    }

    pub fn checksum(&self) -> u64 {
        self.transform
            .checksum()
            .wrapping_add(checksum_pod(&[
                self.light_type as i32,
                self.shadow_type as i32,
                self.layer_mask,
            ]))
            .wrapping_add(checksum_pod(&[self.color]))
            .wrapping_add(checksum_pod(&[self.intensity, self.range, self.spot_angle]))
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.transform.apply_scale_factor(scale);
        self.range *= scale;
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            light_type: LightType::Directional,
            shadow_type: ShadowType::None,
            color: Vec4::ONE,
            intensity: 1.0,
            range: 0.0,
            spot_angle: 30.0,
            layer_mask: !0,
        }
    }
}

impl Serde for Light {
    fn ser(&self, writer: &mut ByteWriter) {
        self.transform.ser(writer);
        (self.light_type as i32).ser(writer);
        (self.shadow_type as i32).ser(writer);
        self.color.ser(writer);
        self.intensity.ser(writer);
        self.range.ser(writer);
        self.spot_angle.ser(writer);
        self.layer_mask.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            transform: Transform::de(reader)?,
            light_type: LightType::try_from(i32::de(reader)?)?,
            shadow_type: ShadowType::try_from(i32::de(reader)?)?,
            color: Vec4::de(reader)?,
            intensity: f32::de(reader)?,
            range: f32::de(reader)?,
            spot_angle: f32::de(reader)?,
            layer_mask: i32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        self.transform.byte_length() + 4 + 4 + 16 + 4 * 4
    }
}
