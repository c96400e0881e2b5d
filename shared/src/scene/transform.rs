use glam::{Quat, Vec3};

use meshsync_serde::{checksum_pod, checksum_str, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{constants::INVALID_ID, identifier::Identifier, scene::convert::AxisConversion};

/// A positional node of the scene graph. Every other entity embeds one.
/// Equality ignores `order`, which is local bookkeeping.
#[derive(Debug, Clone)]
pub struct Transform {
    pub id: i32,
    /// Id assigned by the receiving side, echoed back on later sends
    pub host_id: i32,
    pub path: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub visible: bool,
    pub visible_hierarchy: bool,
    pub index: i32,
    pub layer: i32,
    /// Path of another entity this one instances
    pub reference: String,
    /// First-seen order assigned by the entity manager, not sent over the wire
    pub order: u32,
}

impl Transform {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.path.clone(), self.id)
    }

    /// Last path component
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn checksum(&self) -> u64 {
        let mut sum = checksum_pod(&[self.position, self.scale]);
        sum = sum.wrapping_add(checksum_pod(&[self.rotation]));
        sum = sum.wrapping_add(u64::from(self.visible) | (u64::from(self.visible_hierarchy) << 1));
        sum = sum.wrapping_add(checksum_pod(&[self.index, self.layer]));
        sum.wrapping_add(checksum_str(&self.reference))
    }

    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        self.position = conversion.vec3(self.position);
        self.rotation = conversion.quat(self.rotation);
        self.scale = conversion.scale(self.scale);
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.position *= scale;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.host_id == other.host_id
            && self.path == other.path
            && self.position == other.position
            && self.rotation == other.rotation
            && self.scale == other.scale
            && self.visible == other.visible
            && self.visible_hierarchy == other.visible_hierarchy
            && self.index == other.index
            && self.layer == other.layer
            && self.reference == other.reference
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            host_id: INVALID_ID,
            path: String::new(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
            visible_hierarchy: true,
            index: 0,
            layer: 0,
            reference: String::new(),
            order: 0,
        }
    }
}

impl Serde for Transform {
    fn ser(&self, writer: &mut ByteWriter) {
        self.id.ser(writer);
        self.host_id.ser(writer);
        self.path.ser(writer);
        self.position.ser(writer);
        self.rotation.ser(writer);
        self.scale.ser(writer);
        self.visible.ser(writer);
        self.visible_hierarchy.ser(writer);
        self.index.ser(writer);
        self.layer.ser(writer);
        self.reference.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: i32::de(reader)?,
            host_id: i32::de(reader)?,
            path: String::de(reader)?,
            position: Vec3::de(reader)?,
            rotation: Quat::de(reader)?,
            scale: Vec3::de(reader)?,
            visible: bool::de(reader)?,
            visible_hierarchy: bool::de(reader)?,
            index: i32::de(reader)?,
            layer: i32::de(reader)?,
            reference: String::de(reader)?,
            order: 0,
        })
    }

    fn byte_length(&self) -> usize {
        4 + 4 + self.path.byte_length() + 12 + 16 + 12 + 1 + 1 + 4 + 4 + self.reference.byte_length()
    }
}
