use glam::{Quat, Vec3};

use meshsync_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{constants::INVALID_ID, scene::AxisConversion};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key<T> {
    /// Seconds
    pub time: f32,
    pub value: T,
}

impl<T> Key<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

impl<T: Serde> Serde for Key<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        self.time.ser(writer);
        self.value.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            time: f32::de(reader)?,
            value: T::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        4 + self.value.byte_length()
    }
}

/// Curves of one animated transform, addressed by path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformAnimation {
    pub path: String,
    pub translation: Vec<Key<Vec3>>,
    pub rotation: Vec<Key<Quat>>,
    pub scale: Vec<Key<Vec3>>,
    pub visible: Vec<Key<bool>>,
}

impl TransformAnimation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.translation.is_empty()
            && self.rotation.is_empty()
            && self.scale.is_empty()
            && self.visible.is_empty()
    }
}

impl Serde for TransformAnimation {
    fn ser(&self, writer: &mut ByteWriter) {
        self.path.ser(writer);
        self.translation.ser(writer);
        self.rotation.ser(writer);
        self.scale.ser(writer);
        self.visible.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            path: String::de(reader)?,
            translation: Vec::de(reader)?,
            rotation: Vec::de(reader)?,
            scale: Vec::de(reader)?,
            visible: Vec::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        self.path.byte_length()
            + self.translation.byte_length()
            + self.rotation.byte_length()
            + self.scale.byte_length()
            + self.visible.byte_length()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub id: i32,
    pub name: String,
    pub frame_rate: f32,
    pub animations: Vec<TransformAnimation>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Drops curves without any key.
    pub fn remove_empty(&mut self) {
        self.animations.retain(|animation| !animation.is_empty());
    }

    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        if conversion.is_identity() {
            return;
        }
        for animation in self.animations.iter_mut() {
            for key in animation.translation.iter_mut() {
                key.value = conversion.vec3(key.value);
            }
            for key in animation.rotation.iter_mut() {
                key.value = conversion.quat(key.value);
            }
            for key in animation.scale.iter_mut() {
                key.value = conversion.scale(key.value);
            }
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        for animation in self.animations.iter_mut() {
            for key in animation.translation.iter_mut() {
                key.value *= scale;
            }
        }
    }
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            name: String::new(),
            frame_rate: 30.0,
            animations: Vec::new(),
        }
    }
}

impl Serde for AnimationClip {
    fn ser(&self, writer: &mut ByteWriter) {
        self.id.ser(writer);
        self.name.ser(writer);
        self.frame_rate.ser(writer);
        self.animations.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: i32::de(reader)?,
            name: String::de(reader)?,
            frame_rate: f32::de(reader)?,
            animations: Vec::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        4 + self.name.byte_length() + 4 + self.animations.byte_length()
    }
}
