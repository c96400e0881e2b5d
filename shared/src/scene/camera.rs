use glam::Vec2;

use meshsync_serde::{checksum_pod, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::scene::transform::Transform;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    pub is_ortho: bool,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Physical camera parameters, zero when unused
    pub focal_length: f32,
    pub sensor_size: Vec2,
    pub lens_shift: Vec2,
    pub layer_mask: i32,
}

impl Camera {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            transform: Transform::new(path),
            ..Self::default()
        }
    }

    pub fn checksum(&self) -> u64 {
        self.transform
            .checksum()
            .wrapping_add(u64::from(self.is_ortho))
            .wrapping_add(checksum_pod(&[
                self.fov,
                self.near_plane,
                self.far_plane,
                self.focal_length,
            ]))
            .wrapping_add(checksum_pod(&[self.sensor_size, self.lens_shift]))
            .wrapping_add(checksum_pod(&[self.layer_mask]))
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.transform.apply_scale_factor(scale);
        self.near_plane *= scale;
        self.far_plane *= scale;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            is_ortho: false,
            fov: 30.0,
            near_plane: 0.3,
            far_plane: 1000.0,
            focal_length: 0.0,
            sensor_size: Vec2::ZERO,
            lens_shift: Vec2::ZERO,
            layer_mask: !0,
        }
    }
}

impl Serde for Camera {
    fn ser(&self, writer: &mut ByteWriter) {
        self.transform.ser(writer);
        self.is_ortho.ser(writer);
        self.fov.ser(writer);
        self.near_plane.ser(writer);
        self.far_plane.ser(writer);
        self.focal_length.ser(writer);
        self.sensor_size.ser(writer);
        self.lens_shift.ser(writer);
        self.layer_mask.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            transform: Transform::de(reader)?,
            is_ortho: bool::de(reader)?,
            fov: f32::de(reader)?,
            near_plane: f32::de(reader)?,
            far_plane: f32::de(reader)?,
            focal_length: f32::de(reader)?,
            sensor_size: Vec2::de(reader)?,
            lens_shift: Vec2::de(reader)?,
            layer_mask: i32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        self.transform.byte_length() + 1 + 4 * 4 + 8 + 8 + 4
    }
}
