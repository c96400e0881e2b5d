use glam::{Quat, Vec3, Vec4};

use meshsync_serde::{checksum_pod, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::scene::{convert::AxisConversion, transform::Transform};

/// A point cloud. Per-point arrays are either empty or match `points` in length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Points {
    pub transform: Transform,
    pub points: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub scales: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub velocities: Vec<Vec3>,
    pub ids: Vec<i32>,
}

impl Points {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            transform: Transform::new(path),
            ..Self::default()
        }
    }

    pub fn checksum_geom(&self) -> u64 {
        checksum_pod(&self.points)
            .wrapping_add(checksum_pod(&self.rotations))
            .wrapping_add(checksum_pod(&self.scales))
            .wrapping_add(checksum_pod(&self.colors))
            .wrapping_add(checksum_pod(&self.velocities))
            .wrapping_add(checksum_pod(&self.ids))
    }

    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        self.transform.convert_axes(conversion);
        for point in self.points.iter_mut() {
            *point = conversion.vec3(*point);
        }
        for rotation in self.rotations.iter_mut() {
            *rotation = conversion.quat(*rotation);
        }
        for scale in self.scales.iter_mut() {
            *scale = conversion.scale(*scale);
        }
        for velocity in self.velocities.iter_mut() {
            *velocity = conversion.vec3(*velocity);
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.transform.apply_scale_factor(scale);
        for point in self.points.iter_mut() {
            *point *= scale;
        }
        for velocity in self.velocities.iter_mut() {
            *velocity *= scale;
        }
    }
}

impl Serde for Points {
    fn ser(&self, writer: &mut ByteWriter) {
        self.transform.ser(writer);
        writer.write_pod_slice(&self.points);
        writer.write_pod_slice(&self.rotations);
        writer.write_pod_slice(&self.scales);
        writer.write_pod_slice(&self.colors);
        writer.write_pod_slice(&self.velocities);
        writer.write_pod_slice(&self.ids);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            transform: Transform::de(reader)?,
            points: reader.read_pod_vec()?,
            rotations: reader.read_pod_vec()?,
            scales: reader.read_pod_vec()?,
            colors: reader.read_pod_vec()?,
            velocities: reader.read_pod_vec()?,
            ids: reader.read_pod_vec()?,
        })
    }

    fn byte_length(&self) -> usize {
        self.transform.byte_length()
            + 6 * 4
            + self.points.len() * 12
            + self.rotations.len() * 16
            + self.scales.len() * 12
            + self.colors.len() * 16
            + self.velocities.len() * 12
            + self.ids.len() * 4
    }
}
