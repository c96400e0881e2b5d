use bitflags::bitflags;
use glam::Mat4;

use meshsync_serde::{checksum_pod, ByteReader, ByteWriter, Serde, SerdeErr};

bitflags! {
    /// Steps of a refinement pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshRefineFlags: u32 {
        const SPLIT = 1 << 0;
        const TRIANGULATE = 1 << 1;
        const SWAP_HANDEDNESS = 1 << 2;
        const SWAP_YZ = 1 << 3;
        const FLIP_FACES = 1 << 4;
        const GEN_NORMALS = 1 << 5;
        const GEN_NORMALS_WITH_SMOOTH_ANGLE = 1 << 6;
        const FLIP_NORMALS = 1 << 7;
        const GEN_TANGENTS = 1 << 8;
        const FLIP_U = 1 << 9;
        const FLIP_V = 1 << 10;
        const APPLY_LOCAL2WORLD = 1 << 11;
        const APPLY_WORLD2LOCAL = 1 << 12;
        const MIRROR_X = 1 << 13;
        const MIRROR_Y = 1 << 14;
        const MIRROR_Z = 1 << 15;
        const MAKE_DOUBLE_SIDED = 1 << 16;
        /// Mirrored halves share the points on their mirror plane
        const MIRROR_X_WELD = 1 << 17;
        const MIRROR_Y_WELD = 1 << 18;
        const MIRROR_Z_WELD = 1 << 19;
    }
}

/// Parameters of one refinement pass. Recomputed per Get/Set.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRefineSettings {
    pub flags: MeshRefineFlags,
    pub scale_factor: f32,
    /// Degrees. Edges sharper than this keep split normals.
    pub smooth_angle: f32,
    /// Vertex budget of one split
    pub split_unit: i32,
    /// Bone influences kept per vertex, 0 keeps all
    pub max_bone_influence: i32,
    pub local2world: Mat4,
    pub world2local: Mat4,
}

impl MeshRefineSettings {
    pub const DEFAULT_SPLIT_UNIT: i32 = 65000;

    /// Settings with every geometry-changing conversion cleared
    pub fn without_conversions(&self) -> Self {
        let mut output = self.clone();
        output.flags.remove(
            MeshRefineFlags::SWAP_HANDEDNESS
                | MeshRefineFlags::SWAP_YZ
                | MeshRefineFlags::MIRROR_X
                | MeshRefineFlags::MIRROR_Y
                | MeshRefineFlags::MIRROR_Z
                | MeshRefineFlags::APPLY_LOCAL2WORLD
                | MeshRefineFlags::APPLY_WORLD2LOCAL
                | MeshRefineFlags::FLIP_U
                | MeshRefineFlags::FLIP_V
                | MeshRefineFlags::FLIP_FACES
                | MeshRefineFlags::MAKE_DOUBLE_SIDED,
        );
        // FLIP_NORMALS only converts when it negates existing normals.
        // Generated normals keep it so regeneration matches the first pass.
        let generates_normals = self.flags.intersects(
            MeshRefineFlags::GEN_NORMALS | MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE,
        );
        if !generates_normals {
            output.flags.remove(MeshRefineFlags::FLIP_NORMALS);
        }
        output.scale_factor = 1.0;
        output
    }

    pub fn checksum(&self) -> u64 {
        let mut sum = checksum_pod(&[self.flags.bits()])
            .wrapping_add(checksum_pod(&[self.max_bone_influence]))
            .wrapping_add(checksum_pod(&[self.scale_factor]));
        if self.flags.contains(MeshRefineFlags::SPLIT) {
            sum = sum.wrapping_add(checksum_pod(&[self.split_unit]));
        }
        if self.flags.contains(MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE) {
            sum = sum.wrapping_add(checksum_pod(&[self.smooth_angle]));
        }
        if self.flags.contains(MeshRefineFlags::APPLY_LOCAL2WORLD) {
            sum = sum.wrapping_add(checksum_pod(&[self.local2world]));
        }
        if self.flags.contains(MeshRefineFlags::APPLY_WORLD2LOCAL) {
            sum = sum.wrapping_add(checksum_pod(&[self.world2local]));
        }
        sum
    }
}

impl Default for MeshRefineSettings {
    fn default() -> Self {
        Self {
            flags: MeshRefineFlags::empty(),
            scale_factor: 1.0,
            smooth_angle: 180.0,
            split_unit: Self::DEFAULT_SPLIT_UNIT,
            max_bone_influence: 4,
            local2world: Mat4::IDENTITY,
            world2local: Mat4::IDENTITY,
        }
    }
}

impl Serde for MeshRefineSettings {
    fn ser(&self, writer: &mut ByteWriter) {
        self.flags.bits().ser(writer);
        self.max_bone_influence.ser(writer);
        self.scale_factor.ser(writer);
        if self.flags.contains(MeshRefineFlags::SPLIT) {
            self.split_unit.ser(writer);
        }
        if self.flags.contains(MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE) {
            self.smooth_angle.ser(writer);
        }
        if self.flags.contains(MeshRefineFlags::APPLY_LOCAL2WORLD) {
            self.local2world.ser(writer);
        }
        if self.flags.contains(MeshRefineFlags::APPLY_WORLD2LOCAL) {
            self.world2local.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut output = Self {
            flags: MeshRefineFlags::from_bits_truncate(u32::de(reader)?),
            max_bone_influence: i32::de(reader)?,
            scale_factor: f32::de(reader)?,
            ..Self::default()
        };
        if output.flags.contains(MeshRefineFlags::SPLIT) {
            output.split_unit = i32::de(reader)?;
        }
        if output.flags.contains(MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE) {
            output.smooth_angle = f32::de(reader)?;
        }
        if output.flags.contains(MeshRefineFlags::APPLY_LOCAL2WORLD) {
            output.local2world = Mat4::de(reader)?;
        }
        if output.flags.contains(MeshRefineFlags::APPLY_WORLD2LOCAL) {
            output.world2local = Mat4::de(reader)?;
        }
        Ok(output)
    }

    fn byte_length(&self) -> usize {
        let mut length = 12;
        if self.flags.contains(MeshRefineFlags::SPLIT) {
            length += 4;
        }
        if self.flags.contains(MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE) {
            length += 4;
        }
        if self.flags.contains(MeshRefineFlags::APPLY_LOCAL2WORLD) {
            length += 64;
        }
        if self.flags.contains(MeshRefineFlags::APPLY_WORLD2LOCAL) {
            length += 64;
        }
        length
    }
}
