use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};

use meshsync_serde::{checksum_pod, checksum_str, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    refine::MeshRefineSettings,
    scene::{convert::AxisConversion, transform::Transform},
};

bitflags! {
    /// Which mesh arrays are present on the wire
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshDataFlags: u32 {
        const REFINE_SETTINGS = 1 << 0;
        const INDICES = 1 << 1;
        const COUNTS = 1 << 2;
        const POINTS = 1 << 3;
        const NORMALS = 1 << 4;
        const TANGENTS = 1 << 5;
        const UV0 = 1 << 6;
        const UV1 = 1 << 7;
        const COLORS = 1 << 8;
        const VELOCITIES = 1 << 9;
        const MATERIAL_IDS = 1 << 10;
        const BONES = 1 << 11;
        const BLENDSHAPES = 1 << 12;
        const SUBMESHES = 1 << 13;
        const SPLITS = 1 << 14;
        const BOUNDS = 1 << 15;
        /// Geometry identical to the previous send, only the transform follows
        const UNCHANGED = 1 << 16;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Topology {
    Points = 0,
    Lines = 1,
    #[default]
    Triangles = 2,
    Quads = 3,
}

impl Topology {
    /// Topology of faces that all have `count` corners
    pub fn from_face_size(count: i32) -> Option<Self> {
        match count {
            1 => Some(Self::Points),
            2 => Some(Self::Lines),
            3 => Some(Self::Triangles),
            4 => Some(Self::Quads),
            _ => None,
        }
    }
}

impl TryFrom<i32> for Topology {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            0 => Ok(Self::Points),
            1 => Ok(Self::Lines),
            2 => Ok(Self::Triangles),
            3 => Ok(Self::Quads),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "Topology",
                value: value.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneData {
    pub path: String,
    pub bindpose: Mat4,
    /// One weight per mesh point
    pub weights: Vec<f32>,
}

impl BoneData {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bindpose: Mat4::IDENTITY,
            weights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendShapeFrame {
    pub weight: f32,
    /// Deltas against the base mesh
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendShapeData {
    pub name: String,
    pub weight: f32,
    pub frames: Vec<BlendShapeFrame>,
}

impl BlendShapeData {
    pub fn sort_frames(&mut self) {
        self.frames.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    }
}

/// Range of the index buffer drawn with one material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmeshData {
    pub index_offset: i32,
    pub index_count: i32,
    pub topology: Topology,
    pub material_id: i32,
    pub split_index: i32,
}

/// Vertex and index ranges of one split. Indices stay global, subtract
/// `vertex_offset` to address a split-local vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitData {
    pub vertex_offset: i32,
    pub vertex_count: i32,
    pub index_offset: i32,
    pub index_count: i32,
    pub submesh_offset: i32,
    pub submesh_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }
}

/// Polygon mesh. `counts` holds corners per face and `sum(counts) == indices.len()`.
/// Per-vertex attributes match `points` in length, per-corner ones match `indices`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub transform: Transform,
    pub flags: MeshDataFlags,
    pub refine_settings: MeshRefineSettings,

    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uv0: Vec<Vec2>,
    pub uv1: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub velocities: Vec<Vec3>,
    pub counts: Vec<i32>,
    pub indices: Vec<i32>,
    /// Per face
    pub material_ids: Vec<i32>,

    pub root_bone: String,
    pub bones: Vec<BoneData>,
    pub blendshapes: Vec<BlendShapeData>,

    pub submeshes: Vec<SubmeshData>,
    pub splits: Vec<SplitData>,
    pub bounds: Bounds,
}

impl Mesh {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            transform: Transform::new(path),
            ..Self::default()
        }
    }

    pub fn face_count(&self) -> usize {
        self.counts.len()
    }

    /// Recomputes the presence flags from the current arrays.
    pub fn setup_data_flags(&mut self) {
        let mut flags = MeshDataFlags::REFINE_SETTINGS;
        flags.set(MeshDataFlags::INDICES, !self.indices.is_empty());
        flags.set(MeshDataFlags::COUNTS, !self.counts.is_empty());
        flags.set(MeshDataFlags::POINTS, !self.points.is_empty());
        flags.set(MeshDataFlags::NORMALS, !self.normals.is_empty());
        flags.set(MeshDataFlags::TANGENTS, !self.tangents.is_empty());
        flags.set(MeshDataFlags::UV0, !self.uv0.is_empty());
        flags.set(MeshDataFlags::UV1, !self.uv1.is_empty());
        flags.set(MeshDataFlags::COLORS, !self.colors.is_empty());
        flags.set(MeshDataFlags::VELOCITIES, !self.velocities.is_empty());
        flags.set(MeshDataFlags::MATERIAL_IDS, !self.material_ids.is_empty());
        flags.set(MeshDataFlags::BONES, !self.bones.is_empty());
        flags.set(MeshDataFlags::BLENDSHAPES, !self.blendshapes.is_empty());
        flags.set(MeshDataFlags::SUBMESHES, !self.submeshes.is_empty());
        flags.set(MeshDataFlags::SPLITS, !self.splits.is_empty());
        flags.set(MeshDataFlags::BOUNDS, !self.points.is_empty());
        self.flags = flags;
    }

    pub fn checksum_geom(&self) -> u64 {
        let mut sum = self.refine_settings.checksum();
        sum = sum
            .wrapping_add(checksum_pod(&self.points))
            .wrapping_add(checksum_pod(&self.normals))
            .wrapping_add(checksum_pod(&self.tangents))
            .wrapping_add(checksum_pod(&self.uv0))
            .wrapping_add(checksum_pod(&self.uv1))
            .wrapping_add(checksum_pod(&self.colors))
            .wrapping_add(checksum_pod(&self.velocities))
            .wrapping_add(checksum_pod(&self.counts))
            .wrapping_add(checksum_pod(&self.indices))
            .wrapping_add(checksum_pod(&self.material_ids))
            .wrapping_add(checksum_str(&self.root_bone));
        for bone in &self.bones {
            sum = sum
                .wrapping_add(checksum_str(&bone.path))
                .wrapping_add(checksum_pod(&[bone.bindpose]))
                .wrapping_add(checksum_pod(&bone.weights));
        }
        for blendshape in &self.blendshapes {
            sum = sum
                .wrapping_add(checksum_str(&blendshape.name))
                .wrapping_add(checksum_pod(&[blendshape.weight]));
            for frame in &blendshape.frames {
                sum = sum
                    .wrapping_add(checksum_pod(&[frame.weight]))
                    .wrapping_add(checksum_pod(&frame.points))
                    .wrapping_add(checksum_pod(&frame.normals))
                    .wrapping_add(checksum_pod(&frame.tangents));
            }
        }
        sum
    }

    /// Converts every spatial array, the bind poses, blend shapes and the
    /// transform into another axis convention.
    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        if conversion.is_identity() {
            return;
        }
        self.transform.convert_axes(conversion);
        for p in self.points.iter_mut() {
            *p = conversion.vec3(*p);
        }
        for n in self.normals.iter_mut() {
            *n = conversion.vec3(*n);
        }
        for t in self.tangents.iter_mut() {
            *t = conversion.tangent(*t);
        }
        for v in self.velocities.iter_mut() {
            *v = conversion.vec3(*v);
        }
        for bone in self.bones.iter_mut() {
            bone.bindpose = conversion.mat(bone.bindpose);
        }
        for frame in self.blendshapes.iter_mut().flat_map(|b| b.frames.iter_mut()) {
            for p in frame.points.iter_mut() {
                *p = conversion.vec3(*p);
            }
            for n in frame.normals.iter_mut() {
                *n = conversion.vec3(*n);
            }
            for t in frame.tangents.iter_mut() {
                *t = conversion.vec3(*t);
            }
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.transform.apply_scale_factor(scale);
        self.scale_geometry(scale);
    }

    /// Scales the vertex data without touching the transform.
    pub fn scale_geometry(&mut self, scale: f32) {
        for p in self.points.iter_mut() {
            *p *= scale;
        }
        for v in self.velocities.iter_mut() {
            *v *= scale;
        }
        for bone in self.bones.iter_mut() {
            let translation = bone.bindpose.w_axis;
            bone.bindpose.w_axis = Vec4::new(
                translation.x * scale,
                translation.y * scale,
                translation.z * scale,
                translation.w,
            );
        }
        for frame in self.blendshapes.iter_mut().flat_map(|b| b.frames.iter_mut()) {
            for p in frame.points.iter_mut() {
                *p *= scale;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// Serde

impl Serde for BoneData {
    fn ser(&self, writer: &mut ByteWriter) {
        self.path.ser(writer);
        self.bindpose.ser(writer);
        writer.write_pod_slice(&self.weights);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            path: String::de(reader)?,
            bindpose: Mat4::de(reader)?,
            weights: reader.read_pod_vec()?,
        })
    }

    fn byte_length(&self) -> usize {
        self.path.byte_length() + 64 + 4 + self.weights.len() * 4
    }
}

impl Serde for BlendShapeFrame {
    fn ser(&self, writer: &mut ByteWriter) {
        self.weight.ser(writer);
        writer.write_pod_slice(&self.points);
        writer.write_pod_slice(&self.normals);
        writer.write_pod_slice(&self.tangents);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            weight: f32::de(reader)?,
            points: reader.read_pod_vec()?,
            normals: reader.read_pod_vec()?,
            tangents: reader.read_pod_vec()?,
        })
    }

    fn byte_length(&self) -> usize {
        4 + 12 + (self.points.len() + self.normals.len() + self.tangents.len()) * 12
    }
}

impl Serde for BlendShapeData {
    fn ser(&self, writer: &mut ByteWriter) {
        self.name.ser(writer);
        self.weight.ser(writer);
        self.frames.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            name: String::de(reader)?,
            weight: f32::de(reader)?,
            frames: Vec::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        self.name.byte_length() + 4 + self.frames.byte_length()
    }
}

impl Serde for SubmeshData {
    fn ser(&self, writer: &mut ByteWriter) {
        self.index_offset.ser(writer);
        self.index_count.ser(writer);
        (self.topology as i32).ser(writer);
        self.material_id.ser(writer);
        self.split_index.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            index_offset: i32::de(reader)?,
            index_count: i32::de(reader)?,
            topology: Topology::try_from(i32::de(reader)?)?,
            material_id: i32::de(reader)?,
            split_index: i32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        20
    }
}

impl Serde for SplitData {
    fn ser(&self, writer: &mut ByteWriter) {
        self.vertex_offset.ser(writer);
        self.vertex_count.ser(writer);
        self.index_offset.ser(writer);
        self.index_count.ser(writer);
        self.submesh_offset.ser(writer);
        self.submesh_count.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            vertex_offset: i32::de(reader)?,
            vertex_count: i32::de(reader)?,
            index_offset: i32::de(reader)?,
            index_count: i32::de(reader)?,
            submesh_offset: i32::de(reader)?,
            submesh_count: i32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        24
    }
}

impl Serde for Bounds {
    fn ser(&self, writer: &mut ByteWriter) {
        self.center.ser(writer);
        self.extents.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            center: Vec3::de(reader)?,
            extents: Vec3::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        24
    }
}

macro_rules! pod_field_length {
    ($mesh:ident, $flag:ident, $field:ident, $size:expr) => {
        if $mesh.flags.contains(MeshDataFlags::$flag) {
            4 + $mesh.$field.len() * $size
        } else {
            0
        }
    };
}

impl Serde for Mesh {
    fn ser(&self, writer: &mut ByteWriter) {
        self.transform.ser(writer);
        self.flags.bits().ser(writer);
        if self.flags.contains(MeshDataFlags::UNCHANGED) {
            return;
        }

        let flags = self.flags;
        if flags.contains(MeshDataFlags::REFINE_SETTINGS) {
            self.refine_settings.ser(writer);
        }
        if flags.contains(MeshDataFlags::INDICES) {
            writer.write_pod_slice(&self.indices);
        }
        if flags.contains(MeshDataFlags::COUNTS) {
            writer.write_pod_slice(&self.counts);
        }
        if flags.contains(MeshDataFlags::POINTS) {
            writer.write_pod_slice(&self.points);
        }
        if flags.contains(MeshDataFlags::NORMALS) {
            writer.write_pod_slice(&self.normals);
        }
        if flags.contains(MeshDataFlags::TANGENTS) {
            writer.write_pod_slice(&self.tangents);
        }
        if flags.contains(MeshDataFlags::UV0) {
            writer.write_pod_slice(&self.uv0);
        }
        if flags.contains(MeshDataFlags::UV1) {
            writer.write_pod_slice(&self.uv1);
        }
        if flags.contains(MeshDataFlags::COLORS) {
            writer.write_pod_slice(&self.colors);
        }
        if flags.contains(MeshDataFlags::VELOCITIES) {
            writer.write_pod_slice(&self.velocities);
        }
        if flags.contains(MeshDataFlags::MATERIAL_IDS) {
            writer.write_pod_slice(&self.material_ids);
        }
        if flags.contains(MeshDataFlags::BONES) {
            self.root_bone.ser(writer);
            self.bones.ser(writer);
        }
        if flags.contains(MeshDataFlags::BLENDSHAPES) {
            self.blendshapes.ser(writer);
        }
        if flags.contains(MeshDataFlags::SUBMESHES) {
            self.submeshes.ser(writer);
        }
        if flags.contains(MeshDataFlags::SPLITS) {
            self.splits.ser(writer);
        }
        if flags.contains(MeshDataFlags::BOUNDS) {
            self.bounds.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut mesh = Mesh {
            transform: Transform::de(reader)?,
            flags: MeshDataFlags::from_bits_truncate(u32::de(reader)?),
            ..Mesh::default()
        };
        let flags = mesh.flags;
        if flags.contains(MeshDataFlags::UNCHANGED) {
            return Ok(mesh);
        }

        if flags.contains(MeshDataFlags::REFINE_SETTINGS) {
            mesh.refine_settings = MeshRefineSettings::de(reader)?;
        }
        if flags.contains(MeshDataFlags::INDICES) {
            mesh.indices = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::COUNTS) {
            mesh.counts = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::POINTS) {
            mesh.points = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::NORMALS) {
            mesh.normals = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::TANGENTS) {
            mesh.tangents = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::UV0) {
            mesh.uv0 = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::UV1) {
            mesh.uv1 = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::COLORS) {
            mesh.colors = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::VELOCITIES) {
            mesh.velocities = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::MATERIAL_IDS) {
            mesh.material_ids = reader.read_pod_vec()?;
        }
        if flags.contains(MeshDataFlags::BONES) {
            mesh.root_bone = String::de(reader)?;
            mesh.bones = Vec::de(reader)?;
        }
        if flags.contains(MeshDataFlags::BLENDSHAPES) {
            mesh.blendshapes = Vec::de(reader)?;
        }
        if flags.contains(MeshDataFlags::SUBMESHES) {
            mesh.submeshes = Vec::de(reader)?;
        }
        if flags.contains(MeshDataFlags::SPLITS) {
            mesh.splits = Vec::de(reader)?;
        }
        if flags.contains(MeshDataFlags::BOUNDS) {
            mesh.bounds = Bounds::de(reader)?;
        }
        Ok(mesh)
    }

    fn byte_length(&self) -> usize {
        let mut length = self.transform.byte_length() + 4;
        if self.flags.contains(MeshDataFlags::UNCHANGED) {
            return length;
        }
        if self.flags.contains(MeshDataFlags::REFINE_SETTINGS) {
            length += self.refine_settings.byte_length();
        }
        length += pod_field_length!(self, INDICES, indices, 4);
        length += pod_field_length!(self, COUNTS, counts, 4);
        length += pod_field_length!(self, POINTS, points, 12);
        length += pod_field_length!(self, NORMALS, normals, 12);
        length += pod_field_length!(self, TANGENTS, tangents, 16);
        length += pod_field_length!(self, UV0, uv0, 8);
        length += pod_field_length!(self, UV1, uv1, 8);
        length += pod_field_length!(self, COLORS, colors, 16);
        length += pod_field_length!(self, VELOCITIES, velocities, 12);
        length += pod_field_length!(self, MATERIAL_IDS, material_ids, 4);
        if self.flags.contains(MeshDataFlags::BONES) {
            length += self.root_bone.byte_length() + self.bones.byte_length();
        }
        if self.flags.contains(MeshDataFlags::BLENDSHAPES) {
            length += self.blendshapes.byte_length();
        }
        if self.flags.contains(MeshDataFlags::SUBMESHES) {
            length += self.submeshes.byte_length();
        }
        if self.flags.contains(MeshDataFlags::SPLITS) {
            length += self.splits.byte_length();
        }
        if self.flags.contains(MeshDataFlags::BOUNDS) {
            length += self.bounds.byte_length();
        }
        length
    }
}
