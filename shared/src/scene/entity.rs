use meshsync_serde::{hash_bytes, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    identifier::Identifier,
    scene::{
        camera::Camera, convert::AxisConversion, light::Light, mesh::Mesh, points::Points,
        transform::Transform,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EntityType {
    Transform = 1,
    Camera = 2,
    Light = 3,
    Mesh = 4,
    Points = 5,
}

impl TryFrom<i32> for EntityType {
    type Error = SerdeErr;

    fn try_from(value: i32) -> Result<Self, SerdeErr> {
        match value {
            1 => Ok(Self::Transform),
            2 => Ok(Self::Camera),
            3 => Ok(Self::Light),
            4 => Ok(Self::Mesh),
            5 => Ok(Self::Points),
            _ => Err(SerdeErr::InvalidDiscriminant {
                type_name: "EntityType",
                value: value.into(),
            }),
        }
    }
}

/// A node of the synced scene graph
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Transform(Transform),
    Camera(Camera),
    Light(Light),
    Mesh(Box<Mesh>),
    Points(Box<Points>),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Transform(_) => EntityType::Transform,
            Entity::Camera(_) => EntityType::Camera,
            Entity::Light(_) => EntityType::Light,
            Entity::Mesh(_) => EntityType::Mesh,
            Entity::Points(_) => EntityType::Points,
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            Entity::Transform(transform) => transform,
            Entity::Camera(camera) => &camera.transform,
            Entity::Light(light) => &light.transform,
            Entity::Mesh(mesh) => &mesh.transform,
            Entity::Points(points) => &points.transform,
        }
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            Entity::Transform(transform) => transform,
            Entity::Camera(camera) => &mut camera.transform,
            Entity::Light(light) => &mut light.transform,
            Entity::Mesh(mesh) => &mut mesh.transform,
            Entity::Points(points) => &mut points.transform,
        }
    }

    pub fn path(&self) -> &str {
        &self.transform().path
    }

    pub fn identifier(&self) -> Identifier {
        self.transform().identifier()
    }

    /// Geometry checksums are expensive enough to be computed off-thread.
    pub fn is_geometry(&self) -> bool {
        matches!(self, Entity::Mesh(_) | Entity::Points(_))
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Entity::Mesh(mesh) => Some(mesh.as_ref()),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Entity::Mesh(mesh) => Some(mesh.as_mut()),
            _ => None,
        }
    }

    /// Checksum of everything that isn't geometry
    pub fn checksum_trans(&self) -> u64 {
        match self {
            Entity::Transform(transform) => transform.checksum(),
            Entity::Camera(camera) => camera.checksum(),
            Entity::Light(light) => light.checksum(),
            Entity::Mesh(mesh) => mesh.transform.checksum(),
            Entity::Points(points) => points.transform.checksum(),
        }
    }

    pub fn checksum_geom(&self) -> u64 {
        match self {
            Entity::Mesh(mesh) => mesh.checksum_geom(),
            Entity::Points(points) => points.checksum_geom(),
            _ => 0,
        }
    }

    /// Content identity over the encoded form
    pub fn hash(&self) -> u64 {
        let mut writer = ByteWriter::with_capacity(self.byte_length());
        self.ser(&mut writer);
        hash_bytes(&writer.to_bytes())
    }

    /// A plain transform carrying only this entity's positional fields
    pub fn to_transform_only(&self) -> Entity {
        Entity::Transform(self.transform().clone())
    }

    pub fn convert_axes(&mut self, conversion: AxisConversion) {
        match self {
            Entity::Transform(transform) => transform.convert_axes(conversion),
            Entity::Camera(camera) => camera.transform.convert_axes(conversion),
            Entity::Light(light) => light.transform.convert_axes(conversion),
            Entity::Mesh(mesh) => mesh.convert_axes(conversion),
            Entity::Points(points) => points.convert_axes(conversion),
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        match self {
            Entity::Transform(transform) => transform.apply_scale_factor(scale),
            Entity::Camera(camera) => camera.apply_scale_factor(scale),
            Entity::Light(light) => light.apply_scale_factor(scale),
            Entity::Mesh(mesh) => mesh.apply_scale_factor(scale),
            Entity::Points(points) => points.apply_scale_factor(scale),
        }
    }

    /// Resets the payload, keeping the variant.
    pub fn clear(&mut self) {
        *self = match self.entity_type() {
            EntityType::Transform => Entity::Transform(Transform::default()),
            EntityType::Camera => Entity::Camera(Camera::default()),
            EntityType::Light => Entity::Light(Light::default()),
            EntityType::Mesh => Entity::Mesh(Box::default()),
            EntityType::Points => Entity::Points(Box::default()),
        };
    }
}

impl From<Transform> for Entity {
    fn from(transform: Transform) -> Self {
        Entity::Transform(transform)
    }
}

impl From<Camera> for Entity {
    fn from(camera: Camera) -> Self {
        Entity::Camera(camera)
    }
}

impl From<Light> for Entity {
    fn from(light: Light) -> Self {
        Entity::Light(light)
    }
}

impl From<Mesh> for Entity {
    fn from(mesh: Mesh) -> Self {
        Entity::Mesh(Box::new(mesh))
    }
}

impl From<Points> for Entity {
    fn from(points: Points) -> Self {
        Entity::Points(Box::new(points))
    }
}

/// Encoded as the type tag followed by the variant's own payload
impl Serde for Entity {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.entity_type() as i32).ser(writer);
        match self {
            Entity::Transform(transform) => transform.ser(writer),
            Entity::Camera(camera) => camera.ser(writer),
            Entity::Light(light) => light.ser(writer),
            Entity::Mesh(mesh) => mesh.ser(writer),
            Entity::Points(points) => points.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let entity = match EntityType::try_from(i32::de(reader)?)? {
            EntityType::Transform => Entity::Transform(Transform::de(reader)?),
            EntityType::Camera => Entity::Camera(Camera::de(reader)?),
            EntityType::Light => Entity::Light(Light::de(reader)?),
            EntityType::Mesh => Entity::Mesh(Box::new(Mesh::de(reader)?)),
            EntityType::Points => Entity::Points(Box::new(Points::de(reader)?)),
        };
        Ok(entity)
    }

    fn byte_length(&self) -> usize {
        4 + match self {
            Entity::Transform(transform) => transform.byte_length(),
            Entity::Camera(camera) => camera.byte_length(),
            Entity::Light(light) => light.byte_length(),
            Entity::Mesh(mesh) => mesh.byte_length(),
            Entity::Points(points) => points.byte_length(),
        }
    }
}
