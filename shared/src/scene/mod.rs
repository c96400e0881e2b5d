mod camera;
mod convert;
mod entity;
mod light;
mod mesh;
mod points;
#[allow(clippy::module_inception)]
mod scene;
mod settings;
mod transform;

pub use camera::Camera;
pub use convert::{flip_x, flip_x_quat, swap_yz, swap_yz_quat, AxisConversion};
pub use entity::{Entity, EntityType};
pub use light::{Light, LightType, ShadowType};
pub use mesh::{
    BlendShapeData, BlendShapeFrame, BoneData, Bounds, Mesh, MeshDataFlags, SplitData,
    SubmeshData, Topology,
};
pub use points::Points;
pub use scene::Scene;
pub use settings::{Handedness, SceneSettings};
pub use transform::Transform;
