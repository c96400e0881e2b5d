mod error;
mod geometry;
mod normals;
mod pipeline;
mod refiner;
mod settings;

pub use error::RefineError;
pub use normals::{
    face_normal, generate_normals_poly, generate_normals_with_smooth_angle, generate_tangents,
};
pub use refiner::{CornerAttribute, MeshRefiner};
pub use settings::{MeshRefineFlags, MeshRefineSettings};
