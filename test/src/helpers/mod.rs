pub mod scene_builder;
pub mod test_server;

pub use scene_builder::{fan_triangles, quad_grid, transform_at};
pub use test_server::TestServer;
