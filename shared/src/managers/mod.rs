mod entity_manager;
mod material_manager;
mod task;
mod texture_manager;

pub use entity_manager::EntityManager;
pub use material_manager::MaterialManager;
pub use texture_manager::TextureManager;
