use std::sync::Arc;

use meshsync_shared::{Asset, Entity, Identifier, SceneSettings};

/// Everything one `AsyncSceneSender::kick` transmits
#[derive(Debug, Clone, Default)]
pub struct SceneBatch {
    pub scene_settings: SceneSettings,
    pub assets: Vec<Arc<Asset>>,
    /// Sent one message per texture
    pub textures: Vec<Arc<Asset>>,
    pub materials: Vec<Arc<Asset>>,
    /// Non-geometry entities, sent together with the materials
    pub transforms: Vec<Arc<Entity>>,
    /// Sent one message per geometry
    pub geometries: Vec<Arc<Entity>>,
    pub animations: Vec<Arc<Asset>>,
    pub deleted_entities: Vec<Identifier>,
    pub deleted_materials: Vec<Identifier>,
}

impl SceneBatch {
    /// Nothing to send. Scene settings alone don't count.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
            && self.textures.is_empty()
            && self.materials.is_empty()
            && self.transforms.is_empty()
            && self.geometries.is_empty()
            && self.animations.is_empty()
            && self.deleted_entities.is_empty()
            && self.deleted_materials.is_empty()
    }

    /// Drops the pending data, keeping the scene settings
    pub fn clear(&mut self) {
        self.assets.clear();
        self.textures.clear();
        self.materials.clear();
        self.transforms.clear();
        self.geometries.clear();
        self.animations.clear();
        self.deleted_entities.clear();
        self.deleted_materials.clear();
    }
}
