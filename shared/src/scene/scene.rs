use std::sync::Arc;

use meshsync_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    asset::Asset,
    scene::{entity::Entity, settings::SceneSettings},
};

/// Entities and assets exchanged in one Set or served for one Get.
/// Members are shared so managers and messages can hold the same objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub settings: SceneSettings,
    pub entities: Vec<Arc<Entity>>,
    pub assets: Vec<Arc<Asset>>,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.assets.is_empty()
    }

    pub fn add_entity(&mut self, entity: impl Into<Entity>) {
        self.entities.push(Arc::new(entity.into()));
    }

    pub fn add_asset(&mut self, asset: impl Into<Asset>) {
        self.assets.push(Arc::new(asset.into()));
    }

    pub fn find_entity(&self, path: &str) -> Option<&Arc<Entity>> {
        self.entities.iter().find(|entity| entity.path() == path)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.assets.clear();
    }
}

impl Serde for Scene {
    fn ser(&self, writer: &mut ByteWriter) {
        self.settings.ser(writer);
        writer.write_length(self.entities.len());
        for entity in &self.entities {
            entity.ser(writer);
        }
        writer.write_length(self.assets.len());
        for asset in &self.assets {
            asset.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let settings = SceneSettings::de(reader)?;
        let entities = Vec::<Entity>::de(reader)?
            .into_iter()
            .map(Arc::new)
            .collect();
        let assets = Vec::<Asset>::de(reader)?
            .into_iter()
            .map(Arc::new)
            .collect();
        Ok(Self {
            settings,
            entities,
            assets,
        })
    }

    fn byte_length(&self) -> usize {
        self.settings.byte_length()
            + 4
            + self.entities.iter().map(|e| e.byte_length()).sum::<usize>()
            + 4
            + self.assets.iter().map(|a| a.byte_length()).sum::<usize>()
    }
}
