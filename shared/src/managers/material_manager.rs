use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    asset::{Asset, Material},
    constants::INVALID_ID,
    identifier::Identifier,
};

struct MaterialRecord {
    asset: Arc<Asset>,
    order: u32,
    checksum: u64,
    dirty: bool,
    updated: bool,
}

#[derive(Default)]
struct Inner {
    records: HashMap<i32, MaterialRecord>,
    deleted: Vec<Identifier>,
    order_counter: u32,
    always_mark_dirty: bool,
}

impl Inner {
    fn sorted_by<F>(&self, filter: F) -> Vec<Arc<Asset>>
    where
        F: Fn(&MaterialRecord) -> bool,
    {
        let mut records: Vec<&MaterialRecord> =
            self.records.values().filter(|record| filter(*record)).collect();
        records.sort_by_key(|record| record.order);
        records.into_iter().map(|record| record.asset.clone()).collect()
    }
}

/// Dirty tracking for materials, keyed by material id. Material checksums
/// are cheap and computed inline.
#[derive(Default)]
pub struct MaterialManager {
    inner: Mutex<Inner>,
}

impl MaterialManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Inserts or updates a material. Materials without an id are rejected.
    pub fn add(&self, material: Material) -> bool {
        if material.id == INVALID_ID {
            log::warn!("material {} has no id and was ignored", material.name);
            return false;
        }
        let id = material.id;
        let checksum = material.checksum();
        let asset = Arc::new(Asset::Material(material));

        let mut inner = self.lock();
        let inner = &mut *inner;
        inner.deleted.retain(|identifier| identifier.id != id);
        let always_mark_dirty = inner.always_mark_dirty;

        match inner.records.get_mut(&id) {
            Some(record) => {
                if always_mark_dirty || record.checksum != checksum {
                    record.dirty = true;
                }
                record.asset = asset;
                record.checksum = checksum;
                record.updated = true;
            }
            None => {
                inner.order_counter += 1;
                inner.records.insert(
                    id,
                    MaterialRecord {
                        asset,
                        order: inner.order_counter,
                        checksum,
                        dirty: true,
                        updated: true,
                    },
                );
            }
        }
        true
    }

    pub fn find(&self, id: i32) -> Option<Arc<Asset>> {
        self.lock().records.get(&id).map(|record| record.asset.clone())
    }

    pub fn erase(&self, id: i32) -> bool {
        let mut inner = self.lock();
        match inner.records.remove(&id) {
            Some(record) => {
                inner.deleted.push(record.asset.identifier());
                true
            }
            None => false,
        }
    }

    pub fn mark_dirty(&self, id: i32) -> bool {
        match self.lock().records.get_mut(&id) {
            Some(record) => {
                record.dirty = true;
                record.updated = true;
                true
            }
            None => false,
        }
    }

    pub fn get_all_materials(&self) -> Vec<Arc<Asset>> {
        self.lock().sorted_by(|_| true)
    }

    pub fn get_dirty_materials(&self) -> Vec<Arc<Asset>> {
        self.lock().sorted_by(|record| record.dirty)
    }

    pub fn get_deleted(&self) -> Vec<Identifier> {
        self.lock().deleted.clone()
    }

    pub fn erase_stale_materials(&self) -> usize {
        let mut inner = self.lock();
        let inner = &mut *inner;
        let before = inner.records.len();
        let deleted = &mut inner.deleted;
        inner.records.retain(|_, record| {
            if !record.updated {
                deleted.push(record.asset.identifier());
            }
            record.updated
        });
        before - inner.records.len()
    }

    pub fn make_dirty_all(&self) {
        for record in self.lock().records.values_mut() {
            record.dirty = true;
        }
    }

    pub fn set_always_mark_dirty(&self, value: bool) {
        self.lock().always_mark_dirty = value;
    }

    pub fn clear_dirty_flags(&self) {
        let mut inner = self.lock();
        for record in inner.records.values_mut() {
            record.dirty = false;
            record.updated = false;
        }
        inner.deleted.clear();
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.deleted.clear();
        inner.order_counter = 0;
    }
}
