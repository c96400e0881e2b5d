use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{identifier::Identifier, managers::task::Task, scene::Entity};

type Checksums = (u64, u64);

struct EntityRecord {
    entity: Arc<Entity>,
    order: u32,
    checksum_trans: u64,
    checksum_geom: u64,
    dirty_trans: bool,
    dirty_geom: bool,
    updated: bool,
    task: Option<Task<Checksums>>,
}

impl EntityRecord {
    fn new(entity: Arc<Entity>, order: u32) -> Self {
        let is_geometry = entity.is_geometry();
        Self {
            entity,
            order,
            checksum_trans: 0,
            checksum_geom: 0,
            dirty_trans: true,
            dirty_geom: is_geometry,
            updated: true,
            task: None,
        }
    }

    fn apply_checksums(&mut self, (trans, geom): Checksums, always_mark_dirty: bool) {
        if self.entity.is_geometry() && (always_mark_dirty || geom != self.checksum_geom) {
            self.dirty_geom = true;
        } else if always_mark_dirty || trans != self.checksum_trans {
            self.dirty_trans = true;
        }
        self.checksum_trans = trans;
        self.checksum_geom = geom;
    }

    /// Joins the in-flight checksum task, if any. A panic inside the task is
    /// re-raised on the caller.
    fn wait_task(&mut self, always_mark_dirty: bool) {
        if let Some(task) = self.task.take() {
            self.apply_checksums(task.wait(), always_mark_dirty);
        }
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, EntityRecord>,
    deleted: Vec<Identifier>,
    order_counter: u32,
    always_mark_dirty: bool,
}

impl Inner {
    fn wait_tasks(&mut self) {
        let always_mark_dirty = self.always_mark_dirty;
        for record in self.records.values_mut() {
            record.wait_task(always_mark_dirty);
        }
    }

    fn sorted_by<F>(&self, filter: F) -> Vec<&EntityRecord>
    where
        F: Fn(&EntityRecord) -> bool,
    {
        let mut records: Vec<&EntityRecord> =
            self.records.values().filter(|record| filter(*record)).collect();
        records.sort_by_key(|record| record.order);
        records
    }

    fn erase_where<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&EntityRecord) -> bool,
    {
        let before = self.records.len();
        let deleted = &mut self.deleted;
        self.records.retain(|_, record| {
            if filter(&*record) {
                deleted.push(record.entity.identifier());
                false
            } else {
                true
            }
        });
        before - self.records.len()
    }
}

/// Tracks which entities changed since the last successful send.
///
/// Records are keyed by path and remember the order they were first added
/// in, so every list this returns follows the source scene's order. Geometry
/// checksums are computed on the rayon pool per add and joined before any
/// read; at most one such task is in flight per record.
#[derive(Default)]
pub struct EntityManager {
    inner: Mutex<Inner>,
}

impl EntityManager {
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

    /// Inserts or updates the entity at its path. Clears any pending delete
    /// of the same path.
    pub fn add(&self, mut entity: Entity) {
        let mut inner = self.lock();
        let inner = &mut *inner;
        let path = entity.path().to_owned();
        inner.deleted.retain(|identifier| identifier.name != path);
        let always_mark_dirty = inner.always_mark_dirty;

        let order = match inner.records.get_mut(&path) {
            Some(record) => {
                record.wait_task(always_mark_dirty);
                record.order
            }
            None => {
                inner.order_counter += 1;
                inner.order_counter
            }
        };
        entity.transform_mut().order = order;
        let entity = Arc::new(entity);

        let record = inner
            .records
            .entry(path)
            .or_insert_with(|| EntityRecord::new(entity.clone(), order));
        record.entity = entity.clone();
        record.updated = true;

        if !entity.is_geometry() {
            record.apply_checksums((entity.checksum_trans(), 0), always_mark_dirty);
            return;
        }

        record.task = Some(Task::spawn(move || {
            (entity.checksum_trans(), entity.checksum_geom())
        }));
    }

    /// Keeps the entity at `path` alive for this cycle without re-checking it.
    pub fn touch(&self, path: &str) -> bool {
        match self.lock().records.get_mut(path) {
            Some(record) => {
                record.updated = true;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, path: &str) -> Option<Arc<Entity>> {
        self.lock().records.get(path).map(|record| record.entity.clone())
    }

    pub fn erase(&self, path: &str) -> bool {
        let mut inner = self.lock();
        match inner.records.remove(path) {
            Some(record) => {
                inner.deleted.push(record.entity.identifier());
                true
            }
            None => false,
        }
    }

    pub fn erase_by_id(&self, id: i32) -> bool {
        self.lock().erase_where(|record| record.entity.transform().id == id) > 0
    }

    pub fn erase_identifier(&self, identifier: &Identifier) -> bool {
        self.lock()
            .erase_where(|record| identifier.matches(&record.entity.identifier()))
            > 0
    }

    pub fn get_all_entities(&self) -> Vec<Arc<Entity>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner
            .sorted_by(|_| true)
            .into_iter()
            .map(|record| record.entity.clone())
            .collect()
    }

    /// Entities whose transform changed. Geometry whose vertex data is
    /// unchanged comes back as a transform-only copy.
    pub fn get_dirty_transforms(&self) -> Vec<Arc<Entity>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner
            .sorted_by(|record| record.dirty_trans && !record.dirty_geom)
            .into_iter()
            .map(|record| {
                if record.entity.is_geometry() {
                    Arc::new(record.entity.to_transform_only())
                } else {
                    record.entity.clone()
                }
            })
            .collect()
    }

    pub fn get_dirty_geometries(&self) -> Vec<Arc<Entity>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner
            .sorted_by(|record| record.dirty_geom)
            .into_iter()
            .map(|record| record.entity.clone())
            .collect()
    }

    /// Entities not added or touched since the flags were last cleared
    pub fn get_stale_entities(&self) -> Vec<Arc<Entity>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner
            .sorted_by(|record| !record.updated)
            .into_iter()
            .map(|record| record.entity.clone())
            .collect()
    }

    pub fn get_deleted(&self) -> Vec<Identifier> {
        self.lock().deleted.clone()
    }

    /// Erases every entity not updated this cycle and records it as deleted.
    pub fn erase_stale_entities(&self) -> usize {
        let mut inner = self.lock();
        inner.wait_tasks();
        let erased = inner.erase_where(|record| !record.updated);
        if erased > 0 {
            log::trace!("erased {} stale entities", erased);
        }
        erased
    }

    pub fn make_dirty_all(&self) {
        let mut inner = self.lock();
        inner.wait_tasks();
        for record in inner.records.values_mut() {
            record.dirty_trans = true;
            record.dirty_geom = record.entity.is_geometry();
        }
    }

    pub fn set_always_mark_dirty(&self, value: bool) {
        self.lock().always_mark_dirty = value;
    }

    /// Call after a send succeeded. Tasks still in flight belong to the next
    /// cycle and are left alone.
    pub fn clear_dirty_flags(&self) {
        let mut inner = self.lock();
        for record in inner.records.values_mut() {
            record.updated = false;
            record.dirty_trans = false;
            record.dirty_geom = false;
        }
        inner.deleted.clear();
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner.records.clear();
        inner.deleted.clear();
        inner.order_counter = 0;
    }
}
