use std::{
    collections::{hash_map::Entry, HashMap},
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use crate::{
    asset::{Asset, Texture, TextureFormat, TextureType},
    constants::INVALID_ID,
    identifier::Identifier,
    managers::task::Task,
};

struct TextureRecord {
    asset: Arc<Asset>,
    id: i32,
    order: u32,
    checksum: u64,
    dirty: bool,
    updated: bool,
    /// False until the first file read finished
    loaded: bool,
    mtime: Option<SystemTime>,
    task: Option<Task<Option<Texture>>>,
}

impl TextureRecord {
    fn apply(&mut self, texture: Texture, always_mark_dirty: bool) {
        let checksum = texture.checksum();
        if always_mark_dirty || !self.loaded || checksum != self.checksum {
            self.dirty = true;
        }
        self.checksum = checksum;
        self.asset = Arc::new(Asset::Texture(texture));
        self.loaded = true;
    }

    fn wait_task(&mut self, always_mark_dirty: bool) {
        if let Some(task) = self.task.take() {
            match task.wait() {
                Some(texture) => self.apply(texture, always_mark_dirty),
                // read failed, retry on the next add_file
                None => self.mtime = None,
            }
        }
    }
}

struct Inner {
    records: HashMap<String, TextureRecord>,
    deleted: Vec<Identifier>,
    order_counter: u32,
    id_seed: i32,
    always_mark_dirty: bool,
}

impl Inner {
    fn wait_tasks(&mut self) {
        let always_mark_dirty = self.always_mark_dirty;
        for record in self.records.values_mut() {
            record.wait_task(always_mark_dirty);
        }
    }

    /// Finds or creates the record for `name`, waiting out any task on it.
    fn prepare(&mut self, name: &str, requested_id: i32) -> &mut TextureRecord {
        self.deleted.retain(|identifier| identifier.name != name);
        let always_mark_dirty = self.always_mark_dirty;
        let record = match self.records.entry(name.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let id = if requested_id == INVALID_ID {
                    self.id_seed += 1;
                    self.id_seed
                } else {
                    requested_id
                };
                self.order_counter += 1;
                let mut placeholder = Texture::new(name);
                placeholder.id = id;
                entry.insert(TextureRecord {
                    asset: Arc::new(Asset::Texture(placeholder)),
                    id,
                    order: self.order_counter,
                    checksum: 0,
                    dirty: true,
                    updated: true,
                    loaded: false,
                    mtime: None,
                    task: None,
                })
            }
        };
        record.wait_task(always_mark_dirty);
        record.updated = true;
        record
    }

    fn sorted_by<F>(&self, filter: F) -> Vec<Arc<Asset>>
    where
        F: Fn(&TextureRecord) -> bool,
    {
        let mut records: Vec<&TextureRecord> = self
            .records
            .values()
            .filter(|record| record.loaded && filter(*record))
            .collect();
        records.sort_by_key(|record| record.order);
        records.into_iter().map(|record| record.asset.clone()).collect()
    }
}

/// Dirty tracking for textures, keyed by name. Textures added from files
/// are read on the rayon pool, and skipped entirely while the file's
/// modification time is unchanged.
pub struct TextureManager {
    inner: Mutex<Inner>,
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                deleted: Vec::new(),
                order_counter: 0,
                id_seed: fastrand::i32(0..0x7000_0000),
                always_mark_dirty: false,
            }),
        }
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

    /// Inserts or updates a texture, assigning an id when it has none.
    /// Returns the id in use.
    pub fn add(&self, mut texture: Texture) -> i32 {
        let mut inner = self.lock();
        let always_mark_dirty = inner.always_mark_dirty;
        let name = texture.name.clone();
        let record = inner.prepare(&name, texture.id);
        texture.id = record.id;
        record.mtime = None;
        record.apply(texture, always_mark_dirty);
        record.id
    }

    pub fn add_image(
        &self,
        name: impl Into<String>,
        width: i32,
        height: i32,
        data: Vec<u8>,
        format: TextureFormat,
    ) -> i32 {
        let mut texture = Texture::new(name);
        texture.width = width;
        texture.height = height;
        texture.format = format;
        texture.data = data;
        self.add(texture)
    }

    /// Registers the file at `path`. The contents are read in the background
    /// and only when the modification time moved since the last read.
    /// Returns [`INVALID_ID`] when the file can't be inspected.
    pub fn add_file(&self, path: impl AsRef<Path>, texture_type: TextureType) -> i32 {
        let path = path.as_ref();
        let mtime = match fs::metadata(path) {
            Ok(metadata) => metadata.modified().ok(),
            Err(error) => {
                log::warn!("texture file {} is not readable: {}", path.display(), error);
                return INVALID_ID;
            }
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut inner = self.lock();
        let record = inner.prepare(&name, INVALID_ID);
        if record.loaded && mtime.is_some() && record.mtime == mtime {
            return record.id;
        }
        record.mtime = mtime;

        let id = record.id;
        let path = path.to_path_buf();
        let read = move || match fs::read(&path) {
            Ok(data) => {
                let mut texture = Texture::new(name);
                texture.id = id;
                texture.texture_type = texture_type;
                texture.format = TextureFormat::RawFile;
                texture.data = data;
                Some(texture)
            }
            Err(error) => {
                log::warn!("failed to read texture {}: {}", path.display(), error);
                None
            }
        };
        record.task = Some(Task::spawn(read));
        id
    }

    /// Waits for pending file reads, then looks the texture up.
    pub fn find(&self, name: &str) -> Option<Arc<Asset>> {
        let mut inner = self.lock();
        let always_mark_dirty = inner.always_mark_dirty;
        let record = inner.records.get_mut(name)?;
        record.wait_task(always_mark_dirty);
        record.loaded.then(|| record.asset.clone())
    }

    pub fn erase(&self, name: &str) -> bool {
        let mut inner = self.lock();
        match inner.records.remove(name) {
            Some(record) => {
                inner.deleted.push(Identifier::new(name, record.id));
                true
            }
            None => false,
        }
    }

    pub fn get_all_textures(&self) -> Vec<Arc<Asset>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner.sorted_by(|_| true)
    }

    pub fn get_dirty_textures(&self) -> Vec<Arc<Asset>> {
        let mut inner = self.lock();
        inner.wait_tasks();
        inner.sorted_by(|record| record.dirty)
    }

    pub fn get_deleted(&self) -> Vec<Identifier> {
        self.lock().deleted.clone()
    }

    pub fn erase_stale_textures(&self) -> usize {
        let mut inner = self.lock();
        inner.wait_tasks();
        let inner = &mut *inner;
        let before = inner.records.len();
        let deleted = &mut inner.deleted;
        inner.records.retain(|name, record| {
            if !record.updated {
                deleted.push(Identifier::new(name.clone(), record.id));
            }
            record.updated
        });
        before - inner.records.len()
    }

    pub fn make_dirty_all(&self) {
        let mut inner = self.lock();
        inner.wait_tasks();
        for record in inner.records.values_mut() {
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
        inner.wait_tasks();
        inner.records.clear();
        inner.deleted.clear();
        inner.order_counter = 0;
    }
}
