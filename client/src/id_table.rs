use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// Hands out sequential ids per key. A key keeps its id until removed, so
/// the same object is sent with the same id every time.
#[derive(Debug, Clone)]
pub struct IdTable<K> {
    ids: HashMap<K, i32>,
    next_id: i32,
}

impl<K: Hash + Eq> IdTable<K> {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next_id: 0,
        }
    }

    /// Id of `key`, assigning the next free one on first sight
    pub fn id_of(&mut self, key: K) -> i32 {
        let next_id = &mut self.next_id;
        *self.ids.entry(key).or_insert_with(|| {
            let id = *next_id;
            *next_id += 1;
            id
        })
    }

    pub fn get<Q>(&self, key: &Q) -> Option<i32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.get(key).copied()
    }

    /// Forgets `key`. Its id is not handed out again.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<i32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.remove(key)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.next_id = 0;
    }
}

impl<K: Hash + Eq> Default for IdTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
