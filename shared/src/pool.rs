use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex},
};

/// Something that can be handed out again after being reset
pub trait Poolable: Default + Send {
    fn reset(&mut self);
}

impl<T: Send> Poolable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// A free list of reusable objects. Values taken from the pool go back into it
/// when their [`Pooled`] handle is dropped, up to `capacity` retained values.
pub struct Pool<T: Poolable> {
    free: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Poolable> Pool<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            free: Mutex::new(Vec::new()),
            capacity,
        })
    }

    /// Takes a recycled value if one is available, else allocates a fresh one.
    pub fn take(self: &Arc<Self>) -> Pooled<T> {
        let recycled = self.free.lock().ok().and_then(|mut free| free.pop());
        Pooled {
            value: Some(recycled.unwrap_or_default()),
            pool: self.clone(),
        }
    }

    /// Number of values waiting to be reused
    pub fn available(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    fn give_back(&self, mut value: T) {
        value.reset();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.capacity {
                free.push(value);
            }
        }
    }
}

/// Owning handle to a pooled value
pub struct Pooled<T: Poolable> {
    value: Option<T>,
    pool: Arc<Pool<T>>,
}

impl<T: Poolable> Pooled<T> {
    /// Detaches the value from the pool so it is not recycled.
    pub fn into_inner(mut self) -> T {
        self.value.take().unwrap_or_default()
    }
}

impl<T: Poolable> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop or into_inner"),
        }
    }
}

impl<T: Poolable> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop or into_inner"),
        }
    }
}

impl<T: Poolable> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.give_back(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_reused_after_drop() {
        let pool: Arc<Pool<Vec<u8>>> = Pool::new(4);
        {
            let mut buffer = pool.take();
            buffer.extend_from_slice(&[1, 2, 3]);
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);

        let buffer = pool.take();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 3);
    }

    #[test]
    fn capacity_bounds_retained_values() {
        let pool: Arc<Pool<Vec<u8>>> = Pool::new(1);
        let a = pool.take();
        let b = pool.take();
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn into_inner_skips_recycling() {
        let pool: Arc<Pool<Vec<u8>>> = Pool::new(4);
        let mut buffer = pool.take();
        buffer.push(9);
        let owned = buffer.into_inner();
        assert_eq!(owned, vec![9]);
        assert_eq!(pool.available(), 0);
    }
}
