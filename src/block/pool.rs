
//! Reuse of scratch objects between block tasks.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use smallvec::SmallVec;


/// A bounded collection of idle objects.
///
/// A task takes an idle object or creates a new one, and the object returns
/// to the pool when the guard is dropped, also when the task fails or panics.
/// At most `capacity` objects are kept, additional returned objects are dropped.
#[derive(Debug)]
pub struct Pool<T> {
    idle: Mutex<SmallVec<[T; 8]>>,
    capacity: usize,
}

impl<T> Pool<T> {

    /// An empty pool that keeps up to `capacity` idle objects.
    /// The capacity should be the number of tasks that run at the same time.
    pub fn new(capacity: usize) -> Self {
        Pool { idle: Mutex::new(SmallVec::new()), capacity: capacity.max(1) }
    }

    /// Take an idle object, or create one if none is idle.
    /// The object is owned exclusively by the returned guard.
    pub fn acquire_or_else(&self, create: impl FnOnce() -> T) -> Pooled<'_, T> {
        let idle = self.lock().pop();
        let item = idle.unwrap_or_else(create);
        Pooled { pool: self, item: Some(item) }
    }

    /// The number of objects currently waiting to be reused.
    pub fn idle_count(&self) -> usize {
        self.lock().len()
    }

    /// The maximum number of idle objects.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, item: T) {
        let mut idle = self.lock();
        if idle.len() < self.capacity {
            idle.push(item);
        }
    }

    // a panicking task cannot leave the list in an inconsistent state,
    // as it never holds the lock while using an object
    fn lock(&self) -> std::sync::MutexGuard<'_, SmallVec<[T; 8]>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


/// An object taken from a pool. Returns the object to the pool when dropped.
#[derive(Debug)]
pub struct Pooled<'p, T> {
    pool: &'p Pool<T>,
    item: Option<T>,
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled object used after release")
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled object used after release")
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
