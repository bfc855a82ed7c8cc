// engagement/src/shared.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared ownership with interior mutability over `parking_lot::RwLock`.
///
/// Holds projections handed to the presentation layer and the per-action
/// flow context. Guards are blocking and MUST NOT be held across `.await`.
#[derive(Debug)]
pub struct Shared<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> Shared<T> {
  pub fn new(data: T) -> Self {
    Shared(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Runs `f` under the write lock and returns its result.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    f(&mut self.write())
  }
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
  /// A detached copy, safe to keep across `.await` or serialize.
  pub fn snapshot(&self) -> T {
    self.read().clone()
  }
}

impl<T: Send + Sync + 'static> Clone for Shared<T> {
  fn clone(&self) -> Self {
    Shared(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for Shared<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
