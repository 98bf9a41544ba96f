/* src/prepare/rust/src/context.rs */

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::PrepareError;
use crate::memo::ResolutionMemo;

pub type ContextKey = &'static str;

pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Ambient values visible to a subtree.
///
/// Immutable snapshot: providers derive a new context for their children
/// instead of writing into a shared slot, so concurrently prepared siblings
/// never observe each other's bindings.
#[derive(Clone, Default)]
pub struct Context {
  values: Arc<HashMap<ContextKey, ContextValue>>,
  memo: Option<Arc<ResolutionMemo>>,
  preparing: bool,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Derive a context with `value` bound under `key`.
  pub fn with_value<T: Any + Send + Sync>(self, key: ContextKey, value: T) -> Self {
    self.with_raw(key, Arc::new(value))
  }

  pub(crate) fn with_raw(mut self, key: ContextKey, value: ContextValue) -> Self {
    Arc::make_mut(&mut self.values).insert(key, value);
    self
  }

  /// Overlay every binding of `other` on top of this context.
  pub fn merge(mut self, other: &Context) -> Self {
    if !other.values.is_empty() {
      let values = Arc::make_mut(&mut self.values);
      for (key, value) in other.values.iter() {
        values.insert(*key, value.clone());
      }
    }
    self
  }

  pub fn get<T: Any>(&self, key: ContextKey) -> Option<&T> {
    self.values.get(key).and_then(|v| v.downcast_ref::<T>())
  }

  pub fn require<T: Any>(&self, key: ContextKey) -> Result<&T, PrepareError> {
    self.get(key).ok_or_else(|| PrepareError::missing_context(key))
  }

  pub fn contains(&self, key: ContextKey) -> bool {
    self.values.contains_key(key)
  }

  pub fn with_memo(mut self, memo: Arc<ResolutionMemo>) -> Self {
    self.memo = Some(memo);
    self
  }

  pub fn memo(&self) -> Option<&Arc<ResolutionMemo>> {
    self.memo.as_ref()
  }

  /// True only inside a `prepare` walk.
  pub fn is_preparing(&self) -> bool {
    self.preparing
  }

  pub(crate) fn preparing(mut self, preparing: bool) -> Self {
    self.preparing = preparing;
    self
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut keys: Vec<_> = self.values.keys().collect();
    keys.sort();
    f.debug_struct("Context")
      .field("keys", &keys)
      .field("memo", &self.memo.is_some())
      .field("preparing", &self.preparing)
      .finish()
  }
}
