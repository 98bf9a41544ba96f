/* src/i18n/rust/src/chunk_map.rs */

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use spool_prepare::ChunkId;

/// translation key -> files referencing it
type KeyFiles = HashMap<String, BTreeSet<String>>;

/// Which translation keys each bundle chunk needs, tracked per source file.
///
/// A (chunk, key) pair stays present while at least one registered file
/// references it. Shared by every concurrent render of a server instance;
/// readers never observe a half-applied add or dispose.
#[derive(Debug, Default)]
pub struct ChunkTranslationMap {
  chunks: RwLock<BTreeMap<ChunkId, KeyFiles>>,
}

impl ChunkTranslationMap {
  pub fn new() -> Self {
    Self::default()
  }

  fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ChunkId, KeyFiles>> {
    self.chunks.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ChunkId, KeyFiles>> {
    self.chunks.write().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register `keys` as used by `file`, which the bundler placed in `chunk_ids`.
  pub fn add<K: AsRef<str>>(&self, file: &str, chunk_ids: &[ChunkId], keys: &[K]) {
    let mut chunks = self.write();
    for &chunk_id in chunk_ids {
      let entry = chunks.entry(chunk_id).or_default();
      for key in keys {
        entry.entry(key.as_ref().to_string()).or_default().insert(file.to_string());
      }
    }
  }

  /// Undo an [`add`](Self::add). Pairs still referenced by other files stay.
  pub fn dispose<K: AsRef<str>>(&self, file: &str, chunk_ids: &[ChunkId], keys: &[K]) {
    let mut chunks = self.write();
    for chunk_id in chunk_ids {
      let Some(entry) = chunks.get_mut(chunk_id) else {
        continue;
      };
      for key in keys {
        let key = key.as_ref();
        if let Some(files) = entry.get_mut(key) {
          files.remove(file);
          if files.is_empty() {
            entry.remove(key);
          }
        }
      }
      if entry.is_empty() {
        chunks.remove(chunk_id);
      }
    }
  }

  pub fn translations_for_chunk(&self, chunk_id: ChunkId) -> BTreeSet<String> {
    self.read().get(&chunk_id).map(|keys| keys.keys().cloned().collect()).unwrap_or_default()
  }

  /// Union of the keys of every chunk in `chunk_ids`.
  pub fn translations_for_chunks(&self, chunk_ids: &[ChunkId]) -> BTreeSet<String> {
    let chunks = self.read();
    chunk_ids
      .iter()
      .filter_map(|id| chunks.get(id))
      .flat_map(|keys| keys.keys().cloned())
      .collect()
  }

  pub fn chunk_ids(&self) -> Vec<ChunkId> {
    self.read().keys().copied().collect()
  }

  pub fn is_empty(&self) -> bool {
    self.read().is_empty()
  }
}
