/* src/prepare/rust/src/memo.rs */

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Poll, Waker};

use futures_util::future::{BoxFuture, FutureExt, Shared, poll_fn, try_join_all};

use crate::errors::PrepareError;
use crate::node::ComponentId;

pub type EffectFuture = BoxFuture<'static, Result<(), PrepareError>>;

pub type SharedEffect = Shared<EffectFuture>;

/// Second half of a memo key. Distinguishes instances of the same prepared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(String);

impl EffectId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// The shared id older call sites relied on: one effect per type.
  pub fn default_id() -> Self {
    Self::new("defaultId")
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for EffectId {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

impl From<String> for EffectId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

impl fmt::Display for EffectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
  pub component: ComponentId,
  pub effect: EffectId,
}

impl MemoKey {
  pub fn new(component: ComponentId, effect: EffectId) -> Self {
    Self { component, effect }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectState {
  Pending,
  Resolved,
  Failed(PrepareError),
}

impl EffectState {
  pub fn is_settled(&self) -> bool {
    !matches!(self, Self::Pending)
  }
}

/// Where a reserved entry's effect lands once `compute` has produced it.
#[derive(Default)]
struct Slot {
  effect: Option<EffectFuture>,
  waker: Option<Waker>,
}

#[derive(Clone, Default)]
struct SlotHandle(Arc<Mutex<Slot>>);

impl SlotHandle {
  fn fill(&self, effect: EffectFuture) {
    let mut slot = lock(&self.0);
    slot.effect = Some(effect);
    if let Some(waker) = slot.waker.take() {
      waker.wake();
    }
  }

  /// Waits for the effect to be filled in, then drives it.
  fn wait(self) -> EffectFuture {
    let mut effect: Option<EffectFuture> = None;
    poll_fn(move |cx| {
      if effect.is_none() {
        let mut slot = lock(&self.0);
        match slot.effect.take() {
          Some(filled) => effect = Some(filled),
          None => {
            slot.waker = Some(cx.waker().clone());
            return Poll::Pending;
          }
        }
      }
      effect.as_mut().map_or(Poll::Pending, |effect| effect.poll_unpin(cx))
    })
    .boxed()
  }
}

struct Entry {
  state: Arc<Mutex<EffectState>>,
  future: SharedEffect,
}

impl Entry {
  /// An entry whose effect is supplied later through the returned slot.
  fn reserve() -> (Self, SlotHandle) {
    let slot = SlotHandle::default();
    let effect = slot.clone().wait();
    let state = Arc::new(Mutex::new(EffectState::Pending));
    let settled = Arc::clone(&state);
    let future = async move {
      let result = effect.await;
      *lock(&settled) = match &result {
        Ok(()) => EffectState::Resolved,
        Err(e) => EffectState::Failed(e.clone()),
      };
      result
    }
    .boxed()
    .shared();
    (Self { state, future }, slot)
  }

  fn state(&self) -> EffectState {
    lock(&self.state).clone()
  }
}

enum Reservation {
  Existing { future: SharedEffect, state: EffectState },
  Reserved { future: SharedEffect, slot: SlotHandle },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pass-scoped record of which side effects have been started and settled.
///
/// A key is reserved before its `compute` callback runs, and the callback
/// runs with the table unlocked, so an effect may query the memo while it
/// starts. Such a query sees its own key as `Pending`.
#[derive(Default)]
pub struct ResolutionMemo {
  entries: Mutex<HashMap<MemoKey, Entry>>,
}

impl ResolutionMemo {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn shared() -> Arc<Self> {
    Arc::new(Self::new())
  }

  /// Start the effect for `key` unless it already exists; either way return
  /// the shared handle to await.
  pub fn run<F>(&self, key: MemoKey, compute: F) -> SharedEffect
  where
    F: FnOnce() -> EffectFuture,
  {
    match self.reserve(key) {
      Reservation::Existing { future, .. } => future,
      Reservation::Reserved { future, slot } => {
        slot.fill(compute());
        future
      }
    }
  }

  /// Register the effect on first query (returning `false`), afterwards report
  /// whether it has settled. Never flips back to `false`.
  pub fn is_resolved<F>(&self, key: MemoKey, compute: F) -> bool
  where
    F: FnOnce() -> EffectFuture,
  {
    match self.reserve(key) {
      Reservation::Existing { state, .. } => state.is_settled(),
      Reservation::Reserved { slot, .. } => {
        slot.fill(compute());
        false
      }
    }
  }

  fn reserve(&self, key: MemoKey) -> Reservation {
    let mut entries = lock(&self.entries);
    if let Some(entry) = entries.get(&key) {
      return Reservation::Existing { future: entry.future.clone(), state: entry.state() };
    }
    let (entry, slot) = Entry::reserve();
    let future = entry.future.clone();
    entries.insert(key, entry);
    Reservation::Reserved { future, slot }
  }

  pub fn state(&self, key: &MemoKey) -> Option<EffectState> {
    lock(&self.entries).get(key).map(Entry::state)
  }

  /// Handles of every effect that has not settled yet.
  pub fn pending(&self) -> Vec<SharedEffect> {
    lock(&self.entries)
      .values()
      .filter(|entry| !entry.state().is_settled())
      .map(|entry| entry.future.clone())
      .collect()
  }

  /// Drive every registered effect to completion. Returns the first failure.
  pub async fn settle(&self) -> Result<(), PrepareError> {
    loop {
      let pending = self.pending();
      if pending.is_empty() {
        return Ok(());
      }
      try_join_all(pending).await?;
    }
  }

  pub fn len(&self) -> usize {
    lock(&self.entries).len()
  }

  pub fn is_empty(&self) -> bool {
    lock(&self.entries).is_empty()
  }
}

impl fmt::Debug for ResolutionMemo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResolutionMemo").field("entries", &self.len()).finish()
  }
}
