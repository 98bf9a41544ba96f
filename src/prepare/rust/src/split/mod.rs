/* src/prepare/rust/src/split/mod.rs */

// Code-split components: a prepared side effect that loads a module plus
// whatever chunk-scoped resources registered loaders need (translations).

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, ready, try_join, try_join_all};
use serde_json::json;

use crate::context::{Context, ContextKey};
use crate::errors::PrepareError;
use crate::memo::EffectFuture;
use crate::node::{Component, ComponentType, Node, Props};
use crate::prepared::{PreparedOptions, PreparedType, prepared};

pub type ChunkId = u32;

/// Context key of the [`SplitLoaders`] notified for every loaded module.
pub const SPLIT_LOADERS_KEY: ContextKey = "split.loaders";

/// Context key of the client-side [`ModuleCache`].
pub const MODULE_CACHE_KEY: ContextKey = "split.module_cache";

pub type ModuleFuture = BoxFuture<'static, Result<ComponentType, PrepareError>>;

pub type LoadFn = Arc<dyn Fn() -> DynamicImport + Send + Sync>;

/// A started dynamic import together with the chunks the bundler placed the
/// module in.
pub struct DynamicImport {
  pub chunk_ids: Vec<ChunkId>,
  pub module: ModuleFuture,
}

impl DynamicImport {
  pub fn new(chunk_ids: Vec<ChunkId>, module: ModuleFuture) -> Self {
    Self { chunk_ids, module }
  }
}

/// Fetches chunk-scoped resources alongside a split module.
pub trait SplitLoader: Send + Sync {
  fn load(&self, chunk_ids: &[ChunkId], ctx: &Context) -> EffectFuture;
}

#[derive(Clone, Default)]
pub struct SplitLoaders(Vec<Arc<dyn SplitLoader>>);

impl SplitLoaders {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, loader: impl SplitLoader + 'static) -> Self {
    self.0.push(Arc::new(loader));
    self
  }

  pub fn push(&mut self, loader: Arc<dyn SplitLoader>) {
    self.0.push(loader);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Modules already present on the client, keyed by module id.
#[derive(Default)]
pub struct ModuleCache {
  modules: RwLock<HashMap<String, ComponentType>>,
}

impl ModuleCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, module_id: impl Into<String>, component: ComponentType) {
    let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
    modules.insert(module_id.into(), component);
  }

  pub fn get(&self, module_id: &str) -> Option<ComponentType> {
    self.modules.read().unwrap_or_else(PoisonError::into_inner).get(module_id).cloned()
  }

  pub fn contains(&self, module_id: &str) -> bool {
    self.get(module_id).is_some()
  }
}

#[derive(Debug, Clone)]
pub enum SplitState {
  Loading,
  Ready(ComponentType),
  /// Terminal: a failed module is never retried.
  Error(PrepareError),
}

pub struct AsyncComponentOptions {
  pub module_id: String,
  pub defer: bool,
  pub load: LoadFn,
  pub loading: ComponentType,
  pub error: ComponentType,
}

impl AsyncComponentOptions {
  pub fn new<F>(
    module_id: impl Into<String>,
    load: F,
    loading: ComponentType,
    error: ComponentType,
  ) -> Self
  where
    F: Fn() -> DynamicImport + Send + Sync + 'static,
  {
    Self { module_id: module_id.into(), defer: false, load: Arc::new(load), loading, error }
  }

  pub fn deferred(mut self) -> Self {
    self.defer = true;
    self
  }
}

struct SplitModule {
  module_id: String,
  load: LoadFn,
  state: Mutex<SplitState>,
  /// Chunks reported by the first import, replayed to loaders on later passes.
  chunk_ids: Mutex<Vec<ChunkId>>,
}

impl SplitModule {
  fn lock(&self) -> MutexGuard<'_, SplitState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current state, promoting a module cache hit to `Ready` on the spot.
  fn current(&self, ctx: &Context) -> SplitState {
    let mut state = self.lock();
    if matches!(*state, SplitState::Loading)
      && let Some(component) = cached(ctx, &self.module_id)
    {
      *state = SplitState::Ready(component);
    }
    state.clone()
  }

  /// The module is imported at most once. Every pass still hands its chunk
  /// ids to the loaders of that pass, so per-request resources such as
  /// translations are fetched again for each context.
  fn resolve(self: Arc<Self>, ctx: &Context) -> EffectFuture {
    match self.current(ctx) {
      SplitState::Loading => self.import(ctx),
      SplitState::Ready(_) => self.notify(ctx),
      SplitState::Error(_) => ready(Ok(())).boxed(),
    }
  }

  fn import(self: Arc<Self>, ctx: &Context) -> EffectFuture {
    let DynamicImport { chunk_ids, module } = (self.load)();
    let loaders = loaders(ctx);
    let nested = try_join_all(loaders.0.iter().map(|loader| loader.load(&chunk_ids, ctx)));
    let cache = ctx.get::<Arc<ModuleCache>>(MODULE_CACHE_KEY).cloned();
    tracing::debug!(
      module = %self.module_id,
      chunks = ?chunk_ids,
      loaders = loaders.len(),
      "loading split module"
    );

    async move {
      let next = match try_join(module, nested).await {
        Ok((component, _)) => {
          if let Some(cache) = cache {
            cache.insert(self.module_id.clone(), component.clone());
          }
          *self.chunk_ids.lock().unwrap_or_else(PoisonError::into_inner) = chunk_ids;
          SplitState::Ready(component)
        }
        Err(err) => {
          tracing::warn!(module = %self.module_id, error = %err, "split module failed to load");
          SplitState::Error(err)
        }
      };
      *self.lock() = next;
      Ok(())
    }
    .boxed()
  }

  /// Loader failures here leave the already loaded module in place.
  fn notify(self: Arc<Self>, ctx: &Context) -> EffectFuture {
    let chunk_ids = self.chunk_ids.lock().unwrap_or_else(PoisonError::into_inner).clone();
    let loaders = loaders(ctx);
    if chunk_ids.is_empty() || loaders.is_empty() {
      return ready(Ok(())).boxed();
    }
    tracing::debug!(module = %self.module_id, chunks = ?chunk_ids, "reusing split module");
    let pending = try_join_all(loaders.0.iter().map(|loader| loader.load(&chunk_ids, ctx)));
    async move {
      if let Err(err) = pending.await {
        tracing::warn!(module = %self.module_id, error = %err, "split chunk resources failed");
      }
      Ok(())
    }
    .boxed()
  }
}

fn loaders(ctx: &Context) -> SplitLoaders {
  ctx.get::<SplitLoaders>(SPLIT_LOADERS_KEY).cloned().unwrap_or_default()
}

fn cached(ctx: &Context, module_id: &str) -> Option<ComponentType> {
  ctx.get::<Arc<ModuleCache>>(MODULE_CACHE_KEY).and_then(|cache| cache.get(module_id))
}

struct SplitView {
  module: Arc<SplitModule>,
  loading: ComponentType,
  error: ComponentType,
}

impl Component for SplitView {
  fn render(&self, props: &Props, ctx: &Context) -> Result<Node, PrepareError> {
    Ok(match self.module.current(ctx) {
      SplitState::Loading => self.loading.element(props.clone()),
      SplitState::Ready(component) => component.element(props.clone()),
      SplitState::Error(err) => {
        self.error.element(json!({ "error": err.to_string(), "code": err.code() }))
      }
    })
  }
}

/// A prepared component that loads its implementation on demand.
///
/// Load failures are contained: the component switches to its error state
/// instead of failing the prepare pass.
pub fn with_async_component(options: AsyncComponentOptions) -> PreparedType {
  let AsyncComponentOptions { module_id, defer, load, loading, error } = options;
  let module = Arc::new(SplitModule {
    module_id: module_id.clone(),
    load,
    state: Mutex::new(SplitState::Loading),
    chunk_ids: Mutex::new(Vec::new()),
  });

  let effect_module = Arc::clone(&module);
  let ready_module = Arc::clone(&module);
  let view =
    ComponentType::new(format!("split({module_id})"), SplitView { module, loading, error });
  let options = PreparedOptions { defer, force_update: true, ..PreparedOptions::default() };
  prepared(move |_props: &Props, ctx: &Context| Arc::clone(&effect_module).resolve(ctx), options)
    .ready_when(move |_props, ctx| !matches!(ready_module.current(ctx), SplitState::Loading))
    .wrap(view)
}
