/* src/prepare/rust/src/split/tests.rs */

use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::memo::{EffectState, ResolutionMemo};
use crate::render::{LifecycleEvent, render_to_string};
use crate::walker::prepare;

fn label(text: &'static str) -> ComponentType {
  ComponentType::from_fn(text, move |_, _| Ok(Node::text(text)))
}

fn error_view() -> ComponentType {
  ComponentType::from_fn("ErrorView", |props, _| {
    Ok(Node::text(format!("error {}", props["code"].as_str().unwrap_or_default())))
  })
}

struct RecordingLoader {
  seen: Arc<Mutex<Vec<Vec<ChunkId>>>>,
  fail: bool,
}

impl SplitLoader for RecordingLoader {
  fn load(&self, chunk_ids: &[ChunkId], _ctx: &Context) -> EffectFuture {
    self.seen.lock().unwrap().push(chunk_ids.to_vec());
    let fail = self.fail;
    async move {
      if fail {
        return Err(PrepareError::load("translations", "no catalog"));
      }
      Ok(())
    }
    .boxed()
  }
}

fn importer(
  calls: &Arc<AtomicUsize>,
  chunk_ids: Vec<ChunkId>,
  result: Result<ComponentType, PrepareError>,
) -> impl Fn() -> DynamicImport + Send + Sync + 'static {
  let calls = Arc::clone(calls);
  move || {
    calls.fetch_add(1, Ordering::SeqCst);
    let result = result.clone();
    DynamicImport::new(chunk_ids.clone(), async move { result }.boxed())
  }
}

fn dashboard(
  calls: &Arc<AtomicUsize>,
  result: Result<ComponentType, PrepareError>,
) -> AsyncComponentOptions {
  let load = importer(calls, vec![3, 7], result);
  AsyncComponentOptions::new("Dashboard", load, label("loading"), error_view())
}

fn with_loader(seen: &Arc<Mutex<Vec<Vec<ChunkId>>>>, fail: bool) -> Context {
  let loaders = SplitLoaders::new().with(RecordingLoader { seen: Arc::clone(seen), fail });
  Context::new().with_value(SPLIT_LOADERS_KEY, loaders)
}

#[tokio::test]
async fn prepare_loads_module_and_chunk_resources() {
  let calls = Arc::new(AtomicUsize::new(0));
  let seen = Arc::default();
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));

  let ctx = prepare(&tree, with_loader(&seen, false)).await.unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(*seen.lock().unwrap(), [vec![3, 7]]);
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "dashboard");
}

#[tokio::test]
async fn module_failure_renders_error_view() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split =
    with_async_component(dashboard(&calls, Err(PrepareError::load("Dashboard", "404"))));
  let tree = split.element("dashboard", json!({}));

  let ctx = prepare(&tree, Context::new()).await.unwrap();

  let state = ctx.memo().unwrap().state(&split.memo_key(&"dashboard".into()));
  assert_eq!(state, Some(EffectState::Resolved));
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "error LOAD_FAILED");
}

#[tokio::test]
async fn loader_failure_is_contained() {
  let calls = Arc::new(AtomicUsize::new(0));
  let seen = Arc::default();
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));

  let ctx = prepare(&tree, with_loader(&seen, true)).await.unwrap();
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "error LOAD_FAILED");
}

#[tokio::test]
async fn error_state_is_not_retried() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split =
    with_async_component(dashboard(&calls, Err(PrepareError::load("Dashboard", "404"))));
  let tree = split.element("dashboard", json!({}));

  prepare(&tree, Context::new()).await.unwrap();
  let ctx = prepare(&tree, Context::new()).await.unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "error LOAD_FAILED");
}

#[tokio::test]
async fn module_cache_hit_skips_load() {
  let calls = Arc::new(AtomicUsize::new(0));
  let cache = Arc::new(ModuleCache::new());
  cache.insert("Dashboard", label("cached"));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));
  let ctx = Context::new().with_value(MODULE_CACHE_KEY, Arc::clone(&cache));

  let ctx = prepare(&tree, ctx).await.unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 0);
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "cached");
}

#[tokio::test]
async fn loaded_module_populates_cache() {
  let calls = Arc::new(AtomicUsize::new(0));
  let cache = Arc::new(ModuleCache::new());
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let ctx = Context::new().with_value(MODULE_CACHE_KEY, Arc::clone(&cache));

  prepare(&split.element("dashboard", json!({})), ctx).await.unwrap();
  assert!(cache.contains("Dashboard"));
  assert!(!cache.contains("Settings"));
}

#[tokio::test]
async fn deferred_split_loads_on_render() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))).deferred());
  let tree = split.element("dashboard", json!({}));

  let ctx = prepare(&tree, Context::new()).await.unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 0);

  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "loading");
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  ctx.memo().unwrap().settle().await.unwrap();
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "dashboard");
}

#[tokio::test]
async fn client_only_render_mounts_then_forces_update() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));

  let out = render_to_string(&tree, &Context::new()).unwrap();
  assert_eq!(out.html, "loading");
  assert_eq!(out.effects.len(), 1);
  assert_eq!(out.effects[0].event, LifecycleEvent::Mount);

  assert!(out.run_effects().await.unwrap());
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(render_to_string(&tree, &Context::new()).unwrap().html, "dashboard");
}

#[tokio::test]
async fn cache_hit_renders_at_once_with_memo() {
  let calls = Arc::new(AtomicUsize::new(0));
  let cache = Arc::new(ModuleCache::new());
  cache.insert("Dashboard", label("cached"));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));
  let ctx = Context::new()
    .with_value(MODULE_CACHE_KEY, Arc::clone(&cache))
    .with_memo(ResolutionMemo::shared());

  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "cached");
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn later_passes_notify_their_own_loaders() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));

  let first = Arc::default();
  prepare(&tree, with_loader(&first, false)).await.unwrap();
  let second = Arc::default();
  let ctx = prepare(&tree, with_loader(&second, false)).await.unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(*first.lock().unwrap(), [vec![3, 7]]);
  assert_eq!(*second.lock().unwrap(), [vec![3, 7]]);
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "dashboard");
}

#[tokio::test]
async fn later_loader_failure_keeps_module() {
  let calls = Arc::new(AtomicUsize::new(0));
  let split = with_async_component(dashboard(&calls, Ok(label("dashboard"))));
  let tree = split.element("dashboard", json!({}));

  prepare(&tree, Context::new()).await.unwrap();
  let seen = Arc::default();
  let ctx = prepare(&tree, with_loader(&seen, true)).await.unwrap();

  assert_eq!(*seen.lock().unwrap(), [vec![3, 7]]);
  assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "dashboard");
}
