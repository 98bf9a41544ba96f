/* src/prepare/rust/src/lib.rs */

pub mod config;
pub mod context;
pub mod dispatched;
pub mod errors;
pub mod memo;
pub mod node;
pub mod prepared;
pub mod render;
pub mod split;
pub mod walker;

// Re-exports for ergonomic use
pub use config::{ErrorPolicy, PrepareOptions};
pub use context::{Context, ContextKey, ContextValue};
pub use dispatched::{Dispatch, STORE_KEY, Store, dispatched};
pub use errors::PrepareError;
pub use memo::{EffectFuture, EffectId, EffectState, MemoKey, ResolutionMemo, SharedEffect};
pub use node::{Component, ComponentId, ComponentType, Node, Props};
pub use prepared::{
  PreparedConfig, PreparedHoc, PreparedOptions, PreparedType, get_prepare, is_prepared, prepared,
};
pub use render::{LifecycleEvent, RenderOutput, Renderer, ScheduledEffect, render_to_string};
pub use split::{
  AsyncComponentOptions, ChunkId, DynamicImport, MODULE_CACHE_KEY, ModuleCache, SPLIT_LOADERS_KEY,
  SplitLoader, SplitLoaders, SplitState, with_async_component,
};
pub use walker::{Preparer, prepare};
