/* src/prepare/rust/src/prepared.rs */

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::context::Context;
use crate::memo::{EffectFuture, EffectId, MemoKey};
use crate::node::{ComponentId, ComponentType, Node, PreparedElement, Props};

pub type SideEffectFn = Arc<dyn Fn(&Props, &Context) -> EffectFuture + Send + Sync>;

pub type ReadyFn = Arc<dyn Fn(&Props, &Context) -> bool + Send + Sync>;

/// Behaviour switches of a prepared type. Accepts both snake_case and the
/// camelCase names used by JS-side configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreparedOptions {
  /// Run the effect while preparing but do not expand descendants.
  pub boundary: bool,
  /// Skip the effect and the descendants while preparing.
  pub defer: bool,
  #[serde(alias = "componentDidMount")]
  pub component_did_mount: bool,
  #[serde(alias = "componentWillReceiveProps")]
  pub component_will_receive_props: bool,
  #[serde(alias = "componentDidUpdate")]
  pub component_did_update: bool,
  #[serde(alias = "forceUpdate")]
  pub force_update: bool,
}

impl Default for PreparedOptions {
  fn default() -> Self {
    Self {
      boundary: false,
      defer: false,
      component_did_mount: true,
      component_will_receive_props: false,
      component_did_update: false,
      force_update: false,
    }
  }
}

#[derive(Clone)]
pub struct PreparedConfig {
  side_effect: SideEffectFn,
  ready: Option<ReadyFn>,
  options: PreparedOptions,
}

impl PreparedConfig {
  pub fn options(&self) -> &PreparedOptions {
    &self.options
  }

  pub fn boundary(&self) -> bool {
    self.options.boundary
  }

  pub fn defer(&self) -> bool {
    self.options.defer
  }

  pub fn side_effect(&self, props: &Props, ctx: &Context) -> EffectFuture {
    (self.side_effect)(props, ctx)
  }

  /// Whether the content can render now, before the memo has seen the effect.
  pub fn is_ready(&self, props: &Props, ctx: &Context) -> bool {
    self.ready.as_ref().is_some_and(|ready| ready(props, ctx))
  }
}

impl fmt::Debug for PreparedConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PreparedConfig").field("options", &self.options).finish_non_exhaustive()
  }
}

/// Higher-order wrapper returned by [`prepared`].
pub struct PreparedHoc {
  config: Arc<PreparedConfig>,
  error: Option<ComponentType>,
}

/// Declare an async side effect that must settle before the wrapped
/// component's subtree renders.
pub fn prepared<F>(side_effect: F, options: PreparedOptions) -> PreparedHoc
where
  F: Fn(&Props, &Context) -> EffectFuture + Send + Sync + 'static,
{
  PreparedHoc {
    config: Arc::new(PreparedConfig { side_effect: Arc::new(side_effect), ready: None, options }),
    error: None,
  }
}

impl PreparedHoc {
  /// Component rendered in place of the wrapped one when its effect failed.
  /// Receives `{ "error": message, "code": code }` as props.
  pub fn on_error(mut self, fallback: ComponentType) -> Self {
    self.error = Some(fallback);
    self
  }

  /// Synchronous check that lets the render pass show the content without
  /// waiting on the memo, e.g. when the data is already at hand.
  pub fn ready_when<F>(mut self, ready: F) -> Self
  where
    F: Fn(&Props, &Context) -> bool + Send + Sync + 'static,
  {
    Arc::make_mut(&mut self.config).ready = Some(Arc::new(ready));
    self
  }

  pub fn config(&self) -> &PreparedConfig {
    &self.config
  }

  /// Every call yields a new type with its own identity.
  pub fn wrap(&self, inner: ComponentType) -> PreparedType {
    PreparedType {
      id: ComponentId::next(),
      name: format!("prepared({})", inner.name()).into(),
      config: Arc::clone(&self.config),
      inner,
      error: self.error.clone(),
    }
  }
}

#[derive(Clone)]
pub struct PreparedType {
  id: ComponentId,
  name: Arc<str>,
  config: Arc<PreparedConfig>,
  inner: ComponentType,
  error: Option<ComponentType>,
}

impl PreparedType {
  pub fn id(&self) -> ComponentId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn config(&self) -> &PreparedConfig {
    &self.config
  }

  pub fn inner(&self) -> &ComponentType {
    &self.inner
  }

  pub fn error_fallback(&self) -> Option<&ComponentType> {
    self.error.as_ref()
  }

  /// An instance of this type. `effect_id` must be unique among instances
  /// rendered in the same pass whose effects should run separately.
  pub fn element(&self, effect_id: impl Into<EffectId>, props: Props) -> Node {
    Node::Prepared(PreparedElement { ty: self.clone(), effect_id: effect_id.into(), props })
  }

  pub fn memo_key(&self, effect_id: &EffectId) -> MemoKey {
    MemoKey::new(self.id, effect_id.clone())
  }

  pub(crate) fn start_effect(
    &self,
    effect_id: &EffectId,
    props: &Props,
    ctx: &Context,
  ) -> EffectFuture {
    tracing::debug!(component = %self.name, effect = %effect_id, "invoking side effect");
    self.config.side_effect(props, ctx)
  }
}

impl fmt::Debug for PreparedType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PreparedType")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("config", &self.config)
      .finish()
  }
}

pub fn is_prepared(node: &Node) -> bool {
  get_prepare(node).is_some()
}

pub fn get_prepare(node: &Node) -> Option<&PreparedConfig> {
  match node {
    Node::Prepared(el) => Some(el.ty.config()),
    _ => None,
  }
}
