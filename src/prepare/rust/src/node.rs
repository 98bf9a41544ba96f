/* src/prepare/rust/src/node.rs */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::context::{Context, ContextKey, ContextValue};
use crate::errors::PrepareError;
use crate::memo::EffectId;
use crate::prepared::PreparedType;

pub type Props = Value;

pub type RenderFn = Arc<dyn Fn(&Props, &Context) -> Result<Node, PrepareError> + Send + Sync>;

pub type ConsumerFn = Arc<dyn Fn(&Context) -> Result<Node, PrepareError> + Send + Sync>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a component type. First half of every memo key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
  pub(crate) fn next() -> Self {
    Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  pub fn as_u64(self) -> u64 {
    self.0
  }
}

/// Composite component: renders props into more nodes.
pub trait Component: Send + Sync {
  fn render(&self, props: &Props, ctx: &Context) -> Result<Node, PrepareError>;

  /// Context handed to the rendered children. Defaults to the parent's.
  fn child_context(&self, _props: &Props, ctx: &Context) -> Context {
    ctx.clone()
  }

  /// Runs before `render`, in both the prepare walk and a real render.
  fn will_mount(&self, _props: &Props, _ctx: &Context) {}
}

struct FnComponent {
  render: RenderFn,
}

impl Component for FnComponent {
  fn render(&self, props: &Props, ctx: &Context) -> Result<Node, PrepareError> {
    (self.render)(props, ctx)
  }
}

#[derive(Clone)]
pub struct ComponentType {
  id: ComponentId,
  name: Arc<str>,
  imp: Arc<dyn Component>,
}

impl ComponentType {
  pub fn new(name: impl Into<Arc<str>>, component: impl Component + 'static) -> Self {
    Self { id: ComponentId::next(), name: name.into(), imp: Arc::new(component) }
  }

  pub fn from_fn<F>(name: impl Into<Arc<str>>, render: F) -> Self
  where
    F: Fn(&Props, &Context) -> Result<Node, PrepareError> + Send + Sync + 'static,
  {
    Self::new(name, FnComponent { render: Arc::new(render) })
  }

  pub fn id(&self) -> ComponentId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn component(&self) -> &dyn Component {
    self.imp.as_ref()
  }

  pub fn element(&self, props: Props) -> Node {
    Node::Component(Element { ty: self.clone(), props })
  }

  /// Expand one instance: mount hook, render, then the context for its children.
  pub(crate) fn instantiate(
    &self,
    props: &Props,
    ctx: &Context,
  ) -> Result<(Node, Context), PrepareError> {
    self.imp.will_mount(props, ctx);
    let node = self.imp.render(props, ctx)?;
    Ok((node, self.imp.child_context(props, ctx)))
  }
}

impl fmt::Debug for ComponentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComponentType").field("id", &self.id).field("name", &self.name).finish()
  }
}

#[derive(Clone, Debug)]
pub struct HostElement {
  pub tag: String,
  pub attrs: Props,
  pub children: Vec<Node>,
}

#[derive(Clone)]
pub struct Provider {
  pub key: ContextKey,
  pub value: ContextValue,
  pub children: Vec<Node>,
}

#[derive(Clone)]
pub struct Consumer {
  pub render: ConsumerFn,
}

#[derive(Clone)]
pub struct FunctionElement {
  pub name: Arc<str>,
  pub render: RenderFn,
  pub props: Props,
}

#[derive(Clone, Debug)]
pub struct Element {
  pub ty: ComponentType,
  pub props: Props,
}

#[derive(Clone, Debug)]
pub struct PreparedElement {
  pub ty: PreparedType,
  pub effect_id: EffectId,
  pub props: Props,
}

/// A declarative UI tree.
#[derive(Clone, Default)]
pub enum Node {
  #[default]
  Empty,
  Text(String),
  Host(HostElement),
  Fragment(Vec<Node>),
  Provider(Provider),
  Consumer(Consumer),
  Function(FunctionElement),
  Component(Element),
  Prepared(PreparedElement),
}

impl Node {
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text(text.into())
  }

  pub fn host(tag: impl Into<String>, attrs: Props, children: Vec<Node>) -> Self {
    Self::Host(HostElement { tag: tag.into(), attrs, children })
  }

  pub fn fragment(children: Vec<Node>) -> Self {
    Self::Fragment(children)
  }

  pub fn provider<T>(key: ContextKey, value: T, children: Vec<Node>) -> Self
  where
    T: std::any::Any + Send + Sync,
  {
    Self::Provider(Provider { key, value: Arc::new(value), children })
  }

  pub fn consumer<F>(render: F) -> Self
  where
    F: Fn(&Context) -> Result<Node, PrepareError> + Send + Sync + 'static,
  {
    Self::Consumer(Consumer { render: Arc::new(render) })
  }

  pub fn function<F>(name: impl Into<Arc<str>>, props: Props, render: F) -> Self
  where
    F: Fn(&Props, &Context) -> Result<Node, PrepareError> + Send + Sync + 'static,
  {
    Self::Function(FunctionElement { name: name.into(), render: Arc::new(render), props })
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Self::Empty)
  }
}

impl From<&str> for Node {
  fn from(text: &str) -> Self {
    Self::text(text)
  }
}

impl From<String> for Node {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl From<Vec<Node>> for Node {
  fn from(children: Vec<Node>) -> Self {
    Self::Fragment(children)
  }
}

impl<T: Into<Node>> From<Option<T>> for Node {
  fn from(node: Option<T>) -> Self {
    node.map_or(Self::Empty, Into::into)
  }
}

impl fmt::Debug for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => f.write_str("Empty"),
      Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
      Self::Host(host) => fmt::Debug::fmt(host, f),
      Self::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
      Self::Provider(p) => {
        f.debug_struct("Provider").field("key", &p.key).field("children", &p.children).finish()
      }
      Self::Consumer(_) => f.write_str("Consumer"),
      Self::Function(func) => {
        f.debug_struct("Function").field("name", &func.name).field("props", &func.props).finish()
      }
      Self::Component(el) => fmt::Debug::fmt(el, f),
      Self::Prepared(el) => fmt::Debug::fmt(el, f),
    }
  }
}

/// Flatten nested fragments into a list of non-empty nodes, the shape both the
/// walker and the renderer iterate over.
pub(crate) fn flatten(node: Node, out: &mut Vec<Node>) {
  match node {
    Node::Empty => {}
    Node::Fragment(children) => {
      for child in children {
        flatten(child, out);
      }
    }
    other => out.push(other),
  }
}
