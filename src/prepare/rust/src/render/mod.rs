/* src/prepare/rust/src/render/mod.rs */

// Real render pass: turns a tree into HTML, consulting the resolution memo so
// prepared nodes render their content only once their effect has settled.

mod html;


use std::collections::{HashMap, HashSet};

use futures_util::future::try_join_all;
use serde_json::json;

use crate::context::Context;
use crate::errors::PrepareError;
use crate::memo::{EffectId, EffectState, MemoKey};
use crate::node::{Node, PreparedElement, Props};
use crate::prepared::PreparedType;

use html::{escape_html, is_void_element, write_attrs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
  Mount,
  ReceiveProps,
  Update,
}

/// A side effect requested by a lifecycle hook; fired by
/// [`RenderOutput::run_effects`], after the render that scheduled it.
pub struct ScheduledEffect {
  pub event: LifecycleEvent,
  pub effect_id: EffectId,
  ty: PreparedType,
  props: Props,
  ctx: Context,
}

impl ScheduledEffect {
  pub fn component(&self) -> &str {
    self.ty.name()
  }

  fn force_update(&self) -> bool {
    self.ty.config().options().force_update
  }
}

impl std::fmt::Debug for ScheduledEffect {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScheduledEffect")
      .field("component", &self.ty.name())
      .field("effect_id", &self.effect_id)
      .field("event", &self.event)
      .finish()
  }
}

#[derive(Debug, Default)]
pub struct RenderOutput {
  pub html: String,
  pub effects: Vec<ScheduledEffect>,
}

impl RenderOutput {
  /// Fire every scheduled effect concurrently. Resolves to whether any of
  /// them asked for a re-render. Failures are not swallowed.
  pub async fn run_effects(self) -> Result<bool, PrepareError> {
    let force_update = self.effects.iter().any(ScheduledEffect::force_update);
    let pending = self.effects.into_iter().map(|effect| {
      tracing::debug!(
        component = effect.ty.name(),
        effect = %effect.effect_id,
        event = ?effect.event,
        "firing lifecycle effect"
      );
      effect.ty.config().side_effect(&effect.props, &effect.ctx)
    });
    try_join_all(pending).await?;
    Ok(force_update)
  }
}

/// What a prepared node shows in this render.
enum Gate {
  Open,
  Closed,
  Failed(PrepareError),
}

#[derive(Default)]
struct Frame {
  html: String,
  effects: Vec<ScheduledEffect>,
  seen: HashSet<MemoKey>,
}

/// Stateful renderer. Remembers the props of every prepared node it rendered
/// last time, which drives the mount / receive-props / update hooks.
#[derive(Default)]
pub struct Renderer {
  mounted: HashMap<MemoKey, Props>,
}

impl Renderer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn render(&mut self, root: &Node, ctx: &Context) -> Result<RenderOutput, PrepareError> {
    let mut frame = Frame::default();
    self.render_node(root, ctx, &mut frame)?;
    self.mounted.retain(|key, _| frame.seen.contains(key));
    Ok(RenderOutput { html: frame.html, effects: frame.effects })
  }

  /// Number of prepared nodes currently mounted.
  pub fn mounted(&self) -> usize {
    self.mounted.len()
  }

  fn render_node(
    &mut self,
    node: &Node,
    ctx: &Context,
    frame: &mut Frame,
  ) -> Result<(), PrepareError> {
    match node {
      Node::Empty => {}
      Node::Text(text) => frame.html.push_str(&escape_html(text)),
      Node::Host(host) => {
        frame.html.push('<');
        frame.html.push_str(&host.tag);
        write_attrs(&host.attrs, &mut frame.html);
        frame.html.push('>');
        if is_void_element(&host.tag) {
          return Ok(());
        }
        self.render_children(&host.children, ctx, frame)?;
        frame.html.push_str(&format!("</{}>", host.tag));
      }
      Node::Fragment(children) => self.render_children(children, ctx, frame)?,
      Node::Provider(provider) => {
        let ctx = ctx.clone().with_raw(provider.key, provider.value.clone());
        self.render_children(&provider.children, &ctx, frame)?;
      }
      Node::Consumer(consumer) => {
        let child = (consumer.render)(ctx)?;
        self.render_node(&child, ctx, frame)?;
      }
      Node::Function(func) => {
        let child = (func.render)(&func.props, ctx)?;
        self.render_node(&child, ctx, frame)?;
      }
      Node::Component(el) => {
        let (child, child_ctx) = el.ty.instantiate(&el.props, ctx)?;
        self.render_node(&child, &child_ctx, frame)?;
      }
      Node::Prepared(el) => self.render_prepared(el, ctx, frame)?,
    }
    Ok(())
  }

  fn render_children(
    &mut self,
    children: &[Node],
    ctx: &Context,
    frame: &mut Frame,
  ) -> Result<(), PrepareError> {
    for child in children {
      self.render_node(child, ctx, frame)?;
    }
    Ok(())
  }

  fn render_prepared(
    &mut self,
    el: &PreparedElement,
    ctx: &Context,
    frame: &mut Frame,
  ) -> Result<(), PrepareError> {
    let key = el.ty.memo_key(&el.effect_id);
    if frame.seen.insert(key.clone()) {
      self.schedule_lifecycle(el, &key, ctx, frame);
    }

    match gate(el, key, ctx) {
      Gate::Open => {
        let (child, child_ctx) = el.ty.inner().instantiate(&el.props, ctx)?;
        self.render_node(&child, &child_ctx, frame)
      }
      Gate::Closed => Ok(()),
      Gate::Failed(err) => match el.ty.error_fallback() {
        Some(fallback) => {
          let props = json!({ "error": err.to_string(), "code": err.code() });
          self.render_node(&fallback.element(props), ctx, frame)
        }
        None => Ok(()),
      },
    }
  }

  fn schedule_lifecycle(
    &mut self,
    el: &PreparedElement,
    key: &MemoKey,
    ctx: &Context,
    frame: &mut Frame,
  ) {
    let options = el.ty.config().options();
    let mut schedule = |event| {
      frame.effects.push(ScheduledEffect {
        event,
        effect_id: el.effect_id.clone(),
        ty: el.ty.clone(),
        props: el.props.clone(),
        ctx: ctx.clone(),
      });
    };

    match self.mounted.insert(key.clone(), el.props.clone()) {
      // With a memo present the effect is started through the memo instead.
      None if options.component_did_mount && ctx.memo().is_none() => {
        schedule(LifecycleEvent::Mount);
      }
      None => {}
      Some(previous) => {
        if options.component_will_receive_props && previous != el.props {
          schedule(LifecycleEvent::ReceiveProps);
        }
        if options.component_did_update {
          schedule(LifecycleEvent::Update);
        }
      }
    }
  }
}

/// Decide what a prepared node shows. Without a memo (client-only render)
/// content renders optimistically. A recorded failure wins over everything
/// else. Deferred nodes always render their inner component, which owns its
/// loading state, and register their effect. A type whose ready check passes
/// renders at once even before its effect has settled.
fn gate(el: &PreparedElement, key: MemoKey, ctx: &Context) -> Gate {
  let Some(memo) = ctx.memo() else {
    return Gate::Open;
  };
  let config = el.ty.config();
  let ready = config.is_ready(&el.props, ctx);
  let resolved =
    memo.is_resolved(key.clone(), || el.ty.start_effect(&el.effect_id, &el.props, ctx));
  if let Some(EffectState::Failed(err)) = memo.state(&key) {
    return Gate::Failed(err);
  }
  if resolved || ready || config.defer() {
    Gate::Open
  } else {
    Gate::Closed
  }
}

/// One-shot render with no lifecycle history.
pub fn render_to_string(root: &Node, ctx: &Context) -> Result<RenderOutput, PrepareError> {
  Renderer::new().render(root, ctx)
}
