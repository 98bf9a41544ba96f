/* src/prepare/rust/src/walker/mod.rs */

// Pre-render walk: expands a tree without rendering it, running every prepared
// side effect it meets so the real render can find them settled.


use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, try_join_all};

use crate::config::{ErrorPolicy, PrepareOptions};
use crate::context::Context;
use crate::errors::PrepareError;
use crate::memo::ResolutionMemo;
use crate::node::{Node, PreparedElement, flatten};

/// Outcome of visiting a prepared node.
enum Expand {
  Children,
  Stop,
}

/// State shared by every branch of one pass.
struct Pass {
  memo: Arc<ResolutionMemo>,
  policy: ErrorPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct Preparer {
  options: PrepareOptions,
}

impl Preparer {
  pub fn new(options: PrepareOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> &PrepareOptions {
    &self.options
  }

  /// Walk `root`, settling every side effect it declares.
  ///
  /// Returns `ctx` carrying the pass's memo (a fresh one unless `ctx` already
  /// had one); hand it to the real render so prepared nodes see their effects
  /// as resolved.
  pub async fn prepare(&self, root: &Node, ctx: Context) -> Result<Context, PrepareError> {
    let memo = ctx.memo().cloned().unwrap_or_else(ResolutionMemo::shared);
    let ctx = ctx.with_memo(Arc::clone(&memo));
    let pass = Arc::new(Pass { memo, policy: self.options.error_policy });

    walk(Arc::clone(&pass), root.clone(), ctx.clone().preparing(true)).await?;
    tracing::debug!(effects = pass.memo.len(), "prepare pass complete");
    Ok(ctx)
  }
}

/// [`Preparer::prepare`] with default options.
pub async fn prepare(root: &Node, ctx: Context) -> Result<Context, PrepareError> {
  Preparer::default().prepare(root, ctx).await
}

fn walk(
  pass: Arc<Pass>,
  node: Node,
  ctx: Context,
) -> BoxFuture<'static, Result<(), PrepareError>> {
  async move {
    let (child, child_ctx) = match node {
      Node::Empty | Node::Text(_) => return Ok(()),
      Node::Consumer(consumer) => ((consumer.render)(&ctx)?, ctx),
      Node::Provider(provider) => {
        let ctx = ctx.with_raw(provider.key, provider.value);
        (Node::Fragment(provider.children), ctx)
      }
      Node::Host(host) => (Node::Fragment(host.children), ctx),
      Node::Fragment(children) => (Node::Fragment(children), ctx),
      Node::Function(func) => ((func.render)(&func.props, &ctx)?, ctx),
      Node::Component(el) => el.ty.instantiate(&el.props, &ctx)?,
      Node::Prepared(el) => match run_effect(&pass, &el, &ctx).await? {
        Expand::Stop => return Ok(()),
        Expand::Children => el.ty.inner().instantiate(&el.props, &ctx)?,
      },
    };
    walk_children(pass, child, child_ctx).await
  }
  .boxed()
}

async fn walk_children(pass: Arc<Pass>, node: Node, ctx: Context) -> Result<(), PrepareError> {
  let mut children = Vec::new();
  flatten(node, &mut children);
  try_join_all(children.into_iter().map(|child| walk(Arc::clone(&pass), child, ctx.clone())))
    .await?;
  Ok(())
}

async fn run_effect(
  pass: &Pass,
  el: &PreparedElement,
  ctx: &Context,
) -> Result<Expand, PrepareError> {
  let config = el.ty.config();
  if config.defer() {
    tracing::trace!(component = el.ty.name(), effect = %el.effect_id, "deferred, subtree skipped");
    return Ok(Expand::Stop);
  }

  let key = el.ty.memo_key(&el.effect_id);
  let outcome = pass.memo.run(key, || el.ty.start_effect(&el.effect_id, &el.props, ctx)).await;
  if let Err(err) = outcome {
    return match pass.policy {
      ErrorPolicy::Abort => Err(err),
      ErrorPolicy::Isolate => {
        tracing::warn!(
          component = el.ty.name(),
          effect = %el.effect_id,
          error = %err,
          "side effect failed, subtree skipped"
        );
        Ok(Expand::Stop)
      }
    };
  }

  if config.boundary() {
    tracing::trace!(component = el.ty.name(), effect = %el.effect_id, "boundary, subtree skipped");
    return Ok(Expand::Stop);
  }
  Ok(Expand::Children)
}
