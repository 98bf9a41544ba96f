/* src/prepare/rust/src/dispatched.rs */

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::ready;
use serde_json::Value;

use crate::context::{Context, ContextKey};
use crate::memo::EffectFuture;
use crate::node::Props;
use crate::prepared::{PreparedHoc, PreparedOptions, prepared};

/// Context key the [`Store`] is looked up under.
pub const STORE_KEY: ContextKey = "store";

pub trait Dispatch: Send + Sync {
  fn dispatch(&self, action: Value) -> EffectFuture;
}

/// Cloneable handle to an application store.
#[derive(Clone)]
pub struct Store {
  inner: Arc<dyn Dispatch>,
}

impl Store {
  pub fn new(dispatch: impl Dispatch + 'static) -> Self {
    Self { inner: Arc::new(dispatch) }
  }

  pub fn dispatch(&self, action: Value) -> EffectFuture {
    self.inner.dispatch(action)
  }
}

/// [`prepared`] with the ambient store's dispatch bound into the side effect.
/// Fails the effect with `MissingContext` when no store is in scope.
pub fn dispatched<F>(prepare_using_dispatch: F, options: PreparedOptions) -> PreparedHoc
where
  F: Fn(&Props, &Store) -> EffectFuture + Send + Sync + 'static,
{
  prepared(
    move |props: &Props, ctx: &Context| match ctx.require::<Store>(STORE_KEY) {
      Ok(store) => prepare_using_dispatch(props, store),
      Err(err) => ready(Err(err)).boxed(),
    },
    options,
  )
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use serde_json::json;

  use super::*;
  use crate::errors::PrepareError;
  use crate::node::{ComponentType, Node};
  use crate::render::render_to_string;
  use crate::walker::prepare;

  #[derive(Default)]
  struct Recorder {
    actions: Arc<Mutex<Vec<Value>>>,
  }

  impl Dispatch for Recorder {
    fn dispatch(&self, action: Value) -> EffectFuture {
      let actions = Arc::clone(&self.actions);
      async move {
        actions.lock().unwrap().push(action);
        Ok(())
      }
      .boxed()
    }
  }

  fn user_loader() -> crate::prepared::PreparedType {
    dispatched(
      |props, store| store.dispatch(json!({ "type": "LOAD_USER", "id": props["id"] })),
      PreparedOptions::default(),
    )
    .wrap(ComponentType::from_fn("User", |props, _| {
      Ok(Node::text(format!("user {}", props["id"])))
    }))
  }

  #[tokio::test]
  async fn dispatches_through_ambient_store() {
    let recorder = Recorder::default();
    let actions = Arc::clone(&recorder.actions);
    let ctx = Context::new().with_value(STORE_KEY, Store::new(recorder));
    let tree = user_loader().element("user-7", json!({ "id": 7 }));

    let ctx = prepare(&tree, ctx).await.unwrap();
    assert_eq!(*actions.lock().unwrap(), vec![json!({ "type": "LOAD_USER", "id": 7 })]);
    assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "user 7");
  }

  #[tokio::test]
  async fn store_from_provider_node() {
    let recorder = Recorder::default();
    let actions = Arc::clone(&recorder.actions);
    let tree = Node::provider(
      STORE_KEY,
      Store::new(recorder),
      vec![
        user_loader().element("a", json!({ "id": 1 })),
        user_loader().element("b", json!({ "id": 2 })),
      ],
    );

    prepare(&tree, Context::new()).await.unwrap();
    assert_eq!(actions.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn missing_store_fails_preparation() {
    let tree = user_loader().element("user-1", json!({ "id": 1 }));
    let err = prepare(&tree, Context::new()).await.unwrap_err();
    assert_eq!(err, PrepareError::missing_context(STORE_KEY));
  }
}
