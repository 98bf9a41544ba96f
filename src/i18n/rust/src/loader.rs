/* src/i18n/rust/src/loader.rs */

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::ready;
use spool_prepare::{ChunkId, Context, EffectFuture, SplitLoader};

use crate::catalog::TranslationSource;
use crate::chunk_map::ChunkTranslationMap;
use crate::translator::Translator;

/// Fetches the translations a freshly loaded split module needs and merges
/// them into the request's translator.
#[derive(Clone)]
pub struct TranslationsLoader {
  chunks: Arc<ChunkTranslationMap>,
  source: Arc<dyn TranslationSource>,
  translator: Arc<Translator>,
}

impl TranslationsLoader {
  pub fn new(
    chunks: Arc<ChunkTranslationMap>,
    source: Arc<dyn TranslationSource>,
    translator: Arc<Translator>,
  ) -> Self {
    Self { chunks, source, translator }
  }

  fn missing(&self, chunk_ids: &[ChunkId]) -> BTreeSet<String> {
    let mut keys = self.chunks.translations_for_chunks(chunk_ids);
    keys.retain(|key| !self.translator.has(key));
    keys
  }
}

impl SplitLoader for TranslationsLoader {
  fn load(&self, chunk_ids: &[ChunkId], _ctx: &Context) -> EffectFuture {
    let missing = self.missing(chunk_ids);
    if missing.is_empty() {
      return ready(Ok(())).boxed();
    }

    tracing::debug!(
      locale = self.translator.locale(),
      chunks = ?chunk_ids,
      keys = missing.len(),
      "fetching chunk translations"
    );
    let fetch = self.source.fetch(self.translator.locale(), &missing);
    let translator = Arc::clone(&self.translator);
    async move {
      translator.merge(fetch.await?);
      Ok(())
    }
    .boxed()
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use futures_util::future::BoxFuture;
  use serde_json::json;
  use spool_prepare::{
    AsyncComponentOptions, ComponentType, DynamicImport, Node, PrepareError, SPLIT_LOADERS_KEY,
    SplitLoaders, prepare, render_to_string, with_async_component,
  };

  use super::*;
  use crate::catalog::{Catalog, Translations};

  struct Counting {
    inner: Catalog,
    calls: AtomicUsize,
  }

  impl TranslationSource for Counting {
    fn fetch(
      &self,
      locale: &str,
      keys: &BTreeSet<String>,
    ) -> BoxFuture<'static, Result<Translations, PrepareError>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.inner.fetch(locale, keys)
    }
  }

  fn setup() -> (Arc<ChunkTranslationMap>, Arc<Counting>, Arc<Translator>) {
    let chunks = Arc::new(ChunkTranslationMap::new());
    chunks.add("settings.js", &[4], &["settings.title", "common.save"]);
    let source = Arc::new(Counting {
      inner: Catalog::new()
        .with_locale("en", [("settings.title", "Settings"), ("common.save", "Save")]),
      calls: AtomicUsize::new(0),
    });
    let translator = Arc::new(Translator::new(
      "en",
      HashMap::from([("common.save".to_string(), "Save".to_string())]),
    ));
    (chunks, source, translator)
  }

  #[tokio::test]
  async fn fetches_only_missing_keys() {
    let (chunks, source, translator) = setup();
    let loader = TranslationsLoader::new(chunks, source.clone(), Arc::clone(&translator));

    loader.load(&[4], &Context::new()).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(translator.has("settings.title"));

    // everything present now, no second fetch
    loader.load(&[4], &Context::new()).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn unknown_chunks_skip_fetch() {
    let (chunks, source, translator) = setup();
    let loader = TranslationsLoader::new(chunks, source.clone(), translator);
    loader.load(&[99], &Context::new()).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn split_module_pulls_its_translations() {
    let (chunks, source, translator) = setup();
    let loader = TranslationsLoader::new(chunks, source, Arc::clone(&translator));
    let settings = ComponentType::from_fn("Settings", |_, _| Ok(Node::text("settings")));
    let split = with_async_component(AsyncComponentOptions::new(
      "Settings",
      move || {
        let settings = settings.clone();
        DynamicImport::new(vec![4], async move { Ok(settings) }.boxed())
      },
      ComponentType::from_fn("Loading", |_, _| Ok(Node::Empty)),
      ComponentType::from_fn("Failed", |_, _| Ok(Node::Empty)),
    ));
    let ctx = Context::new().with_value(SPLIT_LOADERS_KEY, SplitLoaders::new().with(loader));
    let tree = split.element("settings", json!({}));

    let ctx = prepare(&tree, ctx).await.unwrap();
    assert_eq!(render_to_string(&tree, &ctx).unwrap().html, "settings");
    assert_eq!(translator.translate("settings.title", &json!({})), "Settings");
  }
}
