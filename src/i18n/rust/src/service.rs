/* src/i18n/rust/src/service.rs */

use std::sync::Arc;

use spool_prepare::{ChunkId, Context, ContextKey, PrepareError, SPLIT_LOADERS_KEY, SplitLoaders};

use crate::catalog::TranslationSource;
use crate::chunk_map::ChunkTranslationMap;
use crate::config::I18nConfig;
use crate::errors::I18nError;
use crate::loader::TranslationsLoader;
use crate::locale::{LocaleRequest, negotiate};
use crate::payload::translations_script;
use crate::translator::Translator;

/// Context key of the request's [`Translator`] (stored as `Arc<Translator>`).
pub const TRANSLATOR_KEY: ContextKey = "i18n.translator";

/// Per-server i18n state. One instance per server; cheap to clone.
#[derive(Clone)]
pub struct I18nService {
  config: Arc<I18nConfig>,
  chunks: Arc<ChunkTranslationMap>,
  source: Arc<dyn TranslationSource>,
}

impl I18nService {
  pub fn new(
    config: I18nConfig,
    chunks: Arc<ChunkTranslationMap>,
    source: Arc<dyn TranslationSource>,
  ) -> Result<Self, I18nError> {
    config.validate()?;
    Ok(Self { config: Arc::new(config), chunks, source })
  }

  pub fn config(&self) -> &I18nConfig {
    &self.config
  }

  pub fn chunks(&self) -> &Arc<ChunkTranslationMap> {
    &self.chunks
  }

  /// Negotiate the locale and preload the translations of the chunks the
  /// page starts with.
  pub async fn for_request(
    &self,
    req: &LocaleRequest,
    chunk_ids: &[ChunkId],
  ) -> Result<RequestI18n, PrepareError> {
    let locale = negotiate(&self.config, req);
    let keys = self.chunks.translations_for_chunks(chunk_ids);
    let translations =
      if keys.is_empty() { Default::default() } else { self.source.fetch(&locale, &keys).await? };
    tracing::debug!(%locale, chunks = ?chunk_ids, keys = translations.len(), "request i18n ready");

    let translator = Arc::new(Translator::new(locale.clone(), translations));
    let loader = TranslationsLoader::new(
      Arc::clone(&self.chunks),
      Arc::clone(&self.source),
      Arc::clone(&translator),
    );
    Ok(RequestI18n { locale, translator, loader, script_id: self.config.script_id.clone() })
  }
}

/// i18n state of a single request.
pub struct RequestI18n {
  pub locale: String,
  pub translator: Arc<Translator>,
  loader: TranslationsLoader,
  script_id: String,
}

impl RequestI18n {
  /// Bind the translator and register the split loader that fetches
  /// translations for modules loaded during this request.
  pub fn attach(&self, ctx: Context) -> Context {
    let mut loaders = ctx.get::<SplitLoaders>(SPLIT_LOADERS_KEY).cloned().unwrap_or_default();
    loaders.push(Arc::new(self.loader.clone()));
    ctx
      .with_value(TRANSLATOR_KEY, Arc::clone(&self.translator))
      .with_value(SPLIT_LOADERS_KEY, loaders)
  }

  /// Payload script for everything loaded so far; render it after `prepare`
  /// so lazily fetched keys are included.
  pub fn script(&self) -> String {
    translations_script(&self.script_id, &self.translator.snapshot())
  }
}
