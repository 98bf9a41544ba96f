/* src/i18n/rust/src/catalog.rs */

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, ready};
use spool_prepare::PrepareError;

pub type Translations = HashMap<String, String>;

/// Where translations for a locale come from.
pub trait TranslationSource: Send + Sync {
  /// Templates for the requested `keys`. Keys the source does not know are
  /// simply absent from the result.
  fn fetch(
    &self,
    locale: &str,
    keys: &BTreeSet<String>,
  ) -> BoxFuture<'static, Result<Translations, PrepareError>>;
}

/// In-memory `locale -> key -> template` store.
#[derive(Debug, Default)]
pub struct Catalog {
  locales: RwLock<HashMap<String, Translations>>,
}

impl Catalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_locale<I, K, V>(self, locale: impl Into<String>, entries: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self.extend(locale, entries);
    self
  }

  pub fn extend<I, K, V>(&self, locale: impl Into<String>, entries: I)
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut locales = self.locales.write().unwrap_or_else(PoisonError::into_inner);
    let table = locales.entry(locale.into()).or_default();
    table.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
  }

  pub fn lookup(&self, locale: &str, keys: &BTreeSet<String>) -> Translations {
    let locales = self.locales.read().unwrap_or_else(PoisonError::into_inner);
    let Some(table) = locales.get(locale) else {
      return Translations::new();
    };
    keys
      .iter()
      .filter_map(|key| table.get(key).map(|value| (key.clone(), value.clone())))
      .collect()
  }
}

impl TranslationSource for Catalog {
  fn fetch(
    &self,
    locale: &str,
    keys: &BTreeSet<String>,
  ) -> BoxFuture<'static, Result<Translations, PrepareError>> {
    ready(Ok(self.lookup(locale, keys))).boxed()
  }
}
