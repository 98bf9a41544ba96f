/* src/i18n/rust/src/translator.rs */

use std::collections::{BTreeMap, HashMap};
use std::sync::{OnceLock, PoisonError, RwLock};

use regex::{Captures, Regex};
use serde_json::Value;

fn placeholder_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\$\{\s*([\w.-]+)\s*\}").unwrap())
}

/// Translations of one locale, filled up front for the page and extended as
/// split modules pull in their own keys.
#[derive(Debug, Default)]
pub struct Translator {
  locale: String,
  translations: RwLock<HashMap<String, String>>,
}

impl Translator {
  pub fn new(locale: impl Into<String>, translations: HashMap<String, String>) -> Self {
    Self { locale: locale.into(), translations: RwLock::new(translations) }
  }

  pub fn locale(&self) -> &str {
    &self.locale
  }

  pub fn has(&self, key: &str) -> bool {
    self.translations.read().unwrap_or_else(PoisonError::into_inner).contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.translations.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Add fetched translations. Existing keys are overwritten.
  pub fn merge(&self, fetched: impl IntoIterator<Item = (String, String)>) {
    let mut translations = self.translations.write().unwrap_or_else(PoisonError::into_inner);
    translations.extend(fetched);
  }

  /// Look up `key` and fill `${name}` placeholders from `interpolations`
  /// (a JSON object). Placeholders without a value are left as written; a
  /// missing key yields the key itself.
  pub fn translate(&self, key: &str, interpolations: &Value) -> String {
    let translations = self.translations.read().unwrap_or_else(PoisonError::into_inner);
    let Some(template) = translations.get(key) else {
      tracing::debug!(locale = %self.locale, key, "translation miss");
      return key.to_string();
    };
    interpolate(template, interpolations)
  }

  /// Sorted copy of every loaded translation.
  pub fn snapshot(&self) -> BTreeMap<String, String> {
    let translations = self.translations.read().unwrap_or_else(PoisonError::into_inner);
    translations.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
  }
}

fn interpolate(template: &str, values: &Value) -> String {
  placeholder_re()
    .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
      Some(Value::String(s)) => s.clone(),
      Some(Value::Null) | None => caps[0].to_string(),
      Some(other) => other.to_string(),
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn translator() -> Translator {
    let translations = HashMap::from([
      ("greeting".to_string(), "Hello, ${name}!".to_string()),
      ("cart".to_string(), "${ count } items for ${name}".to_string()),
      ("plain".to_string(), "Welcome".to_string()),
    ]);
    Translator::new("en-US", translations)
  }

  #[test]
  fn interpolates_named_values() {
    let t = translator();
    assert_eq!(t.translate("greeting", &json!({ "name": "Ada" })), "Hello, Ada!");
    assert_eq!(t.translate("cart", &json!({ "count": 3, "name": "Ada" })), "3 items for Ada");
  }

  #[test]
  fn unknown_placeholders_are_kept() {
    let t = translator();
    assert_eq!(t.translate("greeting", &json!({})), "Hello, ${name}!");
    assert_eq!(t.translate("greeting", &Value::Null), "Hello, ${name}!");
  }

  #[test]
  fn missing_key_returns_key() {
    assert_eq!(translator().translate("nope.title", &json!({})), "nope.title");
  }

  #[test]
  fn merge_extends_and_overrides() {
    let t = translator();
    assert!(!t.has("footer"));
    t.merge([("footer".to_string(), "Bye".to_string()), ("plain".to_string(), "Hi".to_string())]);
    assert!(t.has("footer"));
    assert_eq!(t.translate("plain", &json!({})), "Hi");
    assert_eq!(t.len(), 4);
  }

  #[test]
  fn snapshot_is_sorted() {
    let keys: Vec<_> = translator().snapshot().into_keys().collect();
    assert_eq!(keys, ["cart", "greeting", "plain"]);
  }
}
