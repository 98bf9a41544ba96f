/* src/i18n/rust/src/config.rs */

use std::collections::HashSet;

use serde::Deserialize;

use crate::errors::I18nError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct I18nConfig {
  pub locales: Vec<String>,
  #[serde(default = "default_locale")]
  pub default_locale: String,
  #[serde(default = "default_cookie_name")]
  pub cookie_name: String,
  #[serde(default = "default_script_id")]
  pub script_id: String,
}

impl I18nConfig {
  pub fn new(locales: Vec<String>, default_locale: impl Into<String>) -> Self {
    Self {
      locales,
      default_locale: default_locale.into(),
      cookie_name: default_cookie_name(),
      script_id: default_script_id(),
    }
  }

  pub fn validate(&self) -> Result<(), I18nError> {
    if self.locales.is_empty() {
      return Err(I18nError::NoLocales);
    }
    let mut seen = HashSet::new();
    for locale in &self.locales {
      if !seen.insert(locale.as_str()) {
        return Err(I18nError::DuplicateLocale(locale.clone()));
      }
    }
    if !seen.contains(self.default_locale.as_str()) {
      return Err(I18nError::UnknownDefault {
        default: self.default_locale.clone(),
        locales: self.locales.clone(),
      });
    }
    if self.cookie_name.is_empty() {
      return Err(I18nError::EmptyField { field: "cookie_name" });
    }
    if self.script_id.is_empty() {
      return Err(I18nError::EmptyField { field: "script_id" });
    }
    Ok(())
  }

  pub fn supports(&self, locale: &str) -> bool {
    self.locales.iter().any(|l| l == locale)
  }
}

fn default_locale() -> String {
  "en-US".to_string()
}

fn default_cookie_name() -> String {
  "spool-locale".to_string()
}

fn default_script_id() -> String {
  "__TRANSLATIONS__".to_string()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn config(locales: &[&str], default: &str) -> I18nConfig {
    I18nConfig::new(locales.iter().map(ToString::to_string).collect(), default)
  }

  #[test]
  fn defaults_fill_optional_fields() {
    let cfg: I18nConfig = serde_json::from_value(json!({ "locales": ["en-US", "zh"] })).unwrap();
    assert_eq!(cfg.default_locale, "en-US");
    assert_eq!(cfg.cookie_name, "spool-locale");
    assert_eq!(cfg.script_id, "__TRANSLATIONS__");
    assert!(cfg.validate().is_ok());
  }

  #[test]
  fn rejects_empty_locales() {
    assert_eq!(config(&[], "en").validate(), Err(I18nError::NoLocales));
  }

  #[test]
  fn rejects_default_outside_locales() {
    let err = config(&["en", "zh"], "fr").validate().unwrap_err();
    assert_eq!(err.to_string(), "i18n.default_locale \"fr\" is not in i18n.locales [\"en\", \"zh\"]");
  }

  #[test]
  fn rejects_duplicates() {
    assert_eq!(
      config(&["en", "zh", "en"], "en").validate(),
      Err(I18nError::DuplicateLocale("en".into()))
    );
  }

  #[test]
  fn rejects_empty_script_id() {
    let mut cfg = config(&["en"], "en");
    cfg.script_id.clear();
    assert_eq!(cfg.validate(), Err(I18nError::EmptyField { field: "script_id" }));
  }
}
