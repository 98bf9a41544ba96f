/* src/i18n/rust/src/errors.rs */

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum I18nError {
  #[error("i18n.locales must not be empty")]
  NoLocales,
  #[error("i18n.default_locale \"{default}\" is not in i18n.locales {locales:?}")]
  UnknownDefault { default: String, locales: Vec<String> },
  #[error("i18n.locales lists \"{0}\" more than once")]
  DuplicateLocale(String),
  #[error("i18n.{field} must not be empty")]
  EmptyField { field: &'static str },
}
