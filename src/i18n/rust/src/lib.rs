/* src/i18n/rust/src/lib.rs */

pub mod catalog;
pub mod chunk_map;
pub mod config;
pub mod errors;
pub mod escape;
pub mod loader;
pub mod locale;
pub mod payload;
pub mod service;
pub mod translator;

pub use catalog::{Catalog, TranslationSource, Translations};
pub use chunk_map::ChunkTranslationMap;
pub use config::I18nConfig;
pub use errors::I18nError;
pub use loader::TranslationsLoader;
pub use locale::{LocaleRequest, negotiate};
pub use payload::{translations_json, translations_script};
pub use service::{I18nService, RequestI18n, TRANSLATOR_KEY};
pub use translator::Translator;
