/* demos/ssr/src/config.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use spool_i18n::{I18nConfig, LocaleRequest};
use spool_prepare::PrepareOptions;

pub const CONFIG_FILE: &str = "spool.toml";

/// Env var pointing at a config file, skipping the upward search.
pub const CONFIG_ENV: &str = "SPOOL_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
  #[serde(default)]
  pub prepare: PrepareOptions,
  pub i18n: I18nConfig,
  #[serde(default)]
  pub request: RequestSection,
}

/// The simulated incoming request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSection {
  pub path_locale: Option<String>,
  pub cookie: Option<String>,
  pub accept_language: Option<String>,
}

impl RequestSection {
  pub fn locale_request(&self) -> LocaleRequest {
    LocaleRequest {
      path_locale: self.path_locale.clone(),
      cookie_header: self.cookie.clone(),
      accept_language: self.accept_language.clone(),
    }
  }
}

/// Nearest `spool.toml` in `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Result<PathBuf> {
  let start =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  start
    .ancestors()
    .map(|dir| dir.join(CONFIG_FILE))
    .find(|candidate| candidate.is_file())
    .with_context(|| format!("no {CONFIG_FILE} in {} or any parent", start.display()))
}

/// An explicit path (from [`CONFIG_ENV`]) wins over the upward search.
pub fn resolve_config_path(explicit: Option<PathBuf>, cwd: &Path) -> Result<PathBuf> {
  match explicit {
    Some(path) if path.is_file() => Ok(path),
    Some(path) => bail!("{CONFIG_ENV} points at {}, which is not a file", path.display()),
    None => find_config(cwd),
  }
}

pub fn load_config(path: &Path) -> Result<DemoConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let config: DemoConfig =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  config.i18n.validate().with_context(|| format!("invalid [i18n] in {}", path.display()))?;
  Ok(config)
}
