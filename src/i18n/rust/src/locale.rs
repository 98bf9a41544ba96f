/* src/i18n/rust/src/locale.rs */

use crate::config::I18nConfig;

/// Request facts locale negotiation looks at.
#[derive(Debug, Clone, Default)]
pub struct LocaleRequest {
  pub path_locale: Option<String>,
  pub cookie_header: Option<String>,
  pub accept_language: Option<String>,
}

impl LocaleRequest {
  pub fn from_accept_language(header: impl Into<String>) -> Self {
    Self { accept_language: Some(header.into()), ..Self::default() }
  }
}

/// Resolve chain: path locale -> cookie -> Accept-Language -> default locale.
/// Only locales listed in the config are ever returned.
pub fn negotiate(config: &I18nConfig, req: &LocaleRequest) -> String {
  if let Some(loc) = req.path_locale.as_deref().and_then(|loc| find_locale(config, loc)) {
    return loc;
  }
  if let Some(loc) =
    req.cookie_header.as_deref().and_then(|h| parse_cookie_locale(h, &config.cookie_name, config))
  {
    return loc;
  }
  if let Some(loc) = req.accept_language.as_deref().and_then(|h| parse_accept_language(h, config)) {
    return loc;
  }
  config.default_locale.clone()
}

/// Configured spelling of `candidate`, compared case-insensitively.
fn find_locale(config: &I18nConfig, candidate: &str) -> Option<String> {
  config.locales.iter().find(|l| l.eq_ignore_ascii_case(candidate)).cloned()
}

fn parse_cookie_locale(header: &str, name: &str, config: &I18nConfig) -> Option<String> {
  header
    .split(';')
    .filter_map(|pair| pair.trim().split_once('='))
    .filter(|(k, _)| k.trim() == name)
    .find_map(|(_, v)| find_locale(config, v.trim()))
}

fn parse_accept_language(header: &str, config: &I18nConfig) -> Option<String> {
  let mut entries: Vec<(&str, f64)> = Vec::new();
  for part in header.split(',') {
    let mut segments = part.split(';');
    let lang = segments.next().unwrap_or_default().trim();
    if lang.is_empty() || lang == "*" {
      continue;
    }
    let q = segments
      .filter_map(|s| s.trim().strip_prefix("q="))
      .find_map(|v| v.parse::<f64>().ok())
      .unwrap_or(1.0);
    // q=0 means "not acceptable"
    if q > 0.0 {
      entries.push((lang, q));
    }
  }

  // stable: equal weights keep header order
  entries.sort_by(|a, b| b.1.total_cmp(&a.1));

  entries.iter().find_map(|(lang, _)| {
    find_locale(config, lang).or_else(|| {
      // Prefix match: zh-CN -> zh
      let (prefix, _) = lang.split_once('-')?;
      find_locale(config, prefix)
    })
  })
}
