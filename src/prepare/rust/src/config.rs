/* src/prepare/rust/src/config.rs */

use serde::Deserialize;

/// How a rejected side effect affects the rest of a prepare pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
  /// First rejection fails the whole pass with that error.
  #[default]
  Abort,
  /// A rejection is recorded against its node, whose subtree is skipped;
  /// the real render shows that node's error fallback.
  Isolate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrepareOptions {
  pub error_policy: ErrorPolicy,
}

impl PrepareOptions {
  pub fn isolated() -> Self {
    Self { error_policy: ErrorPolicy::Isolate }
  }
}
