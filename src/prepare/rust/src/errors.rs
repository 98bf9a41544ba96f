/* src/prepare/rust/src/errors.rs */

use thiserror::Error;

/// Failure raised while preparing or rendering a tree.
///
/// Cloneable because a side effect's outcome is shared by every waiter on the
/// same memo entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
  #[error("side effect of {component} failed: {message}")]
  Effect { component: String, message: String },
  #[error("missing context value '{key}'")]
  MissingContext { key: String },
  #[error("render of {component} failed: {message}")]
  Render { component: String, message: String },
  #[error("failed to load module {module}: {message}")]
  Load { module: String, message: String },
}

impl PrepareError {
  pub fn effect(component: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Effect { component: component.into(), message: message.into() }
  }

  pub fn missing_context(key: impl Into<String>) -> Self {
    Self::MissingContext { key: key.into() }
  }

  pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Render { component: component.into(), message: message.into() }
  }

  pub fn load(module: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Load { module: module.into(), message: message.into() }
  }

  /// Stable machine-readable code, used in error fallback props.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Effect { .. } => "EFFECT_FAILED",
      Self::MissingContext { .. } => "MISSING_CONTEXT",
      Self::Render { .. } => "RENDER_FAILED",
      Self::Load { .. } => "LOAD_FAILED",
    }
  }
}
