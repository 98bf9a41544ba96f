/* demos/ssr/src/main.rs */

mod app;
mod config;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
  init_tracing();

  let cwd = std::env::current_dir().context("failed to read current directory")?;
  let explicit = std::env::var_os(config::CONFIG_ENV).map(PathBuf::from);
  let path = config::resolve_config_path(explicit, &cwd)?;
  let config = config::load_config(&path)?;
  tracing::info!(path = %path.display(), locales = ?config.i18n.locales, "config loaded");

  let html = app::render_page(&config).await?;
  let mut stdout = std::io::stdout().lock();
  writeln!(stdout, "{html}").context("failed to write page")?;
  Ok(())
}
