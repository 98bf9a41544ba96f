/* demos/ssr/src/app.rs */

// Sample page: a translated heading, a user card whose data comes from a
// dispatched store action, and a code-split report that pulls its own
// translations when it loads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context as _, Result};
use futures_util::FutureExt;
use serde_json::{Value, json};
use spool_i18n::{Catalog, ChunkTranslationMap, I18nService, TRANSLATOR_KEY, Translator};
use spool_prepare::{
  AsyncComponentOptions, ChunkId, ComponentType, Context, ContextKey, Dispatch, DynamicImport,
  EffectFuture, Node, PrepareError, PreparedOptions, Preparer, STORE_KEY, Store, dispatched,
  render_to_string, with_async_component,
};

use crate::config::DemoConfig;

const APP_CHUNK: ChunkId = 0;
const REPORT_CHUNK: ChunkId = 1;

const USERS_KEY: ContextKey = "demo.users";

/// In-memory store filled by `LOAD_USER` actions.
#[derive(Clone, Default)]
pub struct UserStore {
  users: Arc<Mutex<HashMap<u64, String>>>,
}

impl UserStore {
  pub fn name(&self, id: u64) -> Option<String> {
    self.users.lock().unwrap_or_else(PoisonError::into_inner).get(&id).cloned()
  }
}

impl Dispatch for UserStore {
  fn dispatch(&self, action: Value) -> EffectFuture {
    let users = Arc::clone(&self.users);
    async move {
      match action["type"].as_str() {
        Some("LOAD_USER") => {
          let id = action["id"]
            .as_u64()
            .ok_or_else(|| PrepareError::effect("UserCard", "LOAD_USER without a numeric id"))?;
          // stands in for a backend round trip
          tokio::time::sleep(Duration::from_millis(5)).await;
          let name = match id {
            1 => "Ada".to_string(),
            2 => "Lin".to_string(),
            other => format!("user-{other}"),
          };
          users.lock().unwrap_or_else(PoisonError::into_inner).insert(id, name);
          Ok(())
        }
        other => Err(PrepareError::effect("store", format!("unknown action {other:?}"))),
      }
    }
    .boxed()
  }
}

pub fn register_translations(chunks: &ChunkTranslationMap) {
  chunks.add("app.js", &[APP_CHUNK], &["app.title", "user.greeting"]);
  chunks.add("report.js", &[REPORT_CHUNK], &["report.title", "report.body"]);
}

pub fn catalog() -> Catalog {
  Catalog::new()
    .with_locale(
      "en",
      [
        ("app.title", "Dashboard"),
        ("user.greeting", "Hello, ${name}"),
        ("report.title", "Weekly report"),
        ("report.body", "${count} builds shipped"),
      ],
    )
    .with_locale(
      "zh",
      [
        ("app.title", "仪表盘"),
        ("user.greeting", "你好，${name}"),
        ("report.title", "周报"),
        ("report.body", "本周发布 ${count} 次"),
      ],
    )
}

fn translator(ctx: &Context) -> Result<&Arc<Translator>, PrepareError> {
  ctx.require::<Arc<Translator>>(TRANSLATOR_KEY)
}

fn heading() -> ComponentType {
  ComponentType::from_fn("Heading", |_, ctx| {
    let title = translator(ctx)?.translate("app.title", &Value::Null);
    Ok(Node::host("h1", json!({}), vec![Node::text(title)]))
  })
}

fn user_card() -> Node {
  let card = ComponentType::from_fn("UserCard", |props, ctx| {
    let id = props["id"].as_u64().unwrap_or_default();
    let name = ctx.require::<UserStore>(USERS_KEY)?.name(id).unwrap_or_default();
    let greeting = translator(ctx)?.translate("user.greeting", &json!({ "name": name }));
    Ok(Node::host("p", json!({ "class": "user" }), vec![Node::text(greeting)]))
  });
  dispatched(
    |props, store| store.dispatch(json!({ "type": "LOAD_USER", "id": props["id"] })),
    PreparedOptions::default(),
  )
  .wrap(card)
  .element("user-1", json!({ "id": 1 }))
}

fn report() -> ComponentType {
  ComponentType::from_fn("Report", |props, ctx| {
    let t = translator(ctx)?;
    Ok(Node::host(
      "section",
      json!({ "class": "report" }),
      vec![
        Node::host("h2", json!({}), vec![Node::text(t.translate("report.title", &Value::Null))]),
        Node::host("p", json!({}), vec![Node::text(t.translate("report.body", props))]),
      ],
    ))
  })
}

fn split_report() -> Node {
  let options = AsyncComponentOptions::new(
    "Report",
    || {
      let module = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(report())
      };
      DynamicImport::new(vec![REPORT_CHUNK], module.boxed())
    },
    ComponentType::from_fn("ReportLoading", |_, _| Ok(Node::text("…"))),
    ComponentType::from_fn("ReportError", |props, _| {
      Ok(Node::host("p", json!({ "class": "error" }), vec![Node::text(stringify(&props["code"]))]))
    }),
  );
  with_async_component(options).element("report", json!({ "count": 12 }))
}

fn stringify(value: &Value) -> String {
  value.as_str().map_or_else(|| value.to_string(), ToString::to_string)
}

pub fn page() -> Node {
  Node::host("main", json!({}), vec![heading().element(json!({})), user_card(), split_report()])
}

/// Prepare and render the sample page for the configured request.
pub async fn render_page(config: &DemoConfig) -> Result<String> {
  let chunks = Arc::new(ChunkTranslationMap::new());
  register_translations(&chunks);
  let service = I18nService::new(config.i18n.clone(), chunks, Arc::new(catalog()))?;
  let i18n = service
    .for_request(&config.request.locale_request(), &[APP_CHUNK])
    .await
    .context("failed to load page translations")?;

  let users = UserStore::default();
  let ctx = i18n.attach(
    Context::new().with_value(USERS_KEY, users.clone()).with_value(STORE_KEY, Store::new(users)),
  );

  let tree = page();
  let ctx = Preparer::new(config.prepare.clone())
    .prepare(&tree, ctx)
    .await
    .context("failed to prepare page")?;
  let body = render_to_string(&tree, &ctx).context("failed to render page")?.html;
  tracing::info!(locale = %i18n.locale, bytes = body.len(), "page rendered");

  Ok(format!(
    "<!doctype html><html lang=\"{}\"><body>{body}{}</body></html>",
    i18n.locale,
    i18n.script()
  ))
}

#[cfg(test)]
mod tests {
  use spool_i18n::I18nConfig;
  use spool_prepare::PrepareOptions;

  use super::*;
  use crate::config::RequestSection;

  fn config(accept_language: Option<&str>) -> DemoConfig {
    DemoConfig {
      prepare: PrepareOptions::default(),
      i18n: I18nConfig::new(vec!["en".into(), "zh".into()], "en"),
      request: RequestSection {
        accept_language: accept_language.map(String::from),
        ..RequestSection::default()
      },
    }
  }

  #[tokio::test]
  async fn renders_prepared_page() {
    let html = render_page(&config(None)).await.unwrap();
    assert!(html.starts_with("<!doctype html><html lang=\"en\">"));
    assert!(html.contains("<h1>Dashboard</h1>"));
    assert!(html.contains("<p class=\"user\">Hello, Ada</p>"));
    assert!(html.contains("<h2>Weekly report</h2><p>12 builds shipped</p>"));
  }

  #[tokio::test]
  async fn payload_includes_split_translations() {
    let html = render_page(&config(Some("zh-CN,en;q=0.5"))).await.unwrap();
    assert!(html.contains("<html lang=\"zh\">"));
    let script_start = html.find("<script").unwrap();
    let script = &html[script_start..];
    assert!(script.contains("\"report.title\""));
    assert!(script.contains("\"app.title\""));
    // payload text is pure ASCII
    assert!(script.is_ascii());
  }

  #[tokio::test]
  async fn unknown_action_fails_the_effect() {
    let err = UserStore::default().dispatch(json!({ "type": "NOPE" })).await.unwrap_err();
    assert_eq!(err.code(), "EFFECT_FAILED");
  }
}
