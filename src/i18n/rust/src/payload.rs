/* src/i18n/rust/src/payload.rs */

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::escape::{ascii_escape_json, escape_attr, escape_script_json};

/// Serialize translations for the client. Key order is stable.
pub fn translations_json(translations: &BTreeMap<String, String>) -> String {
  let map: Map<String, Value> =
    translations.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
  escape_script_json(&ascii_escape_json(&Value::Object(map).to_string()))
}

/// The `<script>` element the client reads its initial translations from.
pub fn translations_script(script_id: &str, translations: &BTreeMap<String, String>) -> String {
  format!(
    "<script type=\"application/json\" id=\"{}\">{}</script>",
    escape_attr(script_id),
    translations_json(translations)
  )
}
