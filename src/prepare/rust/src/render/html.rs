/* src/prepare/rust/src/render/html.rs */

use serde_json::Value;

/// Attributes whose mere presence means "on".
fn is_flag_attr(name: &str) -> bool {
  matches!(
    name,
    "async"
      | "autofocus"
      | "autoplay"
      | "checked"
      | "controls"
      | "defer"
      | "disabled"
      | "hidden"
      | "inert"
      | "loop"
      | "multiple"
      | "muted"
      | "open"
      | "readonly"
      | "required"
      | "selected"
  )
}

/// Whether a flag attribute is switched on. Zero, empty strings and empty
/// arrays count as off.
fn flag_on(value: &Value) -> bool {
  match value {
    Value::Null | Value::Bool(false) => false,
    Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(items) => !items.is_empty(),
    _ => true,
  }
}

const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
  "wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
  VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      c => out.push(c),
    }
  }
  out
}

/// Serialize an attribute object. Null and `false` are omitted; flag
/// attributes render as `name=""` when on.
pub(crate) fn write_attrs(attrs: &Value, out: &mut String) {
  let Some(obj) = attrs.as_object() else {
    return;
  };
  for (name, value) in obj {
    if matches!(value, Value::Null | Value::Bool(false)) {
      continue;
    }
    if is_flag_attr(name) {
      if flag_on(value) {
        out.push_str(&format!(" {name}=\"\""));
      }
      continue;
    }
    let text = match value {
      Value::String(text) => escape_html(text),
      other => escape_html(&other.to_string()),
    };
    out.push_str(&format!(" {name}=\"{text}\""));
  }
}
