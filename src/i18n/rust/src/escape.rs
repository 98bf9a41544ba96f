/* src/i18n/rust/src/escape.rs */

/// Escape non-ASCII characters inside JSON strings to `\uXXXX` sequences,
/// using surrogate pairs outside the BMP. Existing escapes are left alone.
pub fn ascii_escape_json(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  let mut in_string = false;
  let mut chars = json.chars();

  while let Some(ch) = chars.next() {
    if !in_string {
      in_string = ch == '"';
      out.push(ch);
      continue;
    }
    match ch {
      '\\' => {
        out.push(ch);
        if let Some(next) = chars.next() {
          out.push(next);
        }
      }
      '"' => {
        in_string = false;
        out.push(ch);
      }
      c if c.is_ascii() => out.push(c),
      c => {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
          out.push_str(&format!("\\u{unit:04x}"));
        }
      }
    }
  }
  out
}

/// Make JSON safe to inline in a `<script>` element: `<`, `>` and `&` become
/// unicode escapes so no `</script>` or `<!--` sequence can appear.
pub fn escape_script_json(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  for ch in json.chars() {
    match ch {
      '<' => out.push_str("\\u003c"),
      '>' => out.push_str("\\u003e"),
      '&' => out.push_str("\\u0026"),
      c => out.push(c),
    }
  }
  out
}

pub fn escape_attr(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('"', "&quot;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ascii_passthrough() {
    let input = r#"{"key":"hello"}"#;
    assert_eq!(ascii_escape_json(input), input);
  }

  #[test]
  fn escapes_cjk_in_values() {
    assert_eq!(ascii_escape_json(r#"{"msg":"你好"}"#), r#"{"msg":"\u4f60\u597d"}"#);
  }

  #[test]
  fn surrogate_pair_for_emoji() {
    assert_eq!(ascii_escape_json(r#"{"e":"😀"}"#), r#"{"e":"\ud83d\ude00"}"#);
  }

  #[test]
  fn preserves_existing_escapes() {
    let input = r#"{"a":"say \"hi\"","b":"line\nbreak"}"#;
    assert_eq!(ascii_escape_json(input), input);
  }

  #[test]
  fn line_separators_are_escaped() {
    assert_eq!(ascii_escape_json("{\"a\":\"x\u{2028}y\"}"), r#"{"a":"x\u2028y"}"#);
  }

  #[test]
  fn script_breakers_are_escaped() {
    let input = r#"{"a":"</script><!--&"}"#;
    assert_eq!(escape_script_json(input), r#"{"a":"\u003c/script\u003e\u003c!--\u0026"}"#);
  }

  #[test]
  fn attr_escaping() {
    assert_eq!(escape_attr(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
  }
}
