//! Indented text rendering of JSON payloads.
//!
//! Daemon responses are decoded into a [`serde_json::Value`] and printed as a
//! tree: one line per map key or sequence element, nested containers wrapped
//! in `{` … `}` with their contents one level (four spaces) deeper. Map keys
//! keep the order they had in the payload.
//!
//! ```text
//! name: "eth0"
//! addresses: {
//!     [0]: "10.0.0.2"
//!     [1]: "fe80::1"
//! }
//! ```

use serde_json::{Number, Value};

/// Spaces per nesting level.
pub const INDENT_WIDTH: usize = 4;

/// A payload that is not well-formed JSON.
#[derive(Debug, thiserror::Error)]
#[error("could not parse response: {0}")]
pub struct RenderError(#[from] serde_json::Error);

/// Decode `raw` and render it. Nothing is rendered unless the whole payload
/// decodes.
pub fn render(raw: &[u8]) -> Result<String, RenderError> {
    let value: Value = serde_json::from_slice(raw)?;
    Ok(render_value(&value))
}

/// Render an already decoded value.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    write_block(&mut out, value, 0);
    out
}

/// Write `value` as a sequence of lines at `level`.
fn write_block(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                indent(out, level);
                out.push_str(&format!("[{i}]: "));
                write_inline(out, item, level);
                out.push('\n');
            }
        }
        Value::Object(map) if !map.is_empty() => {
            for (key, item) in map {
                indent(out, level);
                out.push_str(key);
                out.push_str(": ");
                write_inline(out, item, level);
                out.push('\n');
            }
        }
        _ => {
            indent(out, level);
            write_inline(out, value, level);
            out.push('\n');
        }
    }
}

/// Write `value` after a label on the current line. Containers open a brace
/// here and close it on their own line at `level`.
fn write_inline(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(_) | Value::Object(_) => {
            out.push_str("{\n");
            write_block(out, value, level + 1);
            indent(out, level);
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        // Display is the shortest representation that round-trips.
        out.push_str(&f.to_string());
    }
}

fn indent(out: &mut String, level: usize) {
    out.extend(std::iter::repeat_n(' ', level * INDENT_WIDTH));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn r(json: &str) -> String {
        render(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(r("null"), "null\n");
        assert_eq!(r("true"), "true\n");
        assert_eq!(r("false"), "false\n");
        assert_eq!(r("42"), "42\n");
        assert_eq!(r("-7"), "-7\n");
        assert_eq!(r("\"eth0\""), "\"eth0\"\n");
    }

    #[test]
    fn test_numbers_keep_precision() {
        assert_eq!(r("18446744073709551615"), "18446744073709551615\n");
        assert_eq!(r("0.1"), "0.1\n");
        assert_eq!(r("3.141592653589793"), "3.141592653589793\n");
        assert_eq!(r("2.5e-3"), "0.0025\n");
    }

    #[test]
    fn test_strings_are_not_escaped() {
        assert_eq!(r(r#""say \"hi\"\tnow""#), "\"say \"hi\"\tnow\"\n");
    }

    #[test]
    fn test_flat_map_keeps_source_order() {
        let out = r(r#"{"zeta": 1, "alpha": "a", "mid": null}"#);
        assert_eq!(out, "zeta: 1\nalpha: \"a\"\nmid: null\n");
    }

    #[test]
    fn test_top_level_sequence() {
        let out = r(r#"[1, "two", false]"#);
        assert_eq!(out, "[0]: 1\n[1]: \"two\"\n[2]: false\n");
    }

    #[test]
    fn test_nested_containers_indent() {
        let out = r(r#"{"name": "eth0", "addrs": ["10.0.0.2", {"v6": "fe80::1"}], "up": true}"#);
        let expected = "\
name: \"eth0\"
addrs: {
    [0]: \"10.0.0.2\"
    [1]: {
        v6: \"fe80::1\"
    }
}
up: true
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_sequence_of_maps() {
        let out = r(r#"[{"job": "relay", "status": 1}, {"job": "edge"}]"#);
        let expected = "\
[0]: {
    job: \"relay\"
    status: 1
}
[1]: {
    job: \"edge\"
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(r("{}"), "{}\n");
        assert_eq!(r("[]"), "[]\n");
        assert_eq!(r(r#"{"a": {}, "b": []}"#), "a: {}\nb: []\n");
    }

    #[test]
    fn test_deep_nesting_terminates() {
        let depth = 64;
        let json = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        let out = r(&json);
        assert_eq!(out.matches('1').count(), 1);
        assert!(out.contains(&" ".repeat((depth - 1) * INDENT_WIDTH)));
    }

    #[test]
    fn test_every_leaf_once_in_order() {
        let out = r(r#"{"a": ["leaf-1", {"b": "leaf-2", "c": ["leaf-3"]}], "d": "leaf-4"}"#);
        let mut last = 0;
        for leaf in ["leaf-1", "leaf-2", "leaf-3", "leaf-4"] {
            assert_eq!(out.matches(leaf).count(), 1, "{leaf} in {out}");
            let at = out.find(leaf).unwrap();
            assert!(at >= last, "{leaf} out of order");
            last = at;
        }
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        for bad in ["", "{", "{\"a\": }", "[1, 2", "nope", "{\"a\": 1} trailing"] {
            assert!(render(bad.as_bytes()).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_error_display() {
        let err = render(b"{").unwrap_err();
        assert!(err.to_string().starts_with("could not parse response"));
    }
}
