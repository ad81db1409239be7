//! Values for new objects and their textual rendering.

use crate::id::ObjectId;

/// A value to be written into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    /// An object reference, written with its `/* comment */` annotation.
    Ref(ObjectId, Option<String>),
    List(Vec<Value>),
    Dict(Vec<(String, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn reference(id: &ObjectId, comment: impl Into<String>) -> Self {
        Value::Ref(id.clone(), Some(comment.into()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b'.')
}

/// Quotes a string the way Xcode does: bare when it only contains
/// `[A-Za-z0-9_$/.]` and is non-empty, otherwise double-quoted with escapes.
pub fn quote(s: &str) -> String {
    if !s.is_empty() && s.bytes().all(is_plain) && !s.contains("//") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

pub(crate) fn tabs(n: usize) -> String {
    "\t".repeat(n)
}

/// Renders `value` as it appears after `key = `. Multi-line layouts indent
/// nested lines by `indent + 1` tabs and close at `indent`.
pub fn render(value: &Value, indent: usize, inline: bool) -> String {
    match value {
        Value::Str(s) => quote(s),
        Value::Ref(id, comment) => match comment {
            Some(c) => format!("{id} /* {c} */"),
            None => id.to_string(),
        },
        Value::List(items) if inline => {
            let mut out = String::from("(");
            for item in items {
                out.push_str(&render(item, indent, true));
                out.push_str(", ");
            }
            out.push(')');
            out
        }
        Value::List(items) => {
            let mut out = String::from("(\n");
            for item in items {
                out.push_str(&tabs(indent + 1));
                out.push_str(&render(item, indent + 1, false));
                out.push_str(",\n");
            }
            out.push_str(&tabs(indent));
            out.push(')');
            out
        }
        Value::Dict(entries) if inline => {
            let mut out = String::from("{");
            for (k, v) in entries {
                out.push_str(&format!("{} = {}; ", quote(k), render(v, indent, true)));
            }
            out.push('}');
            out
        }
        Value::Dict(entries) => {
            let mut out = String::from("{\n");
            for (k, v) in entries {
                out.push_str(&tabs(indent + 1));
                out.push_str(&format!("{} = {};\n", quote(k), render(v, indent + 1, false)));
            }
            out.push_str(&tabs(indent));
            out.push('}');
            out
        }
    }
}

/// Renders a complete object definition line (without leading indentation).
pub fn render_object(
    id: &ObjectId,
    comment: Option<&str>,
    isa: &str,
    fields: &[(String, Value)],
    indent: usize,
    inline: bool,
) -> String {
    let mut body = Vec::with_capacity(fields.len() + 1);
    body.push(("isa".to_string(), Value::str(isa)));
    body.extend(fields.iter().cloned());

    let key = match comment {
        Some(c) => format!("{id} /* {c} */"),
        None => id.to_string(),
    };
    format!("{key} = {};", render(&Value::Dict(body), indent, inline))
}
