//! `{field}` templates for rendering records.
//!
//! `{{` and `}}` are literal braces. Missing fields render as nothing,
//! strings render bare, everything else renders as compact JSON.

use serde_json::Value;

/// Render `template` against the fields of `record`.
pub fn render(template: &str, record: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if closed {
                    out.push_str(&field_text(record.get(field.as_str())));
                } else {
                    out.push('{');
                    out.push_str(&field);
                }
            }
            c => out.push(c),
        }
    }

    out
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
