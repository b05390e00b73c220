//! Text coercion of runtime values.

use std::collections::HashSet;
use std::fmt;

use crate::value::{RefId, Value};

impl Value {
    /// The value's text form, as string coercion in a script would give it.
    ///
    /// Cyclic arrays contribute an empty string at the point of recursion.
    /// Host values fall back to their own display text.
    pub fn to_display_string(&self) -> String {
        let mut joining = HashSet::new();
        coerce(self, &mut joining)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

fn coerce(value: &Value, joining: &mut HashSet<RefId>) -> String {
    match value {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::BigInt(n) => n.to_string(),
        Value::Symbol(desc) => format!("Symbol({})", desc.as_deref().unwrap_or("")),
        Value::Function(f) => format!("function {}() {{ [native code] }}", f.name),
        Value::Error(e) => e.header(),
        Value::Array(arr) => {
            if !joining.insert(arr.id()) {
                return String::new();
            }
            let parts: Vec<String> = arr
                .snapshot()
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        coerce(item, joining)
                    }
                })
                .collect();
            joining.remove(&arr.id());
            parts.join(",")
        }
        Value::Object(_) => "[object Object]".into(),
        Value::Host(h) => h.display(),
    }
}

/// Formats a number the way script engines print them.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // Exponent form: `1e+21`, `1.5e-7`.
        let text = format!("{n:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    if n.fract() == 0.0 {
        return format!("{n:.0}");
    }
    n.to_string()
}
