//! Style objects to CSS text.

use super::parse::{Object, Value};

/// Properties whose numeric values take no unit.
const UNITLESS: &[&str] = &[
    "opacity",
    "zIndex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "order",
    "zoom",
];

/// A flat rule, optionally wrapped in a media query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Rule {
    pub selector: String,
    pub media: Option<String>,
    pub declarations: Vec<(String, String)>,
}

/// Flatten a style object rooted at `selector` into `out`.
///
/// Nested rules follow their parent, so source order is preserved.
pub(super) fn flatten(
    selector: &str,
    object: &Object,
    media: Option<&str>,
    out: &mut Vec<Rule>,
) -> Result<(), String> {
    let index = out.len();
    out.push(Rule {
        selector: selector.to_string(),
        media: media.map(str::to_string),
        declarations: Vec::new(),
    });

    let mut declarations = Vec::new();
    for (key, value) in object {
        match (key.as_str(), value) {
            ("selectors", Value::Object(nested)) => {
                for (pattern, value) in nested {
                    let Value::Object(body) = value else {
                        return Err(format!("selector `{pattern}` must map to an object"));
                    };
                    if !pattern.contains('&') {
                        return Err(format!("selector `{pattern}` must reference `&`"));
                    }
                    flatten(&pattern.replace('&', selector), body, media, out)?;
                }
            }
            ("@media", Value::Object(queries)) => {
                for (query, value) in queries {
                    let Value::Object(body) = value else {
                        return Err(format!("media query `{query}` must map to an object"));
                    };
                    let combined = match media {
                        Some(outer) => format!("{outer} and {query}"),
                        None => query.clone(),
                    };
                    flatten(selector, body, Some(&combined), out)?;
                }
            }
            (pseudo, Value::Object(body)) if pseudo.starts_with(':') => {
                flatten(&format!("{selector}{pseudo}"), body, media, out)?;
            }
            (_, Value::Object(_)) => {
                return Err(format!("unsupported nested key `{key}`"));
            }
            (_, scalar) => declarations.push((property_name(key), property_value(key, scalar))),
        }
    }

    if declarations.is_empty() {
        out.remove(index);
    } else {
        out[index].declarations = declarations;
    }
    Ok(())
}

/// Serialize rules, one block per rule.
pub(super) fn render(rules: &[Rule]) -> String {
    let mut css = String::new();
    for rule in rules {
        if !css.is_empty() {
            css.push('\n');
        }
        match &rule.media {
            Some(query) => {
                css.push_str(&format!("@media {query} {{\n"));
                write_block(&mut css, rule, "  ");
                css.push_str("}\n");
            }
            None => write_block(&mut css, rule, ""),
        }
    }
    css
}

fn write_block(css: &mut String, rule: &Rule, indent: &str) {
    css.push_str(&format!("{indent}{} {{\n", rule.selector));
    for (property, value) in &rule.declarations {
        css.push_str(&format!("{indent}  {property}: {value};\n"));
    }
    css.push_str(&format!("{indent}}}\n"));
}

/// `backgroundColor` → `background-color`, `WebkitTapHighlightColor` →
/// `-webkit-tap-highlight-color`. Custom properties are kept as written.
fn property_name(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if i == 0 && key.starts_with("ms") && key[2..].starts_with(char::is_uppercase) {
            out.push('-');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn property_value(key: &str, value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) if is_zero(n) || UNITLESS.contains(&key) || key.starts_with("--") => {
            n.clone()
        }
        Value::Num(n) => format!("{n}px"),
        // nested objects are routed before this point
        Value::Object(_) => String::new(),
    }
}

fn is_zero(number: &str) -> bool {
    number.parse::<f64>().is_ok_and(|n| n == 0.0)
}
