//! Parse a detailed character reply into structured fields
//!
//! Model replies are only loosely structured: the object may sit inside a
//! fenced code block, be wrapped in prose, or be broken JSON. Parsing runs an
//! ordered list of strategies and the first one that produces fields wins.
//! A reply with no brace at all is a decoding fault the caller recovers from.
//! Known fields holding nested arrays or objects are kept as their JSON text.

use crate::core::error::{ForgeError, Result};
use crate::core::types::Age;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A record field and the reply keys it may appear under
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

pub const NAME: &str = "name";
pub const AGE: &str = "age";

/// Fields looked up in a reply, in extraction order
pub const FIELDS: [FieldSpec; 7] = [
    FieldSpec { name: NAME, keys: &["name", "nombre"] },
    FieldSpec { name: "title", keys: &["title", "titulo", "título"] },
    FieldSpec { name: AGE, keys: &["age", "edad"] },
    FieldSpec { name: "profession", keys: &["profession", "profesion", "profesión"] },
    FieldSpec { name: "description", keys: &["description", "descripcion", "descripción"] },
    FieldSpec { name: "motivation", keys: &["motivation", "motivacion", "motivación"] },
    FieldSpec { name: "trait", keys: &["trait", "rasgo"] },
];

/// Leading decorations removed from a line used as a name, each at most once
/// and in this order
const DECORATIONS: &[&str] = &[
    "#", "*", "_", "- ", "\"", "name:", "Name:", "nombre:", "Nombre:",
];

/// Fields recovered from a reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    /// Known fields keyed by their canonical name
    pub values: BTreeMap<&'static str, Value>,
    /// Keys of a strict object that are not known fields
    pub extra: BTreeMap<String, Value>,
    /// Which strategy produced the fields
    pub strategy: &'static str,
}

impl ExtractedFields {
    /// Text of a field; null counts as absent, numbers and booleans are rendered
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Name if present and non-blank
    pub fn usable_name(&self) -> Option<String> {
        self.text(NAME)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Age as an integer when it can be read as one, raw text otherwise
    pub fn age(&self) -> Option<Age> {
        match self.values.get(AGE)? {
            Value::Null => None,
            Value::Number(n) => Some(
                n.as_i64()
                    .map(Age::Years)
                    .unwrap_or_else(|| Age::Raw(n.to_string())),
            ),
            Value::String(s) => Some(coerce_age(s)),
            other => Some(Age::Raw(other.to_string())),
        }
    }
}

fn coerce_age(raw: &str) -> Age {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map(Age::Years)
        .unwrap_or_else(|_| Age::Raw(trimmed.to_string()))
}

enum Attempt {
    Parsed(ExtractedFields),
    /// This strategy could not read the reply; try the next one
    Declined(String),
    /// Stop the cascade with this fault
    Abort(ForgeError),
}

type Strategy = fn(&str) -> Attempt;

const CASCADE: &[(&str, Strategy)] = &[
    ("strict object", strict_object),
    ("labeled fields", labeled_fields),
];

/// Run the parse cascade over a raw reply.
///
/// Fails with `ForgeError::Decoding` when the reply holds no object at all.
pub fn parse_character(raw: &str) -> Result<ExtractedFields> {
    for (label, strategy) in CASCADE {
        match strategy(raw) {
            Attempt::Parsed(fields) => {
                tracing::debug!("Reply parsed by {} strategy", label);
                return Ok(fields);
            }
            Attempt::Declined(reason) => {
                tracing::debug!("{} strategy declined: {}", label, reason);
            }
            Attempt::Abort(e) => return Err(e),
        }
    }
    Err(ForgeError::Decoding("no strategy could read the reply".into()))
}

/// Interior of the first fenced block, preferring a `json`-tagged fence
pub fn isolate_fence(raw: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(start) = raw.find(fence) {
            let rest = &raw[start + fence.len()..];
            return rest.split("```").next().unwrap_or(rest);
        }
    }
    raw
}

/// Cut text down to the span from the first `{` to the last `}`.
///
/// Returns `None` when there is no opening brace at all.
pub fn isolate_object(text: &str) -> Option<&str> {
    let mut text = text.trim();
    if !text.starts_with('{') {
        let start = text.find('{')?;
        text = &text[start..];
    }
    if !text.ends_with('}') {
        if let Some(end) = text.rfind('}') {
            text = &text[..=end];
        }
    }
    Some(text)
}

fn strict_object(raw: &str) -> Attempt {
    let Some(isolated) = isolate_object(isolate_fence(raw)) else {
        return Attempt::Abort(ForgeError::Decoding("no JSON structure found".into()));
    };

    // Isolation guarantees a leading brace, so anything that parses is an object
    match serde_json::from_str::<Map<String, Value>>(isolated) {
        Ok(map) => Attempt::Parsed(from_object(map)),
        Err(e) => Attempt::Declined(e.to_string()),
    }
}

fn from_object(mut map: Map<String, Value>) -> ExtractedFields {
    let mut values = BTreeMap::new();
    for field in FIELDS {
        if let Some(value) = field.keys.iter().find_map(|key| map.remove(*key)) {
            if value.is_array() || value.is_object() {
                tracing::debug!("Field '{}' holds a nested value, keeping its JSON text", field.name);
            }
            values.insert(field.name, value);
        }
    }
    ExtractedFields {
        values,
        extra: map.into_iter().collect(),
        strategy: "strict object",
    }
}

struct FieldPatterns {
    field: FieldSpec,
    quoted: Vec<Regex>,
    bare: Vec<Regex>,
}

fn field_patterns() -> &'static [FieldPatterns] {
    static PATTERNS: OnceLock<Vec<FieldPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FIELDS
            .iter()
            .map(|field| {
                let build = |template: &str| -> Vec<Regex> {
                    field
                        .keys
                        .iter()
                        .filter_map(|key| {
                            Regex::new(&template.replace("KEY", &regex::escape(key))).ok()
                        })
                        .collect()
                };
                FieldPatterns {
                    field: *field,
                    quoted: build(r#""KEY"\s*:\s*"([^"]*)""#),
                    bare: build(r#""KEY"\s*:\s*([^,"\n]*)"#),
                }
            })
            .collect()
    })
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Per-field extraction over the unmodified reply. Never declines.
fn labeled_fields(raw: &str) -> Attempt {
    let mut values = BTreeMap::new();
    for patterns in field_patterns() {
        let name = patterns.field.name;
        if let Some(quoted) = first_capture(&patterns.quoted, raw) {
            values.insert(name, Value::String(quoted));
        } else if let Some(bare) = first_capture(&patterns.bare, raw) {
            let bare = bare.trim();
            let value = match (name, bare.parse::<i64>()) {
                (AGE, Ok(years)) => Value::from(years),
                _ => Value::String(bare.to_string()),
            };
            values.insert(name, value);
        }
    }
    tracing::debug!("Extracted {} labeled fields", values.len());
    Attempt::Parsed(ExtractedFields {
        values,
        extra: BTreeMap::new(),
        strategy: "labeled fields",
    })
}

/// Remove known leading decorations from a line
pub fn strip_decorations(line: &str) -> String {
    let mut line = line.trim();
    for prefix in DECORATIONS {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest.trim();
        }
    }
    line.to_string()
}

/// First line of the reply, as used to derive a missing name
pub fn first_line(raw: &str) -> &str {
    raw.split('\n').next().unwrap_or("").trim()
}

/// First line of the reply that is not blank
pub fn first_non_empty_line(raw: &str) -> &str {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
