/*!
Declarative parameter schemas.

  ParamSpec / ParamKind / DefaultValue : per-parameter declaration (const-friendly)
  validate(params, raw)                : generic check + default filling
  input_schema(params)                 : JSON Schema object advertised via tools/list

Validation collects every violation instead of stopping at the first one so
callers can fix a request in a single round trip.
*/

use std::fmt;

use chrono::DateTime;
use serde_json::{Map, Value, json};

pub type JsonObject = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamKind {
    String,
    /// RFC3339 timestamp carried as a string.
    DateTime,
    Integer {
        minimum: u64,
    },
    Boolean,
    Enum(&'static [&'static str]),
    StringArray,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Integer(u64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            DefaultValue::Str(s) => Value::String(s.to_string()),
            DefaultValue::Integer(n) => Value::from(n),
            DefaultValue::Bool(b) => Value::Bool(b),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description,
        }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Short type label for human listings.
    pub fn type_label(&self) -> String {
        match self.kind {
            ParamKind::String => "string".into(),
            ParamKind::DateTime => "datetime".into(),
            ParamKind::Integer { .. } => "integer".into(),
            ParamKind::Boolean => "boolean".into(),
            ParamKind::Enum(values) => values.join("|"),
            ParamKind::StringArray => "string[]".into(),
        }
    }

    /// Check a single present (non-null) value, returning it in canonical form.
    fn check(&self, value: &Value) -> Result<Value, String> {
        match self.kind {
            ParamKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Err(expected("a string", other)),
            },
            ParamKind::DateTime => match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|_| value.clone())
                    .map_err(|e| format!("must be an RFC3339 timestamp ({e}), got {s:?}")),
                other => Err(expected("an RFC3339 timestamp string", other)),
            },
            ParamKind::Integer { minimum } => match whole_number(value) {
                Some(n) if n >= minimum => Ok(Value::from(n)),
                Some(n) => Err(format!("must be at least {minimum}, got {n}")),
                None => Err(expected(&format!("a whole number >= {minimum}"), value)),
            },
            ParamKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(expected("a boolean", other)),
            },
            ParamKind::Enum(values) => match value.as_str() {
                Some(s) if values.contains(&s) => Ok(value.clone()),
                _ => Err(format!(
                    "must be one of {}, got {value}",
                    values.join(", ")
                )),
            },
            ParamKind::StringArray => match value {
                Value::Array(items) => match items.iter().position(|v| !v.is_string()) {
                    None => Ok(value.clone()),
                    Some(idx) => Err(format!("item {idx} must be a string, got {}", items[idx])),
                },
                other => Err(expected("an array of strings", other)),
            },
        }
    }

    fn json_schema(&self) -> Value {
        let mut prop = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::DateTime => json!({ "type": "string", "format": "date-time" }),
            ParamKind::Integer { minimum } => json!({ "type": "integer", "minimum": minimum }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        };
        if let Value::Object(map) = &mut prop {
            map.insert("description".into(), Value::from(self.description));
            if let Some(d) = self.default {
                map.insert("default".into(), d.to_json());
            }
        }
        prop
    }
}

/// Non-negative whole JSON number; `100.0` counts, `10.5` does not.
fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

fn expected(what: &str, got: &Value) -> String {
    format!("expected {what}, got {got}")
}

/// One schema violation: which field and what is wrong with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub problem: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Validate `raw` against `params` and return a copy with defaults filled in.
///
/// - `None` (no arguments sent) is treated as an empty object.
/// - `null` values count as absent.
/// - Keys not declared in `params` are dropped.
pub fn validate(params: &[ParamSpec], raw: Option<&JsonObject>) -> Result<JsonObject, Vec<Violation>> {
    let empty = JsonObject::new();
    let raw = raw.unwrap_or(&empty);
    let mut out = JsonObject::new();
    let mut violations = Vec::new();

    for spec in params {
        match raw.get(spec.name).filter(|v| !v.is_null()) {
            Some(value) => match spec.check(value) {
                Ok(canonical) => {
                    out.insert(spec.name.to_string(), canonical);
                }
                Err(problem) => violations.push(Violation::new(spec.name, problem)),
            },
            None if spec.required => violations.push(Violation::new(spec.name, "is required")),
            None => {
                if let Some(d) = spec.default {
                    out.insert(spec.name.to_string(), d.to_json());
                }
            }
        }
    }

    for key in raw.keys() {
        if !params.iter().any(|p| p.name == key) {
            tracing::debug!(field = %key, "ignoring undeclared argument");
        }
    }

    if violations.is_empty() {
        Ok(out)
    } else {
        Err(violations)
    }
}

/// Build the JSON Schema object advertised as a tool's `inputSchema`.
pub fn input_schema(params: &[ParamSpec]) -> JsonObject {
    let properties: JsonObject = params
        .iter()
        .map(|p| (p.name.to_string(), p.json_schema()))
        .collect();
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    let mut schema = JsonObject::new();
    schema.insert("type".into(), Value::from("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }
    schema
}
