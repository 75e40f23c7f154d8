//! Requested output fields and their typed values.
//!
//! Callers describe what they want as a list of [`EnrichmentField`]s. Each
//! field carries a closed [`FieldKind`] tag; values coming back from the
//! extraction backend are coerced into a matching [`FieldValue`] at the
//! boundary instead of being passed around as untyped JSON.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Value kind a field is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    String,
    Number,
    Boolean,
    Array,
}

impl FieldKind {
    /// JSON schema type name for prompts.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array of strings",
        }
    }
}

/// A field the caller wants filled for every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentField {
    /// Key used in the result map
    pub name: String,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// What the field means, in plain language
    #[serde(default)]
    pub description: String,

    /// Expected value kind
    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    /// Whether the caller considers this field mandatory
    #[serde(default)]
    pub required: bool,
}

impl EnrichmentField {
    /// Create a new optional field.
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: description.into(),
            kind,
            required: false,
        }
    }

    /// Shorthand for a string field.
    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, FieldKind::String)
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Label to show in prompts and progress messages.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Lowercased name used by keyword rules.
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }

    /// Lowercased description used by keyword rules.
    pub fn description_lower(&self) -> String {
        self.description.to_lowercase()
    }

    /// Validate the definition at the boundary.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::EnrichmentError::InvalidField {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    List(Vec<String>),
}

lazy_static! {
    static ref NUMBER_PATTERN: Regex = Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(thousand|million|billion|bn|k|m|b)?\b"
    )
    .unwrap();
}

impl FieldValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::String,
            Self::Number(_) => FieldKind::Number,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::List(_) => FieldKind::Array,
        }
    }

    /// Coerce raw JSON into the declared kind.
    ///
    /// Returns `None` for null, empty strings, empty lists, and values that
    /// cannot be interpreted as the declared kind. Callers treat `None` as
    /// "not found" and omit the field.
    pub fn coerce(raw: &serde_json::Value, kind: FieldKind) -> Option<Self> {
        use serde_json::Value;

        match (kind, raw) {
            (_, Value::Null) => None,

            (FieldKind::String, Value::String(s)) => non_placeholder(s).map(Self::Text),
            (FieldKind::String, Value::Number(n)) => Some(Self::Text(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Some(Self::Text(b.to_string())),
            (FieldKind::String, Value::Array(items)) => {
                let joined = string_items(items).join(", ");
                (!joined.is_empty()).then_some(Self::Text(joined))
            }

            (FieldKind::Number, Value::Number(n)) => n.as_f64().map(Self::Number),
            (FieldKind::Number, Value::String(s)) => parse_number(s).map(Self::Number),

            (FieldKind::Boolean, Value::Bool(b)) => Some(Self::Boolean(*b)),
            (FieldKind::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" => Some(Self::Boolean(true)),
                "false" | "no" | "n" => Some(Self::Boolean(false)),
                _ => None,
            },

            (FieldKind::Array, Value::Array(items)) => {
                let list = string_items(items);
                (!list.is_empty()).then_some(Self::List(list))
            }
            (FieldKind::Array, Value::String(s)) => {
                let list: Vec<String> = s
                    .split([',', ';', '\n'])
                    .filter_map(non_placeholder)
                    .collect();
                (!list.is_empty()).then_some(Self::List(list))
            }

            _ => None,
        }
    }

    /// Text view for string values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List view for array values.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Plain-text rendering used for citation matching and logs.
    pub fn display_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::List(items) => items.join(", "),
        }
    }
}

fn non_placeholder(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let lower = trimmed.to_lowercase();
    let placeholder = trimmed.is_empty()
        || matches!(
            lower.as_str(),
            "null" | "none" | "n/a" | "na" | "unknown" | "not found" | "not available" | "-"
        );
    (!placeholder).then(|| trimmed.to_string())
}

fn string_items(items: &[serde_json::Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => non_placeholder(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Parse free text like "$1.2M", "about 1,200 employees" or "3 billion".
pub fn parse_number(text: &str) -> Option<f64> {
    let caps = NUMBER_PATTERN.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let base: f64 = digits.parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("k") | Some("thousand") => 1e3,
        Some("m") | Some("million") => 1e6,
        Some("b") | Some("bn") | Some("billion") => 1e9,
        _ => 1.0,
    };
    Some(base * multiplier)
}

/// Name → kind schema built from the requested fields.
///
/// Preserves the caller's field order so prompts and results are stable.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    kinds: IndexMap<String, FieldKind>,
}

impl FieldSchema {
    /// Build a schema from field definitions. Later duplicates are ignored.
    pub fn from_fields(fields: &[EnrichmentField]) -> Self {
        let mut kinds = IndexMap::new();
        for field in fields {
            kinds.entry(field.name.clone()).or_insert(field.kind);
        }
        Self { kinds }
    }

    /// Kind for a field name.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.kinds.get(name).copied()
    }

    /// Whether the schema contains a field.
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Coerce a raw value for a named field.
    pub fn coerce(&self, name: &str, raw: &serde_json::Value) -> Option<FieldValue> {
        FieldValue::coerce(raw, self.kind_of(name)?)
    }

    /// JSON description of the expected output shape, for prompts.
    pub fn to_json_shape(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .kinds
            .iter()
            .map(|(name, kind)| (name.clone(), serde_json::Value::from(kind.json_type())))
            .collect();
        serde_json::Value::Object(properties)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
