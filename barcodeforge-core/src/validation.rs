//! Validation System - Declarative Field Rules
//!
//! The payload shape is resolved once at the boundary into a [`Payload`].
//! Field rules produce structured violations; the validator folds every
//! violation into a [`ValidationResult`] and never fails itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnsupportedFormat,
    MalformedPayload,
    FieldViolation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolation {
    pub kind: ViolationKind,
    pub field: Option<String>,
    pub message: String,
}

impl ValidationViolation {
    fn field(name: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::FieldViolation,
            field: Some(name.to_string()),
            message: message.into(),
        }
    }

    fn payload(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self { kind, field: None, message: message.into() }
    }
}

impl fmt::Display for ValidationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { is_valid: true, errors: vec![] }
    }

    /// `is_valid` is derived from the violation list, never set independently.
    pub fn from_violations(violations: &[ValidationViolation]) -> Self {
        let errors: Vec<String> = violations.iter().map(ToString::to_string).collect();
        Self { is_valid: errors.is_empty(), errors }
    }
}

/// Declared format of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    /// Case-insensitive lookup; `None` for unrecognized tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// A submission, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    SingleRecord(Map<String, Value>),
    RecordBatch(Vec<Value>),
    RawText(String),
    /// Numbers, booleans and null. Never valid for any format.
    Other(Value),
}

impl Payload {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::SingleRecord(map),
            Value::Array(items) => Self::RecordBatch(items),
            Value::String(text) => Self::RawText(text),
            other => Self::Other(other),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::RawText(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// Must contain something other than whitespace
    NonBlank,
}

/// One declarative constraint on a string field of a record.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub presence: Presence,
    pub checks: &'static [FieldCheck],
}

impl FieldRule {
    pub const fn required(name: &'static str, checks: &'static [FieldCheck]) -> Self {
        Self { name, presence: Presence::Required, checks }
    }

    pub const fn optional(name: &'static str, checks: &'static [FieldCheck]) -> Self {
        Self { name, presence: Presence::Optional, checks }
    }

    pub fn evaluate(&self, record: &Map<String, Value>) -> Option<ValidationViolation> {
        let value = match (record.get(self.name), self.presence) {
            (None, Presence::Required) => {
                return Some(ValidationViolation::field(self.name, "field required"));
            }
            (Some(Value::Null), Presence::Required) => {
                return Some(ValidationViolation::field(self.name, "none is not an allowed value"));
            }
            (None, Presence::Optional) | (Some(Value::Null), Presence::Optional) => return None,
            (Some(value), _) => value,
        };

        let Value::String(text) = value else {
            return Some(ValidationViolation::field(self.name, "str type expected"));
        };

        self.checks.iter().find_map(|check| match check {
            FieldCheck::NonBlank if text.trim().is_empty() => Some(ValidationViolation::field(
                self.name,
                "Field must be a non-empty string.",
            )),
            FieldCheck::NonBlank => None,
        })
    }
}

const NON_BLANK: &[FieldCheck] = &[FieldCheck::NonBlank];

/// Field rules of a product record, in reporting order.
pub const PRODUCT_RULES: [FieldRule; 5] = [
    FieldRule::required("sku", NON_BLANK),
    FieldRule::optional("upc", NON_BLANK),
    FieldRule::optional("ean", NON_BLANK),
    FieldRule::required("name", &[]),
    FieldRule::optional("description", &[]),
];

/// A product submitted for barcode generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub sku: String,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductRecord {
    /// Check a JSON object against [`PRODUCT_RULES`] and build the typed record.
    pub fn from_value(value: &Value) -> Result<Self, Vec<ValidationViolation>> {
        let mut violations = vec![];
        Validator::new().check_record(value, &mut violations);
        if !violations.is_empty() {
            return Err(violations);
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            vec![ValidationViolation::payload(ViolationKind::MalformedPayload, e.to_string())]
        })
    }
}

/// Validator orchestrates field rules over a classified payload
pub struct Validator {
    rules: Vec<FieldRule>,
}

impl Validator {
    pub fn new() -> Self {
        Self { rules: PRODUCT_RULES.to_vec() }
    }

    /// Add a rule evaluated after the existing ones.
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn validate(&self, data_format: &str, payload: &Payload) -> ValidationResult {
        let violations = self.violations(data_format, payload);
        tracing::debug!(
            data_format,
            violations = violations.len(),
            "validated product payload"
        );
        ValidationResult::from_violations(&violations)
    }

    pub fn violations(&self, data_format: &str, payload: &Payload) -> Vec<ValidationViolation> {
        let mut out = vec![];

        match (DataFormat::parse(data_format), payload) {
            (None, _) => out.push(ValidationViolation::payload(
                ViolationKind::UnsupportedFormat,
                format!("Unsupported data format: {}", data_format),
            )),
            (Some(DataFormat::Json), Payload::SingleRecord(record)) => {
                self.check_fields(record, &mut out);
            }
            (Some(DataFormat::Json), Payload::RecordBatch(records)) => {
                for record in records {
                    self.check_record(record, &mut out);
                }
            }
            (Some(DataFormat::Json), _) => out.push(ValidationViolation::payload(
                ViolationKind::MalformedPayload,
                "Invalid JSON data format received.",
            )),
            (Some(DataFormat::Csv), Payload::RawText(text)) => check_rows(text, &mut out),
            (Some(DataFormat::Csv), _) => out.push(ValidationViolation::payload(
                ViolationKind::MalformedPayload,
                "Invalid CSV data format received.",
            )),
        }

        out
    }

    fn check_record(&self, value: &Value, out: &mut Vec<ValidationViolation>) {
        match value {
            Value::Object(record) => self.check_fields(record, out),
            _ => out.push(ValidationViolation::field("record", "value is not a valid dict")),
        }
    }

    fn check_fields(&self, record: &Map<String, Value>, out: &mut Vec<ValidationViolation>) {
        out.extend(self.rules.iter().filter_map(|rule| rule.evaluate(record)));
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Line boundaries: `\r\n`, `\n`, `\r`, VT, FF, FS, GS, RS, NEL, LS, PS.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split into rows; a trailing line break does not open an empty row.
pub fn split_rows(text: &str) -> Vec<&str> {
    let mut rows = vec![];
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        rows.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                end = j + 1;
            }
        }
        start = end;
    }
    if start < text.len() {
        rows.push(&text[start..]);
    }
    rows
}

/// Only blank-row detection; columns are not parsed.
fn check_rows(text: &str, out: &mut Vec<ValidationViolation>) {
    for row in split_rows(text) {
        if row.trim().is_empty() {
            out.push(ValidationViolation::payload(
                ViolationKind::FieldViolation,
                "Empty row found.",
            ));
        }
    }
}

/// Validate with the default product rules.
pub fn validate(data_format: &str, payload: impl Into<Payload>) -> ValidationResult {
    Validator::new().validate(data_format, &payload.into())
}
