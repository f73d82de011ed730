//! Declarative form schemas and their evaluator.
//!
//! A [`Schema`] is an ordered list of [`Field`]s plus cross-field
//! [`Refinement`]s. Each field is addressed by a dot path (`address.cep`),
//! normalized by a [`Coercion`] and checked against its [`Rule`]s in order;
//! the first failing rule supplies the field's message. Validation never
//! short-circuits across fields, so a form can render every error at once.

use crate::domain::format::digits_only;
use crate::domain::input::FieldInput;
use crate::infrastructure::clock::local_today;
use chrono::NaiveDate;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Key used in [`FieldErrors`] for problems not tied to a single field.
pub const FORM_ERROR_KEY: &str = "form";

/// Field-keyed validation messages, in schema order.
///
/// Holds at most one message per path; the first violation recorded wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, String)>,
}

impl FieldErrors {
    /// Create an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// An error map holding a single message.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(path, message);
        errors
    }

    /// Record `message` for `path` unless the path already has one.
    ///
    /// Returns `true` if the message was recorded.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.entries.push((path, message.into()));
        true
    }

    /// Message recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == path)
            .map(|(_, message)| message.as_str())
    }

    /// Whether `path` has a message.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Paths with errors, in schema order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    /// `(path, message)` pairs, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(path, message)| (path.as_str(), message.as_str()))
    }

    /// First error, typically the field to focus.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.iter().next()
    }

    /// Number of fields with errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{path}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, message) in &self.entries {
            map.serialize_entry(path, message)?;
        }
        map.end()
    }
}

/// How a raw field value is normalized before its rules run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Trimmed string
    #[default]
    Text,
    /// Digits only (masks removed)
    Digits,
    /// Trimmed, upper-cased string
    Uppercase,
    /// Whole number from a number or numeric string
    Integer,
    /// Finite number from a number or numeric string
    Number,
    /// Boolean from a bool or `true`/`false`/`on`/`off`/`1`/`0`
    Boolean,
}

enum Coerced {
    Missing,
    Invalid,
    Value(Value),
}

impl Coercion {
    #[allow(clippy::cast_possible_truncation)]
    fn apply(self, raw: Option<&Value>) -> Coerced {
        let raw = match raw {
            None | Some(Value::Null) => return Coerced::Missing,
            Some(raw) => raw,
        };
        // blank strings count as "not filled in" for every coercion
        if raw.as_str().is_some_and(|s| s.trim().is_empty()) {
            return Coerced::Missing;
        }

        match self {
            Coercion::Text => text_value(raw, |s| s.to_string()),
            Coercion::Uppercase => text_value(raw, str::to_uppercase),
            Coercion::Digits => text_value(raw, |s| digits_only(s)),
            Coercion::Integer => match raw {
                Value::Number(n) if n.is_i64() || n.is_u64() => Coerced::Value(raw.clone()),
                Value::Number(_) | Value::String(_) => FieldInput::as_number(raw)
                    .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
                    .map_or(Coerced::Invalid, |n| Coerced::Value(Value::from(n as i64))),
                _ => Coerced::Invalid,
            },
            Coercion::Number => match raw {
                Value::Number(_) | Value::String(_) => FieldInput::as_number(raw)
                    .and_then(Number::from_f64)
                    .map_or(Coerced::Invalid, |n| Coerced::Value(Value::Number(n))),
                _ => Coerced::Invalid,
            },
            Coercion::Boolean => match raw {
                Value::Bool(b) => Coerced::Value(Value::Bool(*b)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" | "1" | "yes" => Coerced::Value(Value::Bool(true)),
                    "false" | "off" | "0" | "no" => Coerced::Value(Value::Bool(false)),
                    _ => Coerced::Invalid,
                },
                _ => Coerced::Invalid,
            },
        }
    }
}

fn text_value(raw: &Value, normalize: impl Fn(&str) -> String) -> Coerced {
    match raw {
        Value::String(s) => Coerced::Value(Value::String(normalize(s.trim()))),
        _ => Coerced::Invalid,
    }
}

/// Predicate over a field's normalized text.
pub type TextCheck = fn(&str) -> bool;

/// Predicate over a field's normalized text that also needs today's date.
pub type DatedCheck = fn(&str, NaiveDate) -> bool;

/// The condition a [`Rule`] enforces.
#[derive(Clone)]
pub enum RuleKind {
    /// At least this many characters
    MinLength(usize),
    /// At most this many characters
    MaxLength(usize),
    /// Regular expression match
    Pattern(Regex),
    /// Arbitrary predicate
    Check(TextCheck),
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    /// One of a fixed set of values
    OneOf(&'static [&'static str]),
    /// Predicate evaluated against the validation date
    Dated(DatedCheck),
    /// Boolean that must be `true` (terms checkboxes)
    Accepted,
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::MinLength(min) => f.debug_tuple("MinLength").field(min).finish(),
            RuleKind::MaxLength(max) => f.debug_tuple("MaxLength").field(max).finish(),
            RuleKind::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            RuleKind::Check(_) => f.write_str("Check(..)"),
            RuleKind::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            RuleKind::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            RuleKind::Dated(_) => f.write_str("Dated(..)"),
            RuleKind::Accepted => f.write_str("Accepted"),
        }
    }
}

/// A single check with the message shown when it fails.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    message: Cow<'static, str>,
}

impl Rule {
    /// Create a rule from its kind and failure message.
    pub fn new(kind: RuleKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// At least `min` characters (Unicode scalar values).
    pub fn min_length(min: usize, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::MinLength(min), message)
    }

    /// At most `max` characters.
    pub fn max_length(max: usize, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::MaxLength(max), message)
    }

    /// Normalized text must match `regex`.
    pub fn pattern(regex: Regex, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::Pattern(regex), message)
    }

    /// Normalized text must satisfy `predicate`.
    pub fn check(predicate: TextCheck, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::Check(predicate), message)
    }

    /// Numeric value within `min..=max`, inclusive on both ends.
    pub fn range(min: f64, max: f64, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::Range { min, max }, message)
    }

    /// Normalized text must equal one of `allowed` exactly.
    pub fn one_of(
        allowed: &'static [&'static str],
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(RuleKind::OneOf(allowed), message)
    }

    /// Like [`Rule::check`], with the validation date passed through.
    ///
    /// Used for rules that depend on "today", such as card expiry.
    pub fn dated(predicate: DatedCheck, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::Dated(predicate), message)
    }

    /// Value must be boolean `true`, as for a terms checkbox.
    pub fn accepted(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(RuleKind::Accepted, message)
    }

    /// The enforced condition.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Message reported when the rule fails.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn accepts(&self, value: &Value, today: NaiveDate) -> bool {
        let text: Cow<'_, str> = match value {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        };

        match &self.kind {
            RuleKind::MinLength(min) => text.chars().count() >= *min,
            RuleKind::MaxLength(max) => text.chars().count() <= *max,
            RuleKind::Pattern(regex) => regex.is_match(&text),
            RuleKind::Check(predicate) => predicate(&text),
            RuleKind::Range { min, max } => FieldInput::as_number(value)
                .is_some_and(|n| (*min..=*max).contains(&n)),
            RuleKind::OneOf(allowed) => allowed.iter().any(|a| *a == &*text),
            RuleKind::Dated(predicate) => predicate(&text, today),
            RuleKind::Accepted => value == &Value::Bool(true),
        }
    }
}

/// One form field: where it lives, how it is normalized, what it must satisfy.
#[derive(Debug, Clone)]
pub struct Field {
    path: String,
    required: bool,
    coercion: Coercion,
    rules: Vec<Rule>,
    required_message: Cow<'static, str>,
    invalid_message: Cow<'static, str>,
}

impl Field {
    /// A required field at `path` with the given coercion.
    pub fn new(path: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            path: path.into(),
            required: true,
            coercion,
            rules: Vec::new(),
            required_message: Cow::Borrowed("This field is required"),
            invalid_message: Cow::Borrowed("Invalid value"),
        }
    }

    /// A required trimmed-text field.
    pub fn text(path: impl Into<String>) -> Self {
        Self::new(path, Coercion::Text)
    }

    /// Allow the field to be absent or blank; it is then left out of the
    /// output and its rules are skipped.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Message shown when a required field is missing or blank.
    pub fn required_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.required_message = message.into();
        self
    }

    /// Message shown when the value cannot be coerced (wrong JSON type).
    pub fn invalid_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.invalid_message = message.into();
        self
    }

    /// Append a rule. Rules run in declaration order.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Dot-separated location of the field in the form data.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the field must be filled in.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Declared rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn evaluate(&self, raw: Option<&Value>, today: NaiveDate) -> Result<Option<Value>, &str> {
        let value = match self.coercion.apply(raw) {
            Coerced::Missing if self.required => return Err(&*self.required_message),
            Coerced::Missing => return Ok(None),
            Coerced::Invalid => return Err(&*self.invalid_message),
            Coerced::Value(value) => value,
        };

        match self.rules.iter().find(|rule| !rule.accepts(&value, today)) {
            Some(rule) => Err(rule.message()),
            None => Ok(Some(value)),
        }
    }

    fn within(&self, paths: &[&str]) -> bool {
        paths.iter().any(|p| covers(p, &self.path))
    }
}

/// `prefix` names `path` itself or one of its parent objects.
fn covers(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

type FormPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A cross-field condition whose error is attached to one dependent field.
///
/// The predicate sees the whole form with validated fields already
/// normalized. It only runs when its target field passed its own rules.
#[derive(Clone)]
pub struct Refinement {
    target: String,
    message: Cow<'static, str>,
    predicate: FormPredicate,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("target", &self.target)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Refinement {
    /// Attach `message` to `target` when `predicate` returns `false`.
    pub fn new<F>(
        target: impl Into<String>,
        message: impl Into<Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// `target` must equal the sibling field `other` (password confirmation).
    pub fn matches(
        target: impl Into<String>,
        other: impl Into<String>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let target = target.into();
        let other = other.into();
        let lhs = target.clone();
        Self::new(target, message, move |form| {
            lookup(form, &lhs) == lookup(form, &other)
        })
    }

    /// Field that receives the error.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// A named, immutable description of a form.
///
/// ```
/// use storefront_forms::application::schema::{Field, Rule, Schema};
/// use serde_json::json;
///
/// let schema = Schema::new("greeting")
///     .field(Field::text("name").rule(Rule::min_length(2, "Too short")));
///
/// assert_eq!(schema.validate(&json!({"name": "  Ana "})).unwrap(), json!({"name": "Ana"}));
/// let errors = schema.validate(&json!({"name": "A"})).unwrap_err();
/// assert_eq!(errors.get("name"), Some("Too short"));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    name: Cow<'static, str>,
    fields: Vec<Field>,
    refinements: Vec<Refinement>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            refinements: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a cross-field refinement.
    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// Schema name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Sub-schema with the fields under `paths` and the refinements that
    /// target them. A path also selects every field nested below it.
    pub fn pick(&self, paths: &[&str]) -> Schema {
        Schema {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .filter(|field| field.within(paths))
                .cloned()
                .collect(),
            refinements: self
                .refinements
                .iter()
                .filter(|r| paths.iter().any(|p| covers(p, &r.target)))
                .cloned()
                .collect(),
        }
    }

    /// Validate against today's local date.
    ///
    /// # Errors
    /// Returns every field-level failure.
    pub fn validate(&self, data: &Value) -> Result<Value, FieldErrors> {
        self.validate_at(data, local_today())
    }

    /// Validate with an explicit date for date-relative rules (card expiry).
    ///
    /// On success returns a new object holding only the declared fields,
    /// normalized; optional fields left blank are omitted.
    ///
    /// # Errors
    /// Returns every field-level failure.
    pub fn validate_at(&self, data: &Value, today: NaiveDate) -> Result<Value, FieldErrors> {
        let mut output = Value::Object(Map::new());
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field.evaluate(lookup(data, &field.path), today) {
                Ok(Some(value)) => insert_path(&mut output, &field.path, value),
                Ok(None) => {}
                Err(message) => {
                    errors.insert(field.path.as_str(), message);
                }
            }
        }

        if !self.refinements.is_empty() {
            let view = overlay(data, &output);
            for refinement in &self.refinements {
                if errors.contains(&refinement.target) {
                    continue;
                }
                if !(refinement.predicate)(&view) {
                    errors.insert(refinement.target.as_str(), &*refinement.message);
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }

    /// Validate only the fields under `paths` (live validation while typing).
    ///
    /// # Errors
    /// Returns failures among the selected fields.
    pub fn validate_fields(&self, data: &Value, paths: &[&str]) -> Result<Value, FieldErrors> {
        self.pick(paths).validate(data)
    }

    /// Message for a single field, or `None` when it is valid.
    pub fn validate_field(&self, data: &Value, path: &str) -> Option<String> {
        self.validate_fields(data, &[path])
            .err()
            .and_then(|errors| errors.get(path).map(str::to_string))
    }
}

/// Run `schema` and deserialize the normalized payload into `T`.
///
/// Use `serde_json::Value` as `T` for an untyped payload.
///
/// # Errors
/// Field failures, or a single [`FORM_ERROR_KEY`] entry when the payload
/// does not fit `T`.
pub fn validate_form<T: DeserializeOwned>(schema: &Schema, data: &Value) -> Result<T, FieldErrors> {
    validate_form_at(schema, data, local_today())
}

/// [`validate_form`] with an explicit validation date.
///
/// # Errors
/// See [`validate_form`].
pub fn validate_form_at<T: DeserializeOwned>(
    schema: &Schema,
    data: &Value,
    today: NaiveDate,
) -> Result<T, FieldErrors> {
    let payload = schema.validate_at(data, today)?;
    serde_json::from_value(payload)
        .map_err(|e| FieldErrors::single(FORM_ERROR_KEY, e.to_string()))
}

/// Look up a dot path in a JSON value.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |current, segment| current.as_object()?.get(segment))
}

/// Write `value` at a dot path, creating (or replacing non-object)
/// intermediate values.
pub fn insert_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn overlay(data: &Value, normalized: &Value) -> Value {
    let mut view = if data.is_object() {
        data.clone()
    } else {
        Value::Object(Map::new())
    };
    merge(&mut view, normalized);
    view
}

fn merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                match target.get_mut(key) {
                    Some(existing) if nested => merge(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn signup() -> Schema {
        Schema::new("signup")
            .field(
                Field::text("email")
                    .required_message("Email is required")
                    .rule(Rule::check(|s| crate::is_valid_email(s), "Invalid email")),
            )
            .field(Field::text("password").rule(Rule::min_length(8, "Too short")))
            .field(Field::text("confirm"))
            .field(Field::new("age", Coercion::Integer).optional().rule(Rule::range(
                18.0,
                130.0,
                "Must be an adult",
            )))
            .refine(Refinement::matches("confirm", "password", "Passwords do not match"))
    }

    #[test]
    fn test_success_payload_is_trimmed_and_stripped() {
        let payload = signup()
            .validate_at(
                &json!({
                    "email": " ana@example.com ",
                    "password": "hunter2hunter2",
                    "confirm": "hunter2hunter2",
                    "age": "30",
                    "extra": "dropped"
                }),
                today(),
            )
            .unwrap();

        assert_eq!(
            payload,
            json!({
                "email": "ana@example.com",
                "password": "hunter2hunter2",
                "confirm": "hunter2hunter2",
                "age": 30
            })
        );
    }

    #[test]
    fn test_collects_one_message_per_field() {
        let errors = signup()
            .validate_at(&json!({"email": "nope", "password": "x", "age": 12}), today())
            .unwrap_err();

        assert_eq!(errors.get("email"), Some("Invalid email"));
        assert_eq!(errors.get("password"), Some("Too short"));
        assert_eq!(errors.get("confirm"), Some("This field is required"));
        assert_eq!(errors.get("age"), Some("Must be an adult"));
        assert_eq!(
            errors.paths().collect::<Vec<_>>(),
            vec!["email", "password", "confirm", "age"]
        );
    }

    #[test]
    fn test_refinement_attaches_to_target_only() {
        let errors = signup()
            .validate_at(
                &json!({"email": "a@b.co", "password": "longenough", "confirm": "different"}),
                today(),
            )
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("confirm"), Some("Passwords do not match"));
    }

    #[test]
    fn test_refinement_skipped_when_target_already_failed() {
        let errors = signup()
            .validate_at(&json!({"email": "a@b.co", "password": "longenough"}), today())
            .unwrap_err();
        assert_eq!(errors.get("confirm"), Some("This field is required"));
    }

    #[test]
    fn test_null_and_non_object_input() {
        let errors = signup().validate_at(&Value::Null, today()).unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));

        let errors = signup()
            .validate_at(&json!({"email": 42}), today())
            .unwrap_err();
        assert_eq!(errors.get("email"), Some("Invalid value"));
    }

    #[test]
    fn test_nested_paths() {
        let schema = Schema::new("shipping")
            .field(
                Field::new("address.cep", Coercion::Digits)
                    .rule(Rule::check(|s| crate::is_valid_cep(s), "Invalid CEP")),
            )
            .field(Field::new("address.state", Coercion::Uppercase));

        let payload = schema
            .validate_at(
                &json!({"address": {"cep": "01310-100", "state": "sp"}}),
                today(),
            )
            .unwrap();
        assert_eq!(payload, json!({"address": {"cep": "01310100", "state": "SP"}}));

        let errors = schema
            .validate_at(&json!({"address": {"cep": "123"}}), today())
            .unwrap_err();
        assert_eq!(errors.get("address.cep"), Some("Invalid CEP"));
        assert_eq!(errors.get("address.state"), Some("This field is required"));
    }

    #[test]
    fn test_partial_validation() {
        let schema = signup();
        let data = json!({"email": "bad"});

        assert_eq!(
            schema.validate_field(&data, "email").as_deref(),
            Some("Invalid email")
        );
        assert_eq!(schema.validate_field(&json!({"email": "a@b.co"}), "email"), None);

        let errors = schema.validate_fields(&data, &["email", "age"]).unwrap_err();
        assert_eq!(errors.len(), 1);

        // refinement comes along with its target and reads the sibling from raw data
        let errors = schema
            .validate_fields(&json!({"password": "abc", "confirm": "abd"}), &["confirm"])
            .unwrap_err();
        assert_eq!(errors.get("confirm"), Some("Passwords do not match"));
    }

    #[test]
    fn test_pick_selects_nested_fields_by_parent() {
        let schema = Schema::new("s")
            .field(Field::text("address.street"))
            .field(Field::text("address.city"))
            .field(Field::text("addressee"));
        let picked = schema.pick(&["address"]);
        let paths: Vec<_> = picked.fields().iter().map(Field::path).collect();
        assert_eq!(paths, vec!["address.street", "address.city"]);
    }

    #[test]
    fn test_coercions() {
        let schema = Schema::new("c")
            .field(Field::new("n", Coercion::Number))
            .field(Field::new("b", Coercion::Boolean))
            .field(Field::new("i", Coercion::Integer))
            .field(Field::text("note").optional());

        let payload = schema
            .validate_at(&json!({"n": "2.5", "b": "on", "i": 7.0, "note": "   "}), today())
            .unwrap();
        assert_eq!(payload, json!({"n": 2.5, "b": true, "i": 7}));

        let errors = schema
            .validate_at(&json!({"n": "abc", "b": "maybe", "i": 1.5}), today())
            .unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_accepted_and_one_of() {
        static PLANS: &[&str] = &["basic", "pro"];
        let schema = Schema::new("terms")
            .field(
                Field::new("terms", Coercion::Boolean)
                    .required_message("You must accept the terms")
                    .rule(Rule::accepted("You must accept the terms")),
            )
            .field(Field::text("plan").rule(Rule::one_of(PLANS, "Unknown plan")));

        let errors = schema
            .validate_at(&json!({"terms": false, "plan": "gold"}), today())
            .unwrap_err();
        assert_eq!(errors.get("terms"), Some("You must accept the terms"));
        assert_eq!(errors.get("plan"), Some("Unknown plan"));
        assert!(schema
            .validate_at(&json!({"terms": true, "plan": "pro"}), today())
            .is_ok());
    }

    #[test]
    fn test_validate_form_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Login {
            email: String,
            password: String,
        }

        let schema = Schema::new("login")
            .field(Field::text("email"))
            .field(Field::text("password"));
        let login: Login = validate_form_at(
            &schema,
            &json!({"email": "a@b.co", "password": "pw"}),
            today(),
        )
        .unwrap();
        assert_eq!(login.email, "a@b.co");

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct NeedsMore {
            email: String,
            missing: String,
        }
        let errors = validate_form_at::<NeedsMore>(
            &schema,
            &json!({"email": "a@b.co", "password": "pw"}),
            today(),
        )
        .unwrap_err();
        assert!(errors.contains(FORM_ERROR_KEY));
    }

    #[test]
    fn test_field_errors_first_wins_and_formats() {
        let mut errors = FieldErrors::new();
        assert!(errors.insert("a", "first"));
        assert!(!errors.insert("a", "second"));
        errors.insert("b", "other");

        assert_eq!(errors.get("a"), Some("first"));
        assert_eq!(errors.first(), Some(("a", "first")));
        assert_eq!(errors.to_string(), "a: first; b: other");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"a": "first", "b": "other"})
        );
    }

    #[test]
    fn test_insert_path_replaces_scalars() {
        let mut value = json!({"a": 1});
        insert_path(&mut value, "a.b", json!(2));
        assert_eq!(value, json!({"a": {"b": 2}}));
        assert_eq!(lookup(&value, "a.b"), Some(&json!(2)));
        assert_eq!(lookup(&value, "a.c"), None);
    }
}
