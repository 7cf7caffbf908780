//! Scalar property descriptors: strings (plain, regex-validated, email),
//! integers, floats, booleans, and generated unique ids.

use std::sync::Arc;

use regex::Regex;
use uuid::Uuid;

use crate::model::Value;
use crate::properties::{
    DefaultValue, PropertyOptions, PropertyType, property_builder_methods,
};
use crate::{Error, Result};

/// Coerce a value into its string form. Mirrors stringification of
/// scalars; containers and graph entities are rejected.
fn coerce_string(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("Expected a string, got {}", other.type_name())),
    }
}

/// Match anchored at the start of the haystack.
fn matches_expression(expression: &Regex, normal: &str) -> bool {
    expression.find(normal).is_some_and(|m| m.start() == 0)
}

// ============================================================================
// StringProperty
// ============================================================================

/// Stores a unicode string.
///
/// `choices` restricts values to a fixed set of (value, display label)
/// pairs; `max_length` bounds the string length. The two are mutually
/// exclusive. Both directions of marshalling run the same checks.
#[derive(Debug, Clone)]
pub struct StringProperty {
    options: PropertyOptions,
    choices: Option<Vec<(String, String)>>,
    max_length: Option<usize>,
}

impl StringProperty {
    pub fn new() -> Self {
        StringProperty { options: PropertyOptions::default(), choices: None, max_length: None }
    }

    pub fn choices<K, V>(mut self, choices: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        );
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    property_builder_methods!();

    fn normalize(&self, value: &Value) -> std::result::Result<Value, String> {
        let normal = coerce_string(value)?;
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|(choice, _)| choice == &normal) {
                return Err(format!("Invalid choice: {normal}"));
            }
        }
        if let Some(max_length) = self.max_length {
            if normal.chars().count() > max_length {
                return Err(format!(
                    "Property max length exceeded. Expected {max_length}, got {} == len('{normal}')",
                    normal.chars().count()
                ));
            }
        }
        Ok(Value::String(normal))
    }
}

impl PropertyType for StringProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "string"
    }

    fn setup(&self) -> std::result::Result<(), String> {
        if self.max_length.is_some() && self.choices.is_some() {
            return Err("The arguments `choices` and `max_length` are mutually exclusive.".to_string());
        }
        if self.max_length == Some(0) {
            return Err("`max_length` cannot be zero.".to_string());
        }
        Ok(())
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }

    fn choices(&self) -> Option<&[(String, String)]> {
        self.choices.as_deref()
    }
}

// ============================================================================
// RegexProperty / EmailProperty
// ============================================================================

/// Validates string values against a regular expression, anchored at the
/// start of the value.
#[derive(Debug, Clone)]
pub struct RegexProperty {
    options: PropertyOptions,
    expression: Regex,
}

impl RegexProperty {
    /// The expression is compiled here, so an invalid pattern fails at
    /// definition time.
    pub fn new(expression: &str) -> Result<Self> {
        let expression = Regex::new(expression).map_err(|e| Error::Definition {
            class: "RegexProperty".to_string(),
            message: format!("invalid expression: {e}"),
        })?;
        Ok(RegexProperty { options: PropertyOptions::default(), expression })
    }

    pub fn expression(&self) -> &str {
        self.expression.as_str()
    }

    property_builder_methods!();

    fn normalize(&self, value: &Value) -> std::result::Result<Value, String> {
        let normal = coerce_string(value)?;
        if !matches_expression(&self.expression, &normal) {
            return Err(format!(
                "{normal:?} does not match {:?}",
                self.expression.as_str()
            ));
        }
        Ok(Value::String(normal))
    }
}

impl PropertyType for RegexProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "regex"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }
}

const EMAIL_EXPRESSION: &str = r"[^@]+@[^@]+\.[^@]+";

/// Stores email addresses.
#[derive(Debug, Clone)]
pub struct EmailProperty {
    options: PropertyOptions,
    expression: Regex,
}

impl EmailProperty {
    pub fn new() -> Self {
        // The expression is a known-good constant.
        let expression = Regex::new(EMAIL_EXPRESSION).expect("email expression compiles");
        EmailProperty { options: PropertyOptions::default(), expression }
    }

    property_builder_methods!();
}

impl PropertyType for EmailProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "email"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.deflate(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let normal = coerce_string(value)?;
        if !matches_expression(&self.expression, &normal) {
            return Err(format!("{normal:?} does not match {EMAIL_EXPRESSION:?}"));
        }
        Ok(Value::String(normal))
    }
}

// ============================================================================
// IntegerProperty
// ============================================================================

/// Stores an integer value. Integral floats and numeric strings are
/// accepted; anything lossy is rejected.
#[derive(Debug, Clone)]
pub struct IntegerProperty {
    options: PropertyOptions,
}

impl IntegerProperty {
    pub fn new() -> Self {
        IntegerProperty { options: PropertyOptions::default() }
    }

    property_builder_methods!();

    fn normalize(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::Int(_) => Ok(value.clone()),
            // i64::MAX as f64 rounds up to 2^63, hence the strict bound.
            Value::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Ok(Value::Int(*f as i64))
            }
            Value::Float(f) => Err(format!("Expected an integer, got {f}")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("Expected an integer, got {s:?}")),
            other => Err(format!("Expected an integer, got {}", other.type_name())),
        }
    }
}

impl PropertyType for IntegerProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }
}

// ============================================================================
// FloatProperty
// ============================================================================

/// Stores a floating point value.
#[derive(Debug, Clone)]
pub struct FloatProperty {
    options: PropertyOptions,
}

impl FloatProperty {
    pub fn new() -> Self {
        FloatProperty { options: PropertyOptions::default() }
    }

    property_builder_methods!();

    fn normalize(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("Expected a float, got {s:?}")),
            other => Err(format!("Expected a float, got {}", other.type_name())),
        }
    }
}

impl PropertyType for FloatProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "float"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.normalize(value)
    }
}

// ============================================================================
// BooleanProperty
// ============================================================================

/// Stores a boolean value. No truthiness coercion.
#[derive(Debug, Clone)]
pub struct BooleanProperty {
    options: PropertyOptions,
}

impl BooleanProperty {
    pub fn new() -> Self {
        BooleanProperty { options: PropertyOptions::default() }
    }

    property_builder_methods!();
}

impl PropertyType for BooleanProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "boolean"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.deflate(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            other => Err(format!("Expected a boolean, got {}", other.type_name())),
        }
    }
}

// ============================================================================
// UniqueIdProperty
// ============================================================================

/// A unique identifier: a randomly generated uuid4 hex string with a
/// unique index.
///
/// The uid generation and the unique index are fixed; only the wire name
/// is configurable. The `required` / `index` / `default` knobs of other
/// descriptors are deliberately absent here.
#[derive(Debug, Clone)]
pub struct UniqueIdProperty {
    options: PropertyOptions,
}

impl UniqueIdProperty {
    pub fn new() -> Self {
        let options = PropertyOptions {
            unique_index: true,
            default: Some(DefaultValue::Producer(Arc::new(|| {
                Value::String(Uuid::new_v4().simple().to_string())
            }))),
            ..PropertyOptions::default()
        };
        UniqueIdProperty { options }
    }

    pub fn db_property(mut self, db_property: impl Into<String>) -> Self {
        self.options.db_property = Some(db_property.into());
        self
    }
}

impl PropertyType for UniqueIdProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "unique_id"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.deflate(value)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(format!("Expected a string uid, got {}", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_choices() {
        let prop = StringProperty::new().choices([("S", "Small"), ("L", "Large")]);
        assert_eq!(prop.deflate(&Value::from("S")).unwrap(), Value::from("S"));
        let err = prop.deflate(&Value::from("XL")).unwrap_err();
        assert_eq!(err, "Invalid choice: XL");
    }

    #[test]
    fn test_string_max_length() {
        let prop = StringProperty::new().max_length(3);
        assert!(prop.deflate(&Value::from("abc")).is_ok());
        let err = prop.deflate(&Value::from("abcd")).unwrap_err();
        assert!(err.contains("max length exceeded"));
    }

    #[test]
    fn test_string_coerces_scalars() {
        let prop = StringProperty::new();
        assert_eq!(prop.inflate(&Value::Int(5)).unwrap(), Value::from("5"));
        assert!(prop.inflate(&Value::List(vec![])).is_err());
    }

    #[test]
    fn test_string_choices_and_max_length_conflict() {
        let prop = StringProperty::new().choices([("a", "A")]).max_length(2);
        assert!(prop.setup().unwrap_err().contains("mutually exclusive"));
    }

    #[test]
    fn test_regex_is_anchored_at_start() {
        let prop = RegexProperty::new(r"\d+").unwrap();
        assert!(prop.deflate(&Value::from("123abc")).is_ok());
        assert!(prop.deflate(&Value::from("abc123")).is_err());
    }

    #[test]
    fn test_regex_invalid_expression_fails_early() {
        assert!(RegexProperty::new(r"(").is_err());
    }

    #[test]
    fn test_email() {
        let prop = EmailProperty::new();
        assert!(prop.deflate(&Value::from("ada@lovelace.org")).is_ok());
        let err = prop.deflate(&Value::from("not-an-email")).unwrap_err();
        assert!(err.contains("does not match"));
    }

    #[test]
    fn test_integer_accepts_integral_float_only() {
        let prop = IntegerProperty::new();
        assert_eq!(prop.inflate(&Value::Float(4.0)).unwrap(), Value::Int(4));
        assert!(prop.inflate(&Value::Float(4.5)).is_err());
        assert_eq!(prop.inflate(&Value::from("7")).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_integer_rejects_floats_outside_i64_range() {
        let prop = IntegerProperty::new();
        assert!(prop.deflate(&Value::Float(1e19)).is_err());
        assert!(prop.deflate(&Value::Float(-1e19)).is_err());
        // Near the boundary but still representable.
        assert_eq!(
            prop.deflate(&Value::Float(-9.0e18)).unwrap(),
            Value::Int(-9_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_boolean_has_no_truthiness() {
        let prop = BooleanProperty::new();
        assert_eq!(prop.deflate(&Value::Bool(false)).unwrap(), Value::Bool(false));
        assert!(prop.deflate(&Value::Int(1)).is_err());
        assert!(prop.deflate(&Value::from("true")).is_err());
    }

    #[test]
    fn test_unique_id_generates_fresh_hex() {
        let prop = UniqueIdProperty::new();
        let a = prop.options().default_value().unwrap();
        let b = prop.options().default_value().unwrap();
        assert_ne!(a, b);
        let Value::String(hex) = a else { panic!("uid default should be a string") };
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(prop.options().unique_index);
    }
}
