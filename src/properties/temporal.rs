//! Temporal property descriptors.
//!
//! Three datetime representations coexist on the wire, matching what
//! graph databases historically accepted:
//! - [`DateTimeProperty`] — UTC unix epoch as a float,
//! - [`DateTimeFormatProperty`] — a custom-formatted string,
//! - [`DateTimeNeo4jFormatProperty`] — the native temporal wire type.
//!
//! [`DateProperty`] stores calendar dates as ISO-8601 strings.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

use crate::model::Value;
use crate::properties::{DefaultValue, PropertyOptions, PropertyType, property_builder_methods};

// ============================================================================
// DateProperty
// ============================================================================

/// Stores a calendar date as an ISO-8601 string (`YYYY-MM-DD`).
#[derive(Debug, Clone)]
pub struct DateProperty {
    options: PropertyOptions,
}

impl DateProperty {
    pub fn new() -> Self {
        DateProperty { options: PropertyOptions::default() }
    }

    property_builder_methods!();
}

impl PropertyType for DateProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "date"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::Date(_) => Ok(value.clone()),
            // Datetimes truncate to their date component.
            Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
            Value::LocalDateTime(dt) => Ok(Value::Date(dt.date())),
            Value::String(s) => {
                // An ISO datetime string truncates at the time marker.
                let date_part = s.split('T').next().unwrap_or(s);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|_| format!("date object expected, got {s:?}"))
            }
            other => Err(format!("date object expected, got {}", other.type_name())),
        }
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
            other => Err(format!("date object expected, got {}", other.type_name())),
        }
    }
}

// ============================================================================
// DateTimeProperty
// ============================================================================

/// Stores a timezone-aware datetime as a UTC unix epoch float.
#[derive(Debug, Clone)]
pub struct DateTimeProperty {
    options: PropertyOptions,
}

impl DateTimeProperty {
    pub fn new() -> Self {
        DateTimeProperty { options: PropertyOptions::default() }
    }

    /// Default to the creation time (UTC), materialized fresh per instance.
    pub fn default_now(mut self) -> Self {
        self.options.default = Some(DefaultValue::Producer(std::sync::Arc::new(|| {
            Value::DateTime(Utc::now())
        })));
        self
    }

    property_builder_methods!();
}

fn epoch_to_datetime(epoch: f64) -> std::result::Result<DateTime<Utc>, String> {
    // Floor-based decomposition keeps the subsecond part non-negative,
    // so pre-1970 epochs land on the correct side of the second.
    let seconds = epoch.div_euclid(1.0) as i64;
    let nanos = (epoch.rem_euclid(1.0) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(seconds, nanos)
        .ok_or_else(|| format!("epoch {epoch} is out of datetime range"))
}

fn datetime_to_epoch(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1_000_000_000.0
}

impl PropertyType for DateTimeProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "datetime"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let epoch = value.as_float().ok_or_else(|| {
            format!(
                "Float or integer expected, got {} cannot inflate to datetime.",
                value.type_name()
            )
        })?;
        epoch_to_datetime(epoch).map(Value::DateTime)
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::DateTime(dt) => Ok(Value::Float(datetime_to_epoch(dt))),
            // No timezone on the value: assume UTC.
            Value::LocalDateTime(dt) => Ok(Value::Float(datetime_to_epoch(&dt.and_utc()))),
            other => Err(format!("datetime object expected, got {}", other.type_name())),
        }
    }
}

// ============================================================================
// DateTimeFormatProperty
// ============================================================================

/// Stores a naive datetime as a string in a caller-chosen format.
#[derive(Debug, Clone)]
pub struct DateTimeFormatProperty {
    options: PropertyOptions,
    format: String,
}

impl DateTimeFormatProperty {
    /// `format` is a strftime-style pattern, `"%Y-%m-%d"` by default.
    pub fn new() -> Self {
        DateTimeFormatProperty {
            options: PropertyOptions::default(),
            format: "%Y-%m-%d".to_string(),
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Default to the creation time (local), materialized fresh per instance.
    pub fn default_now(mut self) -> Self {
        self.options.default = Some(DefaultValue::Producer(std::sync::Arc::new(|| {
            Value::LocalDateTime(Local::now().naive_local())
        })));
        self
    }

    property_builder_methods!();
}

impl PropertyType for DateTimeFormatProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "datetime_format"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let text = match value {
            Value::String(s) => s.as_str(),
            other => {
                return Err(format!(
                    "formatted datetime string expected, got {}",
                    other.type_name()
                ));
            }
        };
        // A date-only format parses to midnight.
        NaiveDateTime::parse_from_str(text, &self.format)
            .or_else(|_| {
                NaiveDate::parse_from_str(text, &self.format)
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
            })
            .map(Value::LocalDateTime)
            .map_err(|_| format!("{text:?} does not match format {:?}", self.format))
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::LocalDateTime(dt) => Ok(Value::String(dt.format(&self.format).to_string())),
            Value::DateTime(dt) => {
                Ok(Value::String(dt.naive_utc().format(&self.format).to_string()))
            }
            other => Err(format!("datetime object expected, got {}", other.type_name())),
        }
    }
}

// ============================================================================
// DateTimeNeo4jFormatProperty
// ============================================================================

/// Stores a naive datetime through the database's native temporal type.
#[derive(Debug, Clone)]
pub struct DateTimeNeo4jFormatProperty {
    options: PropertyOptions,
}

impl DateTimeNeo4jFormatProperty {
    pub fn new() -> Self {
        DateTimeNeo4jFormatProperty { options: PropertyOptions::default() }
    }

    /// Default to the creation time (local), materialized fresh per instance.
    pub fn default_now(mut self) -> Self {
        self.options.default = Some(DefaultValue::Producer(std::sync::Arc::new(|| {
            Value::LocalDateTime(Local::now().naive_local())
        })));
        self
    }

    property_builder_methods!();
}

impl PropertyType for DateTimeNeo4jFormatProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "datetime_neo4j"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::DateTime(dt) => Ok(Value::LocalDateTime(dt.naive_utc())),
            Value::LocalDateTime(_) => Ok(value.clone()),
            other => Err(format!(
                "native datetime expected, got {}",
                other.type_name()
            )),
        }
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        match value {
            Value::LocalDateTime(dt) => Ok(Value::DateTime(dt.and_utc())),
            Value::DateTime(_) => Ok(value.clone()),
            other => Err(format!("datetime object expected, got {}", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_round_trip() {
        let prop = DateProperty::new();
        let wire = prop.deflate(&Value::Date(date(2024, 2, 29))).unwrap();
        assert_eq!(wire, Value::from("2024-02-29"));
        assert_eq!(prop.inflate(&wire).unwrap(), Value::Date(date(2024, 2, 29)));
    }

    #[test]
    fn test_date_truncates_datetime_strings() {
        let prop = DateProperty::new();
        let value = prop.inflate(&Value::from("2024-02-29T13:37:00")).unwrap();
        assert_eq!(value, Value::Date(date(2024, 2, 29)));
    }

    #[test]
    fn test_date_rejects_non_dates_on_deflate() {
        let prop = DateProperty::new();
        let err = prop.deflate(&Value::from("2024-02-29")).unwrap_err();
        assert!(err.contains("date object expected"));
    }

    #[test]
    fn test_datetime_epoch_round_trip() {
        let prop = DateTimeProperty::new();
        let dt = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let wire = prop.deflate(&Value::DateTime(dt)).unwrap();
        assert_eq!(wire, Value::Float(1_700_000_000.0));
        assert_eq!(prop.inflate(&wire).unwrap(), Value::DateTime(dt));
    }

    #[test]
    fn test_datetime_pre_epoch_subsecond_round_trip() {
        let prop = DateTimeProperty::new();
        // 1969-12-31T23:59:59.500Z sits half a second before the epoch.
        let dt = DateTime::<Utc>::from_timestamp(-1, 500_000_000).unwrap();
        let wire = prop.deflate(&Value::DateTime(dt)).unwrap();
        assert_eq!(wire, Value::Float(-0.5));
        assert_eq!(prop.inflate(&wire).unwrap(), Value::DateTime(dt));
    }

    #[test]
    fn test_datetime_inflates_integer_epochs() {
        let prop = DateTimeProperty::new();
        let value = prop.inflate(&Value::Int(0)).unwrap();
        assert_eq!(
            value,
            Value::DateTime(DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        );
        assert!(prop.inflate(&Value::from("soon")).is_err());
    }

    #[test]
    fn test_datetime_naive_assumes_utc() {
        let prop = DateTimeProperty::new();
        let naive = date(1970, 1, 1).and_hms_opt(0, 1, 0).unwrap();
        let wire = prop.deflate(&Value::LocalDateTime(naive)).unwrap();
        assert_eq!(wire, Value::Float(60.0));
    }

    #[test]
    fn test_datetime_default_now_is_fresh() {
        let prop = DateTimeProperty::new().default_now();
        let a = prop.options().default_value().unwrap();
        assert!(matches!(a, Value::DateTime(_)));
    }

    #[test]
    fn test_datetime_format_round_trip() {
        let prop = DateTimeFormatProperty::new().format("%Y-%m-%d %H:%M:%S");
        let naive = date(2024, 6, 1).and_hms_opt(8, 30, 0).unwrap();
        let wire = prop.deflate(&Value::LocalDateTime(naive)).unwrap();
        assert_eq!(wire, Value::from("2024-06-01 08:30:00"));
        assert_eq!(prop.inflate(&wire).unwrap(), Value::LocalDateTime(naive));
    }

    #[test]
    fn test_datetime_format_date_only_parses_to_midnight() {
        let prop = DateTimeFormatProperty::new();
        let value = prop.inflate(&Value::from("2024-06-01")).unwrap();
        assert_eq!(
            value,
            Value::LocalDateTime(date(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_datetime_neo4j_native_round_trip() {
        let prop = DateTimeNeo4jFormatProperty::new();
        let naive = date(2024, 6, 1).and_hms_opt(8, 30, 0).unwrap();
        let wire = prop.deflate(&Value::LocalDateTime(naive)).unwrap();
        assert_eq!(wire, Value::DateTime(naive.and_utc()));
        assert_eq!(prop.inflate(&wire).unwrap(), Value::LocalDateTime(naive));
    }
}
