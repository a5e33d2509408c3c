//! Transport value parsing
//!
//! Cells arrive from the engine either in their native scalar shape or as
//! the textual casts selected by `vt_core::schema::cast_for`. This module
//! turns them back into display-ready values. Parsing never fails a row:
//! anything unparseable degrades to `Value::Unparsed` carrying the raw
//! text.

use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use vt_core::schema::{ColumnSchema, TypeCategory};

/// A cell as extracted from the transport batch, before parsing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawCell<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

/// A parsed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Wide integer transported as text; `sort` preserves full precision
    BigInt { display: String, sort: i128 },
    /// Canonical instant for DATE and TIMESTAMP families
    Instant(DateTime<Utc>),
    /// Structured parse of a complex-category value
    Json(serde_json::Value),
    /// Raw text kept after a failed parse
    Unparsed(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Display text for the value, as a UI would render it
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) | Value::Unparsed(s) => s.clone(),
            Value::BigInt { display, .. } => display.clone(),
            Value::Instant(dt) => dt.to_rfc3339(),
            Value::Json(v) => v.to_string(),
        }
    }
}

/// One delivered row: parsed values by column key plus the positional
/// index the backend's window function assigned under the current sort.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    /// One-based position from `row_number()`; stable per (filter, sort)
    pub oid: i64,
    pub values: AHashMap<String, Value>,
}

impl RowRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Parse a transported cell back to display form.
///
/// Never panics and never errors: failures degrade to the raw text.
pub fn parse_value(raw: RawCell<'_>, schema: &ColumnSchema) -> Value {
    match raw {
        RawCell::Null => Value::Null,
        RawCell::Bool(b) => Value::Bool(b),
        RawCell::Int(i) => parse_int(i, schema),
        RawCell::Float(f) => Value::Float(f),
        RawCell::Text(s) => parse_text(s, schema),
    }
}

fn parse_int(i: i64, schema: &ColumnSchema) -> Value {
    if schema.wide_integer() {
        return Value::BigInt {
            display: i.to_string(),
            sort: i as i128,
        };
    }
    match schema.category {
        // SQLite reports booleans as 0/1 integers.
        TypeCategory::Boolean => Value::Bool(i != 0),
        _ => Value::Int(i),
    }
}

fn parse_text(s: &str, schema: &ColumnSchema) -> Value {
    if schema.wide_integer() {
        return match s.trim().parse::<i128>() {
            Ok(sort) => Value::BigInt {
                display: s.trim().to_string(),
                sort,
            },
            Err(_) => Value::Unparsed(s.to_string()),
        };
    }
    match schema.category {
        TypeCategory::Temporal => parse_temporal(s, schema),
        TypeCategory::Complex => match serde_json::from_str(s) {
            Ok(v) => Value::Json(v),
            Err(_) => Value::Unparsed(s.to_string()),
        },
        _ => Value::Text(s.to_string()),
    }
}

/// DATE and TIMESTAMP families become canonical instants; TIME and
/// INTERVAL pass through as text.
fn parse_temporal(s: &str, schema: &ColumnSchema) -> Value {
    let ty = schema.sql_type.trim().to_ascii_uppercase();
    let instant_family = ty.starts_with("TIMESTAMP") || ty.starts_with("DATETIME") || ty.starts_with("DATE");
    if !instant_family {
        return Value::Text(s.to_string());
    }

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Value::Instant(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Value::Instant(Utc.from_utc_datetime(&dt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Value::Instant(Utc.from_utc_datetime(&dt));
        }
    }
    Value::Unparsed(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_core::schema::ColumnSchema;

    #[test]
    fn null_stays_null() {
        let schema = ColumnSchema::new("a", "INTEGER");
        assert_eq!(parse_value(RawCell::Null, &schema), Value::Null);
    }

    #[test]
    fn wide_int_round_trips_through_text() {
        let schema = ColumnSchema::new("a", "BIGINT");
        let value = parse_value(RawCell::Text("9223372036854775807"), &schema);
        match value {
            Value::BigInt { display, sort } => {
                assert_eq!(display.parse::<i128>().unwrap(), sort);
                assert_eq!(sort, i64::MAX as i128);
            }
            other => panic!("expected BigInt, got {other:?}"),
        }
    }

    #[test]
    fn hugeint_beyond_i64_survives() {
        let schema = ColumnSchema::new("a", "HUGEINT");
        let value = parse_value(RawCell::Text("170141183460469231731687303715884105727"), &schema);
        match value {
            Value::BigInt { sort, .. } => assert_eq!(sort, i128::MAX),
            other => panic!("expected BigInt, got {other:?}"),
        }
    }

    #[test]
    fn garbage_wide_int_degrades() {
        let schema = ColumnSchema::new("a", "BIGINT");
        assert_eq!(
            parse_value(RawCell::Text("not a number"), &schema),
            Value::Unparsed("not a number".into())
        );
    }

    #[test]
    fn timestamps_become_instants() {
        let schema = ColumnSchema::new("t", "TIMESTAMP");
        match parse_value(RawCell::Text("2024-03-01 12:30:00"), &schema) {
            Value::Instant(dt) => assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00"),
            other => panic!("expected Instant, got {other:?}"),
        }
        let date_schema = ColumnSchema::new("d", "DATE");
        assert!(matches!(
            parse_value(RawCell::Text("2024-03-01"), &date_schema),
            Value::Instant(_)
        ));
    }

    #[test]
    fn time_and_interval_pass_through() {
        let time = ColumnSchema::new("t", "TIME");
        assert_eq!(
            parse_value(RawCell::Text("12:30:00"), &time),
            Value::Text("12:30:00".into())
        );
        let interval = ColumnSchema::new("i", "INTERVAL");
        assert_eq!(
            parse_value(RawCell::Text("3 days"), &interval),
            Value::Text("3 days".into())
        );
    }

    #[test]
    fn complex_parses_as_json_or_degrades() {
        let schema = ColumnSchema::new("j", "JSON");
        assert_eq!(
            parse_value(RawCell::Text("[1,2,3]"), &schema),
            Value::Json(serde_json::json!([1, 2, 3]))
        );
        assert_eq!(
            parse_value(RawCell::Text("{'a': 1}"), &schema),
            Value::Unparsed("{'a': 1}".into())
        );
    }

    #[test]
    fn sqlite_boolean_integers() {
        let schema = ColumnSchema::new("b", "BOOLEAN");
        assert_eq!(parse_value(RawCell::Int(1), &schema), Value::Bool(true));
        assert_eq!(parse_value(RawCell::Int(0), &schema), Value::Bool(false));
    }

    #[test]
    fn plain_scalars_pass_through() {
        let schema = ColumnSchema::new("n", "INTEGER");
        assert_eq!(parse_value(RawCell::Int(42), &schema), Value::Int(42));
        let fschema = ColumnSchema::new("f", "DOUBLE");
        assert_eq!(parse_value(RawCell::Float(1.5), &fschema), Value::Float(1.5));
        let tschema = ColumnSchema::new("s", "VARCHAR");
        assert_eq!(
            parse_value(RawCell::Text("hi"), &tschema),
            Value::Text("hi".into())
        );
    }

    #[test]
    fn invalid_timestamp_degrades() {
        let schema = ColumnSchema::new("t", "TIMESTAMP");
        assert_eq!(
            parse_value(RawCell::Text("soonish"), &schema),
            Value::Unparsed("soonish".into())
        );
    }
}
