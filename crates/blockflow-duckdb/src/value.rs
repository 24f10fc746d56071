//! Conversion of DuckDB values into JSON.

use duckdb::types::{TimeUnit, Value};
use jiff::civil::Date;
use jiff::{Span, Timestamp};
use serde_json::Value as Json;

/// Converts a DuckDB value into its JSON representation.
///
/// Integers and floats become numbers (128-bit integers only when they fit
/// in 64 bits), dates and timestamps become ISO 8601 strings, and types
/// without a natural JSON form fall back to their debug rendering.
pub(crate) fn to_json(value: Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(value) => Json::Bool(value),
        Value::TinyInt(value) => Json::from(value),
        Value::SmallInt(value) => Json::from(value),
        Value::Int(value) => Json::from(value),
        Value::BigInt(value) => Json::from(value),
        Value::HugeInt(value) => match i64::try_from(value) {
            Ok(value) => Json::from(value),
            Err(_) => Json::String(value.to_string()),
        },
        Value::UTinyInt(value) => Json::from(value),
        Value::USmallInt(value) => Json::from(value),
        Value::UInt(value) => Json::from(value),
        Value::UBigInt(value) => Json::from(value),
        Value::Float(value) => Json::from(f64::from(value)),
        Value::Double(value) => Json::from(value),
        Value::Decimal(value) => Json::String(value.to_string()),
        Value::Text(value) => Json::String(value),
        Value::Date32(days) => date(days).map_or(Json::Null, |date| Json::String(date.to_string())),
        Value::Timestamp(unit, value) => {
            timestamp(unit, value).map_or(Json::Null, |ts| Json::String(ts.to_string()))
        }
        other => Json::String(format!("{other:?}")),
    }
}

fn date(days: i32) -> Option<Date> {
    let span = Span::new().try_days(days).ok()?;
    Date::constant(1970, 1, 1).checked_add(span).ok()
}

fn timestamp(unit: TimeUnit, value: i64) -> Option<Timestamp> {
    let timestamp = match unit {
        TimeUnit::Second => Timestamp::from_second(value),
        TimeUnit::Millisecond => Timestamp::from_millisecond(value),
        TimeUnit::Microsecond => Timestamp::from_microsecond(value),
        TimeUnit::Nanosecond => Timestamp::from_nanosecond(i128::from(value)),
    };
    timestamp.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalars() {
        assert_eq!(to_json(Value::Null), Json::Null);
        assert_eq!(to_json(Value::Boolean(true)), Json::Bool(true));
        assert_eq!(to_json(Value::BigInt(-3)), Json::from(-3));
        assert_eq!(to_json(Value::HugeInt(42)), Json::from(42));
        assert_eq!(
            to_json(Value::HugeInt(i128::MAX)),
            Json::String(i128::MAX.to_string())
        );
        assert_eq!(to_json(Value::Double(1.5)), Json::from(1.5));
        assert_eq!(to_json(Value::Text("a".into())), Json::from("a"));
    }

    #[test]
    fn converts_temporal_values() {
        assert_eq!(to_json(Value::Date32(0)), Json::from("1970-01-01"));
        assert_eq!(to_json(Value::Date32(19723)), Json::from("2024-01-01"));
        assert_eq!(
            to_json(Value::Timestamp(TimeUnit::Second, 0)),
            Json::from("1970-01-01T00:00:00Z")
        );
    }
}
