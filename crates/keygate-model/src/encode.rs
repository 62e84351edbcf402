//! JSON response encoding.
//!
//! [`encode`] is a pure function over the closed [`Encodable`] set. Values
//! outside that set implement [`JsonEncodable`] and are passed as
//! [`Encodable::Custom`].
//!
//! Date-times encode as a calendar object rather than a string:
//!
//! ```text
//! {
//!   "year": 2026, "month": 10, "day": 16,
//!   "hour": 9, "minute": 5, "second": 7, "microsecond": 0,
//!   "isoformat": "2026-10-16T09:05:07",
//!   "isoweekday": 5,
//!   "isocalendar": [2026, 42, 5],
//!   "ctime": "Fri Oct 16 09:05:07 2026",
//!   "timetuple": [2026, 10, 16, 9, 5, 7, 4, 289, -1],
//!   "epoch": 1792141507
//! }
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::{Map, Number, Value, json};

use crate::entity::Entity;
use crate::value::{AttributeValue, Identity};

const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Errors produced while encoding a response.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A self-describing value failed to produce JSON.
    #[error("custom value failed to encode: {0}")]
    Custom(String),

    /// JSON has no representation for NaN or infinity.
    #[error("cannot encode non-finite number {0}")]
    NonFiniteNumber(f64),
}

/// A value that knows its own JSON form.
pub trait JsonEncodable: std::fmt::Debug {
    /// Produce the JSON form of this value.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Custom`] if the value cannot be represented.
    fn to_json(&self) -> Result<Value, EncodeError>;
}

/// Everything the encoder accepts.
#[derive(Debug, Clone, Copy)]
pub enum Encodable<'a> {
    /// Self-describing value.
    Custom(&'a dyn JsonEncodable),
    /// One entity.
    Entity(&'a Entity),
    /// A query result.
    Entities(&'a [Entity]),
    /// A date-time (UTC).
    DateTime(&'a NaiveDateTime),
    /// A calendar date.
    Date(&'a NaiveDate),
    /// A user principal.
    Identity(&'a Identity),
    /// A single attribute value.
    Attribute(&'a AttributeValue),
    /// Plain JSON, passed through.
    Scalar(&'a Value),
    /// A floating point number.
    Float(f64),
}

/// Encode a value to JSON.
///
/// # Errors
///
/// Returns [`EncodeError`] when a custom value fails or a number is not finite.
pub fn encode(value: Encodable<'_>) -> Result<Value, EncodeError> {
    match value {
        Encodable::Custom(custom) => custom.to_json(),
        Encodable::Entity(entity) => encode_entity(entity),
        Encodable::Entities(entities) => entities
            .iter()
            .map(encode_entity)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Encodable::DateTime(dt) => Ok(encode_datetime(dt)),
        Encodable::Date(date) => Ok(encode_date(date)),
        Encodable::Identity(identity) => Ok(encode_identity(identity)),
        Encodable::Attribute(attr) => encode_attribute(attr),
        Encodable::Scalar(v) => Ok(v.clone()),
        Encodable::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or(EncodeError::NonFiniteNumber(f)),
    }
}

fn encode_entity(entity: &Entity) -> Result<Value, EncodeError> {
    let mut out = Map::new();
    for name in entity.schema().attribute_names() {
        let value = match entity.get(name) {
            Some(attr) => encode_attribute(attr)?,
            None => Value::Null,
        };
        out.insert(name.to_owned(), value);
    }
    Ok(Value::Object(out))
}

fn encode_attribute(attr: &AttributeValue) -> Result<Value, EncodeError> {
    Ok(match attr {
        AttributeValue::String(s) => Value::String(s.clone()),
        AttributeValue::Number(n) => Value::Number(n.clone()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
        AttributeValue::Date(d) => encode_date(d),
        AttributeValue::DateTime(dt) => encode_datetime(dt),
        AttributeValue::Reference(key) => Value::String(key.as_str().to_owned()),
        AttributeValue::Identity(identity) => encode_identity(identity),
        AttributeValue::List(items) => Value::Array(
            items
                .iter()
                .map(encode_attribute)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| encode_attribute(v).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn encode_identity(identity: &Identity) -> Value {
    json!({
        "nickname": identity.nickname,
        "email": identity.email,
        "auth_domain": identity.auth_domain,
    })
}

/// Calendar fields shared by dates and date-times.
fn calendar_fields(date: NaiveDate, time: Option<&NaiveDateTime>) -> Map<String, Value> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    let at = time.unwrap_or(&midnight);
    let iso_week = date.iso_week();
    let weekday = date.weekday();

    let mut out = Map::new();
    out.insert("year".to_owned(), json!(date.year()));
    out.insert("month".to_owned(), json!(date.month()));
    out.insert("day".to_owned(), json!(date.day()));
    out.insert("isoweekday".to_owned(), json!(weekday.number_from_monday()));
    out.insert(
        "isocalendar".to_owned(),
        json!([iso_week.year(), iso_week.week(), weekday.number_from_monday()]),
    );
    out.insert("ctime".to_owned(), json!(at.format(CTIME_FORMAT).to_string()));
    out.insert(
        "timetuple".to_owned(),
        json!([
            at.year(),
            at.month(),
            at.day(),
            at.hour(),
            at.minute(),
            at.second(),
            weekday.num_days_from_monday(),
            date.ordinal(),
            -1
        ]),
    );
    out.insert("epoch".to_owned(), json!(at.and_utc().timestamp()));
    out
}

fn encode_date(date: &NaiveDate) -> Value {
    let mut out = calendar_fields(*date, None);
    out.insert(
        "isoformat".to_owned(),
        json!(date.format("%Y-%m-%d").to_string()),
    );
    Value::Object(out)
}

fn encode_datetime(dt: &NaiveDateTime) -> Value {
    let mut out = calendar_fields(dt.date(), Some(dt));
    let microsecond = dt.nanosecond() / 1_000 % 1_000_000;
    let mut isoformat = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    if microsecond != 0 {
        isoformat.push_str(&format!(".{microsecond:06}"));
    }
    out.insert("hour".to_owned(), json!(dt.hour()));
    out.insert("minute".to_owned(), json!(dt.minute()));
    out.insert("second".to_owned(), json!(dt.second()));
    out.insert("microsecond".to_owned(), json!(microsecond));
    out.insert("isoformat".to_owned(), json!(isoformat));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use keygate_core::EntityKey;

    use super::*;
    use crate::schema::EntitySchema;
    use crate::value::AttributeKind;

    fn sample_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    fn schema() -> Arc<EntitySchema> {
        Arc::new(EntitySchema::new(
            "User",
            [
                ("name".to_owned(), AttributeKind::String),
                ("joined".to_owned(), AttributeKind::Date),
                ("owner".to_owned(), AttributeKind::Identity),
            ],
        ))
    }

    #[derive(Debug)]
    struct Failing;

    impl JsonEncodable for Failing {
        fn to_json(&self) -> Result<Value, EncodeError> {
            Err(EncodeError::Custom("no json form".to_owned()))
        }
    }

    #[derive(Debug)]
    struct Point(i32, i32);

    impl JsonEncodable for Point {
        fn to_json(&self) -> Result<Value, EncodeError> {
            Ok(json!({"x": self.0, "y": self.1}))
        }
    }

    #[test]
    fn test_should_encode_datetime_fields() {
        let value = encode(Encodable::DateTime(&sample_datetime())).unwrap();
        assert_eq!(value["year"], 2026);
        assert_eq!(value["month"], 10);
        assert_eq!(value["day"], 16);
        assert_eq!(value["hour"], 9);
        assert_eq!(value["minute"], 5);
        assert_eq!(value["second"], 7);
        assert_eq!(value["microsecond"], 0);
        assert_eq!(value["isoformat"], "2026-10-16T09:05:07");
        assert_eq!(value["isoweekday"], 5);
        assert_eq!(value["isocalendar"], json!([2026, 42, 5]));
        assert_eq!(value["ctime"], "Fri Oct 16 09:05:07 2026");
        assert_eq!(value["timetuple"], json!([2026, 10, 16, 9, 5, 7, 4, 289, -1]));
        assert_eq!(value["epoch"], sample_datetime().and_utc().timestamp());
    }

    #[test]
    fn test_should_include_microseconds_in_isoformat() {
        let dt = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 120)
            .unwrap();
        let value = encode(Encodable::DateTime(&dt)).unwrap();
        assert_eq!(value["microsecond"], 120);
        assert_eq!(value["isoformat"], "2026-01-02T03:04:05.000120");
        assert_eq!(value["ctime"], "Fri Jan  2 03:04:05 2026");
    }

    #[test]
    fn test_should_encode_date_without_time_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let value = encode(Encodable::Date(&date)).unwrap();
        assert_eq!(value["isoformat"], "2026-10-16");
        assert!(value.get("hour").is_none());
        assert!(value.get("microsecond").is_none());
        assert_eq!(value["timetuple"], json!([2026, 10, 16, 0, 0, 0, 4, 289, -1]));
    }

    #[test]
    fn test_should_encode_entity_as_declared_attributes() {
        let mut entity = Entity::new(EntityKey::new("K1").unwrap(), schema());
        entity.set("name", AttributeValue::String("Ada".to_owned()));
        entity.set(
            "owner",
            AttributeValue::Identity(Identity::from_email("ada@example.com")),
        );

        let value = encode(Encodable::Entity(&entity)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Ada",
                "joined": null,
                "owner": {
                    "nickname": "ada",
                    "email": "ada@example.com",
                    "auth_domain": "example.com"
                }
            })
        );
    }

    #[test]
    fn test_should_encode_result_sequence() {
        let entities = vec![
            Entity::new(EntityKey::new("K1").unwrap(), schema()),
            Entity::new(EntityKey::new("K2").unwrap(), schema()),
        ];
        let value = encode(Encodable::Entities(&entities)).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(encode(Encodable::Entities(&[])).unwrap(), json!([]));
    }

    #[test]
    fn test_should_encode_nested_attributes() {
        let mut map = BTreeMap::new();
        map.insert(
            "ref".to_owned(),
            AttributeValue::Reference(EntityKey::new("K9").unwrap()),
        );
        let attr = AttributeValue::List(vec![AttributeValue::Map(map), AttributeValue::Null]);
        assert_eq!(
            encode(Encodable::Attribute(&attr)).unwrap(),
            json!([{"ref": "K9"}, null])
        );
    }

    #[test]
    fn test_should_use_custom_encoding() {
        assert_eq!(
            encode(Encodable::Custom(&Point(1, 2))).unwrap(),
            json!({"x": 1, "y": 2})
        );
        assert!(matches!(
            encode(Encodable::Custom(&Failing)),
            Err(EncodeError::Custom(_))
        ));
    }

    #[test]
    fn test_should_reject_non_finite_float() {
        assert!(matches!(
            encode(Encodable::Float(f64::INFINITY)),
            Err(EncodeError::NonFiniteNumber(_))
        ));
        assert_eq!(encode(Encodable::Float(1.5)).unwrap(), json!(1.5));
        assert_eq!(encode(Encodable::Scalar(&json!("x"))).unwrap(), json!("x"));
    }
}
