//! Tagged attribute values and the kinds a schema can declare.
//!
//! `AttributeValue` is a tagged union where exactly one variant is present.
//! Values arriving as JSON are converted through [`AttributeKind::coerce`],
//! which checks them against the kind the schema declares.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use keygate_core::EntityKey;
use serde_json::Value;

/// A user principal stored on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Display name.
    pub nickname: String,
    /// Email address.
    pub email: String,
    /// Authentication domain the principal belongs to.
    pub auth_domain: String,
}

impl Identity {
    /// Build an identity from an email, deriving nickname and domain from it.
    #[must_use]
    pub fn from_email(email: impl Into<String>) -> Self {
        let email = email.into();
        let (nickname, auth_domain) = email
            .split_once('@')
            .map_or((email.as_str(), ""), |(local, domain)| (local, domain));
        Self {
            nickname: nickname.to_owned(),
            auth_domain: auth_domain.to_owned(),
            email,
        }
    }
}

/// Entity attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value.
    String(String),
    /// Number value (always finite).
    Number(serde_json::Number),
    /// Boolean value.
    Bool(bool),
    /// Explicitly cleared value.
    Null,
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time, UTC.
    DateTime(NaiveDateTime),
    /// Key of another entity.
    Reference(EntityKey),
    /// User principal.
    Identity(Identity),
    /// List of values.
    List(Vec<AttributeValue>),
    /// Nested map of values.
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the string value if this is a `String` variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number as `f64` if this is a `Number` variant.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Text identifying a customer scope, for `String` and `Reference` values.
    #[must_use]
    pub fn as_scope_id(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Reference(key) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Convert untyped JSON, as stored under `list` and `map` attributes.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Ordering used by `order_by`.
    ///
    /// Values of the same variant compare naturally; different variants are
    /// ordered by a fixed rank with `Null` first so that sorting is total.
    #[must_use]
    pub fn order_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => {
                let fa = a.as_f64().unwrap_or(0.0);
                let fb = b.as_f64().unwrap_or(0.0);
                fa.total_cmp(&fb)
            }
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Reference(a), Self::Reference(b)) => a.cmp(b),
            (Self::Identity(a), Self::Identity(b)) => a.email.cmp(&b.email),
            (Self::List(a), Self::List(b)) => a.len().cmp(&b.len()),
            (Self::Map(a), Self::Map(b)) => a.len().cmp(&b.len()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::String(_) => 3,
            Self::Date(_) => 4,
            Self::DateTime(_) => 5,
            Self::Reference(_) => 6,
            Self::Identity(_) => 7,
            Self::List(_) => 8,
            Self::Map(_) => 9,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{{string: {s}}}"),
            Self::Number(n) => write!(f, "{{number: {n}}}"),
            Self::Bool(b) => write!(f, "{{bool: {b}}}"),
            Self::Null => f.write_str("{null}"),
            Self::Date(d) => write!(f, "{{date: {d}}}"),
            Self::DateTime(dt) => write!(f, "{{datetime: {dt}}}"),
            Self::Reference(k) => write!(f, "{{reference: {k}}}"),
            Self::Identity(i) => write!(f, "{{identity: {}}}", i.email),
            Self::List(v) => write!(f, "{{list: {} items}}", v.len()),
            Self::Map(m) => write!(f, "{{map: {} keys}}", m.len()),
        }
    }
}

/// The kind of value a schema declares for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Bool,
    /// `YYYY-MM-DD` string.
    Date,
    /// RFC 3339 or naive ISO-8601 string, stored as UTC.
    #[serde(rename = "datetime")]
    DateTime,
    /// Entity key string.
    Reference,
    /// Email string or `{email, nickname?, auth_domain?}` object.
    Identity,
    /// Any JSON array.
    List,
    /// Any JSON object.
    Map,
}

impl AttributeKind {
    /// Convert a JSON value into this kind.
    ///
    /// JSON `null` clears an attribute of any kind. Returns `None` when the
    /// value has the wrong shape.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<AttributeValue> {
        if value.is_null() {
            return Some(AttributeValue::Null);
        }
        match self {
            Self::String => value.as_str().map(|s| AttributeValue::String(s.to_owned())),
            Self::Number => match value {
                Value::Number(n) => Some(AttributeValue::Number(n.clone())),
                _ => None,
            },
            Self::Bool => value.as_bool().map(AttributeValue::Bool),
            Self::Date => value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(AttributeValue::Date),
            Self::DateTime => value
                .as_str()
                .and_then(parse_datetime)
                .map(AttributeValue::DateTime),
            Self::Reference => value
                .as_str()
                .and_then(|s| EntityKey::new(s).ok())
                .map(AttributeValue::Reference),
            Self::Identity => coerce_identity(value).map(AttributeValue::Identity),
            Self::List => value.is_array().then(|| AttributeValue::from_json(value)),
            Self::Map => value.is_object().then(|| AttributeValue::from_json(value)),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn coerce_identity(value: &Value) -> Option<Identity> {
    match value {
        Value::String(email) if !email.is_empty() => Some(Identity::from_email(email.clone())),
        Value::Object(fields) => {
            let email = fields.get("email")?.as_str()?;
            let mut identity = Identity::from_email(email);
            if let Some(nickname) = fields.get("nickname").and_then(Value::as_str) {
                nickname.clone_into(&mut identity.nickname);
            }
            if let Some(domain) = fields.get("auth_domain").and_then(Value::as_str) {
                domain.clone_into(&mut identity.auth_domain);
            }
            Some(identity)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_coerce_scalars_by_kind() {
        assert_eq!(
            AttributeKind::String.coerce(&json!("x")),
            Some(AttributeValue::String("x".to_owned()))
        );
        assert_eq!(
            AttributeKind::Number.coerce(&json!(42)),
            Some(AttributeValue::Number(42.into()))
        );
        assert_eq!(
            AttributeKind::Bool.coerce(&json!(true)),
            Some(AttributeValue::Bool(true))
        );
    }

    #[test]
    fn test_should_reject_wrong_shape() {
        assert_eq!(AttributeKind::String.coerce(&json!(1)), None);
        assert_eq!(AttributeKind::Number.coerce(&json!("1")), None);
        assert_eq!(AttributeKind::Date.coerce(&json!("16/10/2026")), None);
        assert_eq!(AttributeKind::Reference.coerce(&json!("")), None);
        assert_eq!(AttributeKind::List.coerce(&json!({})), None);
    }

    #[test]
    fn test_should_clear_any_kind_with_null() {
        for kind in [AttributeKind::String, AttributeKind::Date, AttributeKind::Identity] {
            assert_eq!(kind.coerce(&Value::Null), Some(AttributeValue::Null));
        }
    }

    #[test]
    fn test_should_parse_dates_and_datetimes() {
        let date = AttributeKind::Date.coerce(&json!("2026-10-16")).unwrap();
        assert_eq!(
            date,
            AttributeValue::Date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        );

        let expected = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let rfc = AttributeKind::DateTime
            .coerce(&json!("2026-10-16T12:00:00+02:00"))
            .unwrap();
        assert_eq!(rfc, AttributeValue::DateTime(expected));
        let naive = AttributeKind::DateTime
            .coerce(&json!("2026-10-16T10:00:00"))
            .unwrap();
        assert_eq!(naive, AttributeValue::DateTime(expected));
    }

    #[test]
    fn test_should_build_identity_from_email_or_object() {
        let from_email = AttributeKind::Identity
            .coerce(&json!("ada@example.com"))
            .unwrap();
        assert_eq!(
            from_email,
            AttributeValue::Identity(Identity {
                nickname: "ada".to_owned(),
                email: "ada@example.com".to_owned(),
                auth_domain: "example.com".to_owned(),
            })
        );

        let from_object = AttributeKind::Identity
            .coerce(&json!({"email": "ada@example.com", "nickname": "Ada"}))
            .unwrap();
        match from_object {
            AttributeValue::Identity(identity) => assert_eq!(identity.nickname, "Ada"),
            other => panic!("unexpected value: {other}"),
        }
    }

    #[test]
    fn test_should_match_scope_for_string_and_reference() {
        let reference = AttributeValue::Reference(EntityKey::new("acme").unwrap());
        assert_eq!(reference.as_scope_id(), Some("acme"));
        assert_eq!(
            AttributeValue::String("acme".to_owned()).as_scope_id(),
            Some("acme")
        );
        assert_eq!(AttributeValue::Bool(true).as_scope_id(), None);
    }

    #[test]
    fn test_should_order_values() {
        let a = AttributeValue::String("alpha".to_owned());
        let b = AttributeValue::String("beta".to_owned());
        assert_eq!(a.order_cmp(&b), Ordering::Less);

        let two = AttributeValue::Number(2.into());
        let ten = AttributeValue::Number(10.into());
        assert_eq!(two.order_cmp(&ten), Ordering::Less);

        assert_eq!(AttributeValue::Null.order_cmp(&a), Ordering::Less);
    }

    #[test]
    fn test_should_convert_untyped_json() {
        let value = AttributeValue::from_json(&json!({"tags": ["a", 1], "ok": false}));
        let AttributeValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map.get("tags"),
            Some(&AttributeValue::List(vec![
                AttributeValue::String("a".to_owned()),
                AttributeValue::Number(1.into()),
            ]))
        );
        assert_eq!(map.get("ok"), Some(&AttributeValue::Bool(false)));
    }
}
