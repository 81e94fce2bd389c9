//! JSON parameters bound against server-inferred Postgres types.
//!
//! Request payloads carry loosely typed JSON (`"42"`, `42`, `true`, `"2024-01-31"`), while
//! `tokio-postgres` binds parameters in binary format and requires the Rust type to match the
//! column. Statements are therefore prepared first; [`SqlValue::coerce`] then converts each JSON
//! value to the type Postgres inferred for its placeholder.
//!
//! Enum placeholders take one of the type's labels, array placeholders take a JSON array
//! whose elements follow the member type, and domains coerce as their base type.

use std::error::Error;
#[cfg(feature = "cidr")]
use std::net::IpAddr;
use std::str::FromStr;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
#[cfg(feature = "cidr")]
use cidr::{IpCidr, IpInet};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// A JSON value converted to a concrete Postgres parameter type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(Decimal),
    Text(String),
    Json(Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    #[cfg(feature = "cidr")]
    Inet(IpInet),
    #[cfg(feature = "cidr")]
    Cidr(IpCidr),
    /// One-dimensional array; elements are coerced against the member type.
    Array(Vec<SqlValue>),
}

impl SqlValue {
    /// Convert `value` to the parameter type `ty`.
    ///
    /// `column` only labels errors. JSON `null` binds as SQL `NULL` for every type.
    pub fn coerce(value: &Value, ty: &Type, column: &str) -> DbResult<Self> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }

        match ty.kind() {
            Kind::Enum(labels) => {
                let label = value
                    .as_str()
                    .filter(|s| labels.iter().any(|l| l == s))
                    .ok_or_else(|| mismatch(value, ty, column, &format!("one of {labels:?}")))?;
                // The binary form of an enum value is its label.
                Ok(SqlValue::Text(label.to_string()))
            }
            Kind::Array(member) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(value, ty, column, "a JSON array"))?;
                items
                    .iter()
                    .map(|item| Self::coerce(item, member, column))
                    .collect::<DbResult<Vec<_>>>()
                    .map(SqlValue::Array)
            }
            Kind::Domain(base) => Self::coerce(value, base, column),
            _ => Self::coerce_scalar(value, ty, column),
        }
    }

    fn coerce_scalar(value: &Value, ty: &Type, column: &str) -> DbResult<Self> {
        let fail = |expected: &str| mismatch(value, ty, column, expected);

        let coerced = match ty.name() {
            "bool" => SqlValue::Bool(to_bool(value).ok_or_else(|| fail("a boolean"))?),
            "int2" => {
                let n = to_i64(value).ok_or_else(|| fail("an integer"))?;
                SqlValue::Int2(i16::try_from(n).map_err(|_| fail("a smallint"))?)
            }
            "int4" => {
                let n = to_i64(value).ok_or_else(|| fail("an integer"))?;
                SqlValue::Int4(i32::try_from(n).map_err(|_| fail("a 32-bit integer"))?)
            }
            "int8" => SqlValue::Int8(to_i64(value).ok_or_else(|| fail("an integer"))?),
            "float4" => SqlValue::Float4(to_f64(value).ok_or_else(|| fail("a number"))? as f32),
            "float8" => SqlValue::Float8(to_f64(value).ok_or_else(|| fail("a number"))?),
            "numeric" => SqlValue::Numeric(to_decimal(value).ok_or_else(|| fail("a decimal"))?),
            "text" | "varchar" | "bpchar" | "name" | "citext" | "unknown" => {
                SqlValue::Text(to_text(value).ok_or_else(|| fail("a scalar"))?)
            }
            "json" | "jsonb" => SqlValue::Json(value.clone()),
            "uuid" => {
                let s = value.as_str().ok_or_else(|| fail("a UUID string"))?;
                SqlValue::Uuid(Uuid::parse_str(s.trim()).map_err(|_| fail("a UUID string"))?)
            }
            "date" => {
                let s = value.as_str().ok_or_else(|| fail("a date string"))?;
                SqlValue::Date(
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| fail("YYYY-MM-DD"))?,
                )
            }
            "time" => {
                let s = value.as_str().ok_or_else(|| fail("a time string"))?;
                SqlValue::Time(parse_time(s.trim()).ok_or_else(|| fail("HH:MM[:SS]"))?)
            }
            "timestamp" => {
                let s = value.as_str().ok_or_else(|| fail("a timestamp string"))?;
                SqlValue::Timestamp(parse_timestamp(s.trim()).ok_or_else(|| fail("a timestamp"))?)
            }
            "timestamptz" => {
                let s = value.as_str().ok_or_else(|| fail("a timestamp string"))?;
                SqlValue::TimestampTz(parse_timestamptz(s.trim()).ok_or_else(|| fail("a timestamp"))?)
            }
            #[cfg(feature = "cidr")]
            "inet" => {
                let s = value.as_str().ok_or_else(|| fail("an address string"))?;
                SqlValue::Inet(parse_inet(s.trim()).ok_or_else(|| fail("an address[/len]"))?)
            }
            #[cfg(feature = "cidr")]
            "cidr" => {
                let s = value.as_str().ok_or_else(|| fail("a network string"))?;
                SqlValue::Cidr(parse_cidr(s.trim()).ok_or_else(|| fail("a network without host bits"))?)
            }
            other => {
                return Err(DbError::UnsupportedType {
                    column: column.to_string(),
                    type_name: other.to_string(),
                });
            }
        };
        Ok(coerced)
    }
}

fn mismatch(value: &Value, ty: &Type, column: &str, expected: &str) -> DbError {
    DbError::encode(column, format!("expected {expected} for type {}, got {value}", ty.name()))
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // 3.0 is an integer as far as a JSON client is concerned
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
}

fn parse_timestamptz(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_timestamp(s).map(|naive| naive.and_utc()))
}

/// `addr` or `addr/len`; a bare address is a host.
#[cfg(feature = "cidr")]
fn parse_inet(s: &str) -> Option<IpInet> {
    let (addr, len) = split_network(s)?;
    IpInet::new(addr, len).ok()
}

#[cfg(feature = "cidr")]
fn parse_cidr(s: &str) -> Option<IpCidr> {
    let (addr, len) = split_network(s)?;
    IpCidr::new(addr, len).ok()
}

#[cfg(feature = "cidr")]
fn split_network(s: &str) -> Option<(IpAddr, u8)> {
    match s.split_once('/') {
        Some((addr, len)) => Some((addr.parse().ok()?, len.parse().ok()?)),
        None => {
            let addr: IpAddr = s.parse().ok()?;
            let len = if addr.is_ipv4() { 32 } else { 128 };
            Some((addr, len))
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::Int2(v) => v.to_sql(ty, out),
            SqlValue::Int4(v) => v.to_sql(ty, out),
            SqlValue::Int8(v) => v.to_sql(ty, out),
            SqlValue::Float4(v) => v.to_sql(ty, out),
            SqlValue::Float8(v) => v.to_sql(ty, out),
            SqlValue::Numeric(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
            SqlValue::Json(v) => v.to_sql(ty, out),
            SqlValue::Uuid(v) => v.to_sql(ty, out),
            SqlValue::Date(v) => v.to_sql(ty, out),
            SqlValue::Time(v) => v.to_sql(ty, out),
            SqlValue::Timestamp(v) => v.to_sql(ty, out),
            SqlValue::TimestampTz(v) => v.to_sql(ty, out),
            #[cfg(feature = "cidr")]
            SqlValue::Inet(v) => v.to_sql(ty, out),
            #[cfg(feature = "cidr")]
            SqlValue::Cidr(v) => v.to_sql(ty, out),
            SqlValue::Array(items) => items.to_sql(ty, out),
        }
    }

    // Each variant was produced for a specific inferred type; the inner
    // `to_sql` call still rejects a mismatch.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(v: Value, ty: Type) -> DbResult<SqlValue> {
        SqlValue::coerce(&v, &ty, "col")
    }

    #[test]
    fn null_binds_for_any_type() {
        assert_eq!(coerce(json!(null), Type::INT4).unwrap(), SqlValue::Null);
        assert_eq!(coerce(json!(null), Type::UUID).unwrap(), SqlValue::Null);
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        assert_eq!(coerce(json!(42), Type::INT8).unwrap(), SqlValue::Int8(42));
        assert_eq!(coerce(json!("42"), Type::INT4).unwrap(), SqlValue::Int4(42));
        assert_eq!(coerce(json!(3.0), Type::INT2).unwrap(), SqlValue::Int2(3));
        assert!(coerce(json!("abc"), Type::INT4).is_err());
        assert!(coerce(json!(2.5), Type::INT8).is_err());
        assert!(coerce(json!(70000), Type::INT2).is_err());
    }

    #[test]
    fn text_accepts_scalars() {
        assert_eq!(
            coerce(json!("active"), Type::VARCHAR).unwrap(),
            SqlValue::Text("active".into())
        );
        assert_eq!(coerce(json!(7), Type::TEXT).unwrap(), SqlValue::Text("7".into()));
        assert!(coerce(json!({"a": 1}), Type::TEXT).is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(coerce(json!(true), Type::BOOL).unwrap(), SqlValue::Bool(true));
        assert_eq!(coerce(json!("f"), Type::BOOL).unwrap(), SqlValue::Bool(false));
        assert_eq!(coerce(json!(1), Type::BOOL).unwrap(), SqlValue::Bool(true));
        assert!(coerce(json!("maybe"), Type::BOOL).is_err());
    }

    #[test]
    fn numeric_keeps_precision() {
        assert_eq!(
            coerce(json!("19.99"), Type::NUMERIC).unwrap(),
            SqlValue::Numeric(Decimal::from_str("19.99").unwrap())
        );
        assert_eq!(
            coerce(json!(5), Type::NUMERIC).unwrap(),
            SqlValue::Numeric(Decimal::from(5))
        );
    }

    #[test]
    fn json_columns_take_any_value() {
        let v = json!({"tags": ["a", "b"]});
        assert_eq!(coerce(v.clone(), Type::JSONB).unwrap(), SqlValue::Json(v));
    }

    #[test]
    fn temporal_types() {
        assert_eq!(
            coerce(json!("2024-01-31"), Type::DATE).unwrap(),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert!(matches!(
            coerce(json!("2024-01-31 10:15:00"), Type::TIMESTAMP).unwrap(),
            SqlValue::Timestamp(_)
        ));
        assert!(matches!(
            coerce(json!("2024-01-31T10:15:00+02:00"), Type::TIMESTAMPTZ).unwrap(),
            SqlValue::TimestampTz(_)
        ));
        assert!(matches!(coerce(json!("10:15"), Type::TIME).unwrap(), SqlValue::Time(_)));
        assert!(coerce(json!("31/01/2024"), Type::DATE).is_err());
    }

    #[test]
    fn uuid_strings() {
        let id = Uuid::new_v4();
        assert_eq!(
            coerce(json!(id.to_string()), Type::UUID).unwrap(),
            SqlValue::Uuid(id)
        );
    }

    fn mood() -> Type {
        Type::new(
            "mood".into(),
            0,
            Kind::Enum(vec!["happy".into(), "sad".into()]),
            "public".into(),
        )
    }

    #[test]
    fn enum_takes_a_known_label() {
        assert_eq!(coerce(json!("sad"), mood()).unwrap(), SqlValue::Text("sad".into()));
        assert!(coerce(json!("grumpy"), mood()).is_err());
        assert!(coerce(json!(1), mood()).is_err());
    }

    #[test]
    fn arrays_coerce_each_element() {
        assert_eq!(
            coerce(json!(["a", null, 3]), Type::TEXT_ARRAY).unwrap(),
            SqlValue::Array(vec![
                SqlValue::Text("a".into()),
                SqlValue::Null,
                SqlValue::Text("3".into()),
            ])
        );
        assert_eq!(
            coerce(json!(["1", 2]), Type::INT4_ARRAY).unwrap(),
            SqlValue::Array(vec![SqlValue::Int4(1), SqlValue::Int4(2)])
        );
        assert_eq!(coerce(json!([]), Type::INT8_ARRAY).unwrap(), SqlValue::Array(vec![]));
        assert!(coerce(json!("a,b"), Type::TEXT_ARRAY).is_err());
        assert!(coerce(json!([["a"]]), Type::TEXT_ARRAY).is_err());
        assert!(coerce(json!(["x"]), Type::INT4_ARRAY).is_err());
    }

    #[test]
    fn enum_arrays_check_labels() {
        let moods = Type::new("_mood".into(), 0, Kind::Array(mood()), "public".into());
        assert_eq!(
            coerce(json!(["happy"]), moods.clone()).unwrap(),
            SqlValue::Array(vec![SqlValue::Text("happy".into())])
        );
        assert!(coerce(json!(["meh"]), moods).is_err());
    }

    #[test]
    fn domains_coerce_as_their_base_type() {
        let positive = Type::new("positive".into(), 0, Kind::Domain(Type::INT4), "public".into());
        assert_eq!(coerce(json!("5"), positive).unwrap(), SqlValue::Int4(5));
    }

    #[cfg(feature = "cidr")]
    #[test]
    fn network_addresses() {
        let host = coerce(json!("10.0.0.1"), Type::INET).unwrap();
        let SqlValue::Inet(inet) = host else {
            panic!("expected inet, got {host:?}");
        };
        assert_eq!(inet.network_length(), 32);

        let net = coerce(json!("192.168.0.5/24"), Type::INET).unwrap();
        assert!(matches!(net, SqlValue::Inet(ref i) if i.network_length() == 24));

        assert!(matches!(
            coerce(json!("192.168.0.0/24"), Type::CIDR).unwrap(),
            SqlValue::Cidr(_)
        ));
        assert!(coerce(json!("192.168.0.5/24"), Type::CIDR).is_err());
        assert!(coerce(json!("not-an-ip"), Type::INET).is_err());
        assert!(coerce(json!("::1"), Type::INET).is_ok());
    }

    #[test]
    fn unsupported_type_is_reported() {
        let err = coerce(json!("x"), Type::BYTEA).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedType { ref type_name, .. } if type_name == "bytea"));
    }
}
