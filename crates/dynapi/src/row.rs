//! Row decoding for tables whose shape is unknown at compile time.

use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
#[cfg(feature = "cidr")]
use cidr::{IpCidr, IpInet};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Extension methods on [`Row`].
pub trait RowExt {
    /// Decode every column into a JSON object keyed by column name.
    ///
    /// Fails with [`DbError::UnsupportedType`] when a column has no JSON mapping.
    fn to_json(&self) -> DbResult<Value>;

    /// Decode a single column by index.
    fn column_json(&self, idx: usize) -> DbResult<Value>;
}

impl RowExt for Row {
    fn to_json(&self) -> DbResult<Value> {
        let mut map = Map::with_capacity(self.len());
        for (idx, column) in self.columns().iter().enumerate() {
            map.insert(column.name().to_string(), self.column_json(idx)?);
        }
        Ok(Value::Object(map))
    }

    fn column_json(&self, idx: usize) -> DbResult<Value> {
        let column = self
            .columns()
            .get(idx)
            .ok_or_else(|| DbError::decode(format!("#{idx}"), "column index out of range"))?;
        let cell = Cell {
            row: self,
            idx,
            name: column.name(),
        };

        let (shape, ty) = match column.type_().kind() {
            Kind::Array(member) => (Shape::Array, member),
            _ => (Shape::Scalar, column.type_()),
        };

        if let Kind::Enum(_) = ty.kind() {
            return cell.decode(shape, |label: EnumLabel| Value::String(label.0));
        }

        match ty.name() {
            "bool" => cell.decode(shape, Value::Bool),
            "int2" => cell.decode(shape, |v: i16| Value::from(v)),
            "int4" => cell.decode(shape, |v: i32| Value::from(v)),
            "int8" => cell.decode(shape, |v: i64| Value::from(v)),
            "float4" => cell.decode(shape, |v: f32| float(f64::from(v))),
            "float8" => cell.decode(shape, float),
            // numeric keeps its exact digits as a string
            "numeric" => cell.decode(shape, |d: Decimal| Value::String(d.to_string())),
            "text" | "varchar" | "bpchar" | "name" | "citext" => cell.decode(shape, Value::String),
            "json" | "jsonb" => cell.decode(shape, |v: Value| v),
            "uuid" => cell.decode(shape, |u: Uuid| Value::String(u.to_string())),
            "date" => cell.decode(shape, |d: NaiveDate| Value::String(d.to_string())),
            "time" => cell.decode(shape, |t: NaiveTime| Value::String(t.to_string())),
            "timestamp" => cell.decode(shape, |ts: NaiveDateTime| {
                Value::String(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }),
            "timestamptz" => {
                cell.decode(shape, |ts: DateTime<Utc>| Value::String(ts.to_rfc3339()))
            }
            #[cfg(feature = "cidr")]
            "inet" => cell.decode(shape, |inet: IpInet| Value::String(inet_text(inet))),
            #[cfg(feature = "cidr")]
            "cidr" => cell.decode(shape, |net: IpCidr| {
                Value::String(format!("{}/{}", net.first_address(), net.network_length()))
            }),
            _ => Err(DbError::UnsupportedType {
                column: cell.name.to_string(),
                type_name: column.type_().name().to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Scalar,
    /// One-dimensional array of the member type.
    Array,
}

struct Cell<'a> {
    row: &'a Row,
    idx: usize,
    name: &'a str,
}

impl<'a> Cell<'a> {
    fn decode<T: FromSql<'a>>(&self, shape: Shape, to_json: impl Fn(T) -> Value) -> DbResult<Value> {
        let value = match shape {
            Shape::Scalar => self.get::<T>()?.map(&to_json),
            Shape::Array => self.get::<Vec<Option<T>>>()?.map(|items| {
                Value::Array(
                    items
                        .into_iter()
                        .map(|item| item.map_or(Value::Null, &to_json))
                        .collect(),
                )
            }),
        };
        Ok(value.unwrap_or(Value::Null))
    }

    fn get<T: FromSql<'a>>(&self) -> DbResult<Option<T>> {
        self.row
            .try_get::<_, Option<T>>(self.idx)
            .map_err(|e| DbError::decode(self.name, e.to_string()))
    }
}

/// A user-defined enum value; its wire form is the UTF-8 label.
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(EnumLabel(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

// NaN and infinities have no JSON form
fn float(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Postgres prints host addresses without the prefix length.
#[cfg(feature = "cidr")]
fn inet_text(inet: IpInet) -> String {
    let host_len = if inet.address().is_ipv4() { 32 } else { 128 };
    if inet.network_length() == host_len {
        inet.address().to_string()
    } else {
        format!("{}/{}", inet.address(), inet.network_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_label_accepts_only_enums() {
        let mood = Type::new("mood".into(), 0, Kind::Enum(vec!["ok".into()]), "public".into());
        assert!(EnumLabel::accepts(&mood));
        assert!(!EnumLabel::accepts(&Type::TEXT));
        let label = EnumLabel::from_sql(&mood, b"ok").unwrap();
        assert_eq!(label.0, "ok");
    }

    #[test]
    fn non_finite_floats_are_null() {
        assert_eq!(float(f64::NAN), Value::Null);
        assert_eq!(float(1.5), serde_json::json!(1.5));
    }

    #[cfg(feature = "cidr")]
    #[test]
    fn inet_text_matches_postgres_output() {
        let host = IpInet::new("10.0.0.1".parse().unwrap(), 32).unwrap();
        assert_eq!(inet_text(host), "10.0.0.1");
        let net = IpInet::new("10.0.0.1".parse().unwrap(), 8).unwrap();
        assert_eq!(inet_text(net), "10.0.0.1/8");
        let v6 = IpInet::new("::1".parse().unwrap(), 128).unwrap();
        assert_eq!(inet_text(v6), "::1");
    }
}
