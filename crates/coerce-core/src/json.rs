//! JSON on both sides of the coercer.
//!
//! - [`from_json`] is the upstream decoder: it only produces null, boolean,
//!   integer, number, string, array and object values.
//! - [`to_json`] / [`serialize_to_string`] render any value, temporal ones as
//!   ISO-8601 strings. The string coercer uses this for arrays and objects.
//!
//! Numbers keep their exact literal text in both directions (serde_json is built
//! with `arbitrary_precision`), so `12345678901234567890.000001` survives intact.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number};

use crate::error::{CoercionError, Result};
use crate::value::Value;

/// Decode a JSON document.
pub fn parse_str(json: &str) -> Result<Value> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    from_json(&value)
}

/// Convert a JSON tree into a [`Value`].
///
/// A number whose literal has no `.`, `e` or `E` becomes an integer; every
/// other number becomes a decimal.
pub fn from_json(json: &serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => decode_number(n)?,
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::Array(items.iter().map(from_json).collect::<Result<Vec<_>>>()?)
        }
        serde_json::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_json(v)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        ),
    })
}

fn decode_number(n: &Number) -> Result<Value> {
    let literal = n.to_string();
    if literal.contains(['.', 'e', 'E']) {
        BigDecimal::from_str(&literal)
            .map(Value::Number)
            .map_err(|_| CoercionError::InvalidNumber(literal))
    } else {
        BigInt::from_str(&literal)
            .map(Value::Integer)
            .map_err(|_| CoercionError::InvalidInteger(literal))
    }
}

/// Convert a [`Value`] into a JSON tree.
pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number(Number::from_str(&n.to_string())?),
        Value::Number(n) => serde_json::Value::Number(Number::from_str(&n.to_string())?),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::TimeWithTimezone(t) => serde_json::Value::String(t.to_string()),
        Value::TimeWithoutTimezone(t) => {
            serde_json::Value::String(t.format("%H:%M:%S%.f").to_string())
        }
        Value::TimestampWithTimezone(dt) => {
            serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string())
        }
        Value::TimestampWithoutTimezone(dt) => {
            serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect::<Result<Vec<_>>>()?)
        }
        Value::Object(fields) => {
            let mut map = Map::new();
            for (key, field) in fields {
                map.insert(key.clone(), to_json(field)?);
            }
            serde_json::Value::Object(map)
        }
    })
}

/// Render a value as compact JSON text.
pub fn serialize_to_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&to_json(value)?)?)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        to_json(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}
