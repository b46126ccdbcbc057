//! Coercion dispatcher and the scalar and structural coercers.
//!
//! [`coerce`] is the only entry point callers normally need. It selects a coercer
//! by the target type, and converts every coercer failure into `Ok(None)`
//! ("not coercible"), with one exception: a temporal value reaching the string
//! coercer is a [`CoercionError::ContractViolation`] and is returned as `Err`.
//! Upstream decoders never emit temporal values.
//!
//! Composite values are never coerced element by element; arrays and objects
//! pass through untouched once their variant matches.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

use crate::error::{CoercionError, Result};
use crate::json::serialize_to_string;
use crate::schema::SchemaType;
use crate::temporal::{
    coerce_date, coerce_time_with_timezone, coerce_time_without_timezone,
    coerce_timestamp_with_timezone, coerce_timestamp_without_timezone,
};
use crate::value::Value;

/// Coerce `value` to `ty`.
///
/// - `Ok(Some(v))`: `v` conforms to `ty` (null conforms to every type).
/// - `Ok(None)`: no safe conversion exists.
/// - `Err(_)`: only [`CoercionError::ContractViolation`].
///
/// With `respect_legacy_unions`, legacy unions are narrowed to one member type
/// and the value is coerced to it; otherwise unions pass the value through.
///
/// # Example
/// ```
/// use coerce_core::{coerce, SchemaType, Value};
///
/// let coerced = coerce(&Value::from("42"), &SchemaType::Integer, false).unwrap();
/// assert_eq!(coerced, Some(Value::from(42)));
///
/// let rejected = coerce(&Value::from("forty-two"), &SchemaType::Integer, false).unwrap();
/// assert_eq!(rejected, None);
/// ```
pub fn coerce(
    value: &Value,
    ty: &SchemaType,
    respect_legacy_unions: bool,
) -> Result<Option<Value>> {
    // Null conforms to every type.
    if value.is_null() {
        return Ok(Some(Value::Null));
    }
    match dispatch(value, ty, respect_legacy_unions) {
        Ok(coerced) => Ok(Some(coerced)),
        Err(e) if e.is_contract_violation() => Err(e),
        Err(e) => {
            tracing::trace!(
                target_type = %ty,
                found = %value.kind(),
                error = %e,
                "value not coercible"
            );
            Ok(None)
        }
    }
}

/// Like [`coerce`], but maps "not coercible" to [`Value::Null`].
pub fn coerce_or_null(
    value: &Value,
    ty: &SchemaType,
    respect_legacy_unions: bool,
) -> Result<Value> {
    Ok(coerce(value, ty, respect_legacy_unions)?.unwrap_or(Value::Null))
}

/// Select the coercer for `ty`. No wildcard arm: a new type must be decided here.
fn dispatch(value: &Value, ty: &SchemaType, respect_legacy_unions: bool) -> Result<Value> {
    match ty {
        SchemaType::Boolean => coerce_boolean(value),
        SchemaType::Date => coerce_date(value),
        SchemaType::Integer => coerce_integer(value),
        SchemaType::Number => coerce_number(value),
        SchemaType::String => coerce_string(value),
        SchemaType::TimeWithTimezone => coerce_time_with_timezone(value),
        SchemaType::TimeWithoutTimezone => coerce_time_without_timezone(value),
        SchemaType::TimestampWithTimezone => coerce_timestamp_with_timezone(value),
        SchemaType::TimestampWithoutTimezone => coerce_timestamp_without_timezone(value),
        SchemaType::Array(_) | SchemaType::ArrayWithoutSchema => coerce_array(value),
        SchemaType::Object(_)
        | SchemaType::ObjectWithEmptySchema
        | SchemaType::ObjectWithoutSchema => coerce_object(value),
        SchemaType::Union(union) => {
            if respect_legacy_unions && union.is_legacy_union {
                let chosen = union.choose_type()?;
                tracing::debug!(union = %ty, chosen = %chosen, "narrowed legacy union");
                dispatch(value, chosen, true)
            } else {
                Ok(value.clone())
            }
        }
        SchemaType::Unknown(_) => Ok(value.clone()),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> CoercionError {
    CoercionError::TypeMismatch {
        expected,
        found: value.kind(),
    }
}

/// Only booleans are booleans; no text or number is read as one.
pub fn coerce_boolean(value: &Value) -> Result<Value> {
    match value {
        Value::Boolean(_) => Ok(value.clone()),
        other => Err(mismatch("boolean", other)),
    }
}

/// Integers pass; numbers must be exactly integral; strings must be integer literals.
pub fn coerce_integer(value: &Value) -> Result<Value> {
    match value {
        Value::Integer(_) => Ok(value.clone()),
        // Exact conversion only: 3.0 becomes 3, 3.5 is rejected rather than truncated.
        Value::Number(n) => integral_value(n).map(Value::Integer),
        Value::String(s) => parse_integer(s).map(Value::Integer),
        other => Err(mismatch("integer", other)),
    }
}

/// Numbers pass; integers widen; strings must be decimal literals.
pub fn coerce_number(value: &Value) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::Integer(n) => Ok(Value::Number(BigDecimal::new(n.clone(), 0))),
        Value::String(s) => parse_decimal(s).map(Value::Number),
        other => Err(mismatch("number", other)),
    }
}

/// Render any decoder-produced value as text.
///
/// Arrays and objects become compact JSON. Temporal values (and null, which the
/// dispatcher never forwards) are a contract violation.
pub fn coerce_string(value: &Value) -> Result<Value> {
    let text = match value {
        Value::String(_) => return Ok(value.clone()),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serialize_to_string(value)?,
        Value::Null
        | Value::Date(_)
        | Value::TimeWithTimezone(_)
        | Value::TimeWithoutTimezone(_)
        | Value::TimestampWithTimezone(_)
        | Value::TimestampWithoutTimezone(_) => {
            return Err(CoercionError::ContractViolation {
                found: value.kind(),
            })
        }
    };
    Ok(Value::String(text))
}

/// Arrays pass unchanged; their elements are not coerced.
pub fn coerce_array(value: &Value) -> Result<Value> {
    match value {
        Value::Array(_) => Ok(value.clone()),
        other => Err(mismatch("array", other)),
    }
}

/// Objects pass unchanged; their fields are not coerced.
pub fn coerce_object(value: &Value) -> Result<Value> {
    match value {
        Value::Object(_) => Ok(value.clone()),
        other => Err(mismatch("object", other)),
    }
}

/// Largest power of ten an integral decimal may carry (`1e4096`). Larger
/// exponents are rejected as [`CoercionError::InvalidNumber`].
pub const MAX_INTEGER_EXPONENT: i64 = 4096;

/// The exact integer value of `n`, if it has one.
///
/// Decided on the normalized form (trailing zeros stripped), so the work tracks
/// the number of digits rather than the size of the exponent.
fn integral_value(n: &BigDecimal) -> Result<BigInt> {
    let (digits, scale) = n.as_bigint_and_exponent();
    if digits.sign() == Sign::NoSign {
        return Ok(digits);
    }
    let text = digits.magnitude().to_str_radix(10);
    let trailing_zeros = text.len() - text.trim_end_matches('0').len();
    let digits = digits / BigInt::from(10u32).pow(trailing_zeros as u32);
    let scale = scale - trailing_zeros as i64;
    if scale > 0 {
        return Err(CoercionError::InexactInteger(n.clone()));
    }
    let exponent = -scale;
    if exponent > MAX_INTEGER_EXPONENT {
        return Err(CoercionError::InvalidNumber(format!("{digits}e{exponent}")));
    }
    Ok(digits * BigInt::from(10u32).pow(exponent as u32))
}

/// `[+-]?[0-9]+`
fn parse_integer(text: &str) -> Result<BigInt> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoercionError::InvalidInteger(text.to_string()));
    }
    BigInt::from_str(text).map_err(|_| CoercionError::InvalidInteger(text.to_string()))
}

/// `[+-]?(digits['.'[digits]] | '.'digits)([eE][+-]?digits)?`
fn parse_decimal(text: &str) -> Result<BigDecimal> {
    if !is_decimal_literal(text) {
        return Err(CoercionError::InvalidNumber(text.to_string()));
    }
    BigDecimal::from_str(text).map_err(|_| CoercionError::InvalidNumber(text.to_string()))
}

fn is_decimal_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };

    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (mantissa, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok =
        all_digits(whole) && all_digits(fraction) && !(whole.is_empty() && fraction.is_empty());

    let exponent_ok = exponent.is_none_or(|exp| {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !digits.is_empty() && all_digits(digits)
    });

    mantissa_ok && exponent_ok
}
