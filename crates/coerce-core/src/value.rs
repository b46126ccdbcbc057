//! The decoded value model.
//!
//! Upstream decoders only ever produce the non-temporal variants; the temporal
//! variants are produced by coercion.

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use num_bigint::BigInt;

/// A dynamically-typed, already-decoded data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(BigInt),
    Number(BigDecimal),
    String(String),
    Date(NaiveDate),
    TimeWithTimezone(OffsetTime),
    TimeWithoutTimezone(NaiveTime),
    TimestampWithTimezone(DateTime<FixedOffset>),
    TimestampWithoutTimezone(NaiveDateTime),
    Array(Vec<Value>),
    /// Field order carries no meaning.
    Object(BTreeMap<String, Value>),
}

/// Fieldless discriminant of [`Value`], used in errors and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Date,
    TimeWithTimezone,
    TimeWithoutTimezone,
    TimestampWithTimezone,
    TimestampWithoutTimezone,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::TimeWithTimezone => "time_with_timezone",
            ValueKind::TimeWithoutTimezone => "time_without_timezone",
            ValueKind::TimestampWithTimezone => "timestamp_with_timezone",
            ValueKind::TimestampWithoutTimezone => "timestamp_without_timezone",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
            Value::TimeWithTimezone(_) => ValueKind::TimeWithTimezone,
            Value::TimeWithoutTimezone(_) => ValueKind::TimeWithoutTimezone,
            Value::TimestampWithTimezone(_) => ValueKind::TimestampWithTimezone,
            Value::TimestampWithoutTimezone(_) => ValueKind::TimestampWithoutTimezone,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for the variants only coercion produces.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Date(_)
                | Value::TimeWithTimezone(_)
                | Value::TimeWithoutTimezone(_)
                | Value::TimestampWithTimezone(_)
                | Value::TimestampWithoutTimezone(_)
        )
    }
}

/// A time of day qualified by a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    /// The same wall-clock time at `+00:00`.
    pub fn utc(time: NaiveTime) -> Self {
        Self::new(time, Utc.fix())
    }
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.time.format("%H:%M:%S%.f"), self.offset)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<OffsetTime> for Value {
    fn from(t: OffsetTime) -> Self {
        Value::TimeWithTimezone(t)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::TimeWithoutTimezone(t)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::TimestampWithTimezone(dt)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::TimestampWithoutTimezone(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}
