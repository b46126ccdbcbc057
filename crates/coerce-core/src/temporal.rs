//! Temporal coercers: date, time and timestamp, with and without timezone.
//!
//! All five share one shape. A value already carrying the target variant passes
//! through; a string is scanned against the accepted lexical forms; anything else is
//! rejected. Missing zone information means UTC.

use std::fmt;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoercionError, Result};
use crate::temporal_format::{scan_date_time, scan_time, Zone};
use crate::value::{OffsetTime, Value};

/// The temporal target types, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    TimeWithTimezone,
    TimeWithoutTimezone,
    TimestampWithTimezone,
    TimestampWithoutTimezone,
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemporalKind::Date => "date",
            TemporalKind::TimeWithTimezone => "time with timezone",
            TemporalKind::TimeWithoutTimezone => "time without timezone",
            TemporalKind::TimestampWithTimezone => "timestamp with timezone",
            TemporalKind::TimestampWithoutTimezone => "timestamp without timezone",
        })
    }
}

/// Take the string out of `value`, or report a mismatch against `expected`.
fn require_string<'a>(value: &'a Value, expected: &'static str) -> Result<&'a str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(CoercionError::TypeMismatch {
            expected,
            found: other.kind(),
        }),
    }
}

/// Coerce to a calendar date.
///
/// A trailing time part is accepted and discarded, so `2023-01-15T10:00:00Z`
/// yields `2023-01-15`. It must still be a valid time.
pub fn coerce_date(value: &Value) -> Result<Value> {
    if let Value::Date(_) = value {
        return Ok(value.clone());
    }
    let text = require_string(value, "date")?;
    let invalid =
        |reason: String| CoercionError::invalid_temporal(TemporalKind::Date, text, reason);

    let fields = scan_date_time(text).map_err(invalid)?;
    fields.time().map_err(invalid)?;
    Ok(Value::Date(fields.date().map_err(invalid)?))
}

/// Coerce to a time of day with an offset.
///
/// Bare times are taken as UTC. So are times qualified only by a region name,
/// whose offset cannot be known without a date.
pub fn coerce_time_with_timezone(value: &Value) -> Result<Value> {
    if let Value::TimeWithTimezone(_) = value {
        return Ok(value.clone());
    }
    let text = require_string(value, "time with timezone")?;
    let invalid = |reason: String| {
        CoercionError::invalid_temporal(TemporalKind::TimeWithTimezone, text, reason)
    };

    let fields = scan_time(text).map_err(invalid)?;
    let time = fields
        .time()
        .map_err(invalid)?
        .ok_or_else(|| invalid("missing time of day".to_string()))?;
    let offset_time = match fields.zone {
        Some(Zone::Offset(offset)) => OffsetTime::new(time, offset),
        Some(Zone::Region(_)) | None => OffsetTime::utc(time),
    };
    Ok(Value::TimeWithTimezone(offset_time))
}

/// Coerce to a time of day without zone. Text carrying any zone is rejected.
pub fn coerce_time_without_timezone(value: &Value) -> Result<Value> {
    if let Value::TimeWithoutTimezone(_) = value {
        return Ok(value.clone());
    }
    let text = require_string(value, "time without timezone")?;
    let invalid = |reason: String| {
        CoercionError::invalid_temporal(TemporalKind::TimeWithoutTimezone, text, reason)
    };

    let fields = scan_time(text).map_err(invalid)?;
    if fields.zone.is_some() {
        return Err(invalid("zone information is not allowed".to_string()));
    }
    let time = fields
        .time()
        .map_err(invalid)?
        .ok_or_else(|| invalid("missing time of day".to_string()))?;
    Ok(Value::TimeWithoutTimezone(time))
}

/// Coerce to an offset-qualified timestamp. Zone-less text is taken as UTC.
pub fn coerce_timestamp_with_timezone(value: &Value) -> Result<Value> {
    if let Value::TimestampWithTimezone(_) = value {
        return Ok(value.clone());
    }
    let text = require_string(value, "timestamp with timezone")?;
    offset_date_time(text, TemporalKind::TimestampWithTimezone).map(Value::TimestampWithTimezone)
}

/// Coerce to a local timestamp.
///
/// The text is resolved exactly as for [`coerce_timestamp_with_timezone`], then
/// the offset is dropped; the wall-clock fields are kept as written.
pub fn coerce_timestamp_without_timezone(value: &Value) -> Result<Value> {
    if let Value::TimestampWithoutTimezone(_) = value {
        return Ok(value.clone());
    }
    let text = require_string(value, "timestamp without timezone")?;
    offset_date_time(text, TemporalKind::TimestampWithoutTimezone)
        .map(|dt| Value::TimestampWithoutTimezone(dt.naive_local()))
}

fn offset_date_time(text: &str, kind: TemporalKind) -> Result<DateTime<FixedOffset>> {
    let invalid = |reason: String| CoercionError::invalid_temporal(kind, text, reason);

    let fields = scan_date_time(text).map_err(invalid)?;
    let date = fields.date().map_err(invalid)?;
    let time = fields
        .time()
        .map_err(invalid)?
        .ok_or_else(|| invalid("missing time of day".to_string()))?;
    let local = date.and_time(time);

    match fields.zone {
        Some(Zone::Offset(offset)) => offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| invalid("local time out of range for offset".to_string())),
        Some(Zone::Region(tz)) => resolve_in_region(tz, local).map_err(invalid),
        None => Ok(Utc.fix().from_utc_datetime(&local)),
    }
}

/// Attach a region's offset to a local date-time.
///
/// Ambiguous local times (clocks going back) take the earlier offset. Local
/// times inside a gap (clocks going forward) are moved later by the gap length.
fn resolve_in_region(
    tz: Tz,
    local: NaiveDateTime,
) -> std::result::Result<DateTime<FixedOffset>, String> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => {
            let day_before = local.checked_sub_signed(TimeDelta::days(1)).unwrap_or(local);
            let offset_before_gap = tz.offset_from_utc_datetime(&day_before).fix();
            let instant = local
                .checked_sub_signed(TimeDelta::seconds(i64::from(
                    offset_before_gap.local_minus_utc(),
                )))
                .ok_or_else(|| format!("{local} out of range in {tz}"))?;
            Ok(tz.from_utc_datetime(&instant).fixed_offset())
        }
    }
}
