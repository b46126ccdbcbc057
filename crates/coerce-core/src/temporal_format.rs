//! Lexical scanner for the textual date, time and date-time forms accepted by
//! the temporal coercers.
//!
//! Every bracketed element is optional and tried in order. An element that fails
//! leaves both the input position and the fields collected so far untouched, so a
//! half-matched section (say `T10` with no minutes) is abandoned as a whole.
//!
//! ```text
//! date-time := [yyyy][yy] sep [MMM][MM][M] sep [dd][d] [[' '][G]]
//!              [[' ']['T'] HH ':' mm [':' ss fraction [' '][zone] [[' '][G]]]]
//! time      := HH ':' mm [':' ss fraction [' '][zone]]
//! sep       := ['-']['/']['.'][' ']
//! fraction  := ['.'][SSSSSS][SSSSS][SSSS][SSS]
//! zone      := 'Z' | ±HH[[':']mm] | (UTC|GMT|UT)[±H[H][[':']mm]] | region | abbreviation
//! ```
//!
//! The whole input must be consumed. A field matched twice with different values
//! (for instance `MM` and `M` both succeeding) fails the scan.

use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use chrono_tz::Tz;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Common zone abbreviations, mapped to the region whose rules they name.
const ZONE_ABBREVIATIONS: &[(&str, Tz)] = &[
    ("EST", Tz::America__New_York),
    ("EDT", Tz::America__New_York),
    ("CST", Tz::America__Chicago),
    ("CDT", Tz::America__Chicago),
    ("MST", Tz::America__Denver),
    ("MDT", Tz::America__Denver),
    ("PST", Tz::America__Los_Angeles),
    ("PDT", Tz::America__Los_Angeles),
    ("AKST", Tz::America__Anchorage),
    ("AKDT", Tz::America__Anchorage),
    ("HST", Tz::Pacific__Honolulu),
    ("BST", Tz::Europe__London),
    ("CET", Tz::Europe__Paris),
    ("CEST", Tz::Europe__Paris),
    ("EET", Tz::Europe__Athens),
    ("EEST", Tz::Europe__Athens),
    ("IST", Tz::Asia__Kolkata),
    ("JST", Tz::Asia__Tokyo),
    ("AEST", Tz::Australia__Sydney),
    ("AEDT", Tz::Australia__Sydney),
];

/// Offsets beyond ±18:00 are rejected.
const MAX_OFFSET_HOURS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Era {
    Ad,
    Bc,
}

/// Zone information found after a time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Zone {
    /// A fixed offset (`Z`, `+05:30`, `GMT+8`, ...).
    Offset(FixedOffset),
    /// A named region; its offset depends on the date.
    Region(Tz),
}

/// Raw fields collected by a scan, before range checks.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Fields {
    year_of_era: Option<i64>,
    month: Option<u64>,
    day: Option<u64>,
    era: Option<Era>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    nano: Option<u32>,
    pub(crate) zone: Option<Zone>,
    conflict: Option<&'static str>,
}

/// Scan text against the date-time grammar.
pub(crate) fn scan_date_time(input: &str) -> Result<Fields, String> {
    let mut scanner = Scanner::new(input);
    scanner.date();
    scanner.era_suffix();
    scanner.optional(|s| {
        s.optional(|s| s.literal(b' '));
        s.optional(|s| s.literal(b'T'));
        s.time_of_day(true)
    });
    scanner.finish()
}

/// Scan text against the time-of-day grammar.
pub(crate) fn scan_time(input: &str) -> Result<Fields, String> {
    let mut scanner = Scanner::new(input);
    scanner
        .time_of_day(false)
        .ok_or_else(|| "expected a time of day as HH:mm".to_string())?;
    scanner.finish()
}

impl Fields {
    /// Resolve the calendar date. Year, month and day are all required.
    ///
    /// A day past the end of the month (but at most 31) is clamped to the
    /// month's last day.
    pub(crate) fn date(&self) -> Result<NaiveDate, String> {
        let year_of_era = self.year_of_era.ok_or("missing year")?;
        let month = self.month.ok_or("missing month")?;
        let day = self.day.ok_or("missing day of month")?;

        if year_of_era < 1 {
            return Err(format!("year-of-era {year_of_era} out of range"));
        }
        let year = match self.era {
            Some(Era::Bc) => 1 - year_of_era,
            Some(Era::Ad) | None => year_of_era,
        };
        let year = i32::try_from(year).map_err(|_| format!("year {year} out of range"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month {month} out of range"));
        }
        if !(1..=31).contains(&day) {
            return Err(format!("day of month {day} out of range"));
        }

        let month = month as u32;
        let day = (day as u32).min(days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| format!("year {year} out of range"))
    }

    /// Resolve the time of day, `None` when the text had no time part.
    pub(crate) fn time(&self) -> Result<Option<NaiveTime>, String> {
        let (Some(hour), Some(minute)) = (self.hour, self.minute) else {
            return Ok(None);
        };
        let second = self.second.unwrap_or(0);
        if hour > 23 || minute > 59 || second > 59 {
            return Err(format!(
                "time {hour:02}:{minute:02}:{second:02} out of range"
            ));
        }
        NaiveTime::from_hms_nano_opt(hour, minute, second, self.nano.unwrap_or(0))
            .map(Some)
            .ok_or_else(|| "fraction of second out of range".to_string())
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 31,
    }
}

/// Record a field, noting a conflict when it already holds a different value.
fn record<T: PartialEq + Copy>(
    slot: &mut Option<T>,
    value: T,
    conflict: &mut Option<&'static str>,
    name: &'static str,
) {
    match *slot {
        Some(existing) if existing != value => {
            conflict.get_or_insert(name);
        }
        _ => *slot = Some(value),
    }
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    fields: Fields,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            fields: Fields::default(),
        }
    }

    fn finish(self) -> Result<Fields, String> {
        if self.pos != self.bytes.len() {
            return Err(format!("unparsed text at index {}", self.pos));
        }
        if let Some(field) = self.fields.conflict {
            return Err(format!("conflicting values for {field}"));
        }
        Ok(self.fields)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Try `element`; on failure restore the position and the fields.
    fn optional(&mut self, element: impl FnOnce(&mut Self) -> Option<()>) {
        let (pos, fields) = (self.pos, self.fields);
        if element(self).is_none() {
            self.pos = pos;
            self.fields = fields;
        }
    }

    fn literal(&mut self, expected: u8) -> Option<()> {
        (self.peek()? == expected).then(|| self.pos += 1)
    }

    /// Exactly `width` digits.
    fn fixed_digits(&mut self, width: usize) -> Option<u32> {
        let digits = self.bytes.get(self.pos..self.pos + width)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos += width;
        Some(digits.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    }

    /// At least `min_width` digits, as many as available up to 19.
    fn greedy_digits(&mut self, min_width: usize) -> Option<u64> {
        let run = self.bytes[self.pos..]
            .iter()
            .take(19)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if run < min_width {
            return None;
        }
        let value = self.bytes[self.pos..self.pos + run]
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
        self.pos += run;
        Some(value)
    }

    fn separators(&mut self) {
        for separator in [b'-', b'/', b'.', b' '] {
            self.optional(|s| s.literal(separator));
        }
    }

    fn date(&mut self) {
        self.optional(|s| {
            let year = s.greedy_digits(4)? as i64;
            record(&mut s.fields.year_of_era, year, &mut s.fields.conflict, "year");
            Some(())
        });
        self.optional(|s| {
            let year = 2000 + i64::from(s.fixed_digits(2)?);
            record(&mut s.fields.year_of_era, year, &mut s.fields.conflict, "year");
            Some(())
        });
        self.separators();
        self.optional(|s| {
            let month = s.month_name()?;
            record(&mut s.fields.month, month, &mut s.fields.conflict, "month");
            Some(())
        });
        self.optional(|s| {
            let month = u64::from(s.fixed_digits(2)?);
            record(&mut s.fields.month, month, &mut s.fields.conflict, "month");
            Some(())
        });
        self.optional(|s| {
            let month = s.greedy_digits(1)?;
            record(&mut s.fields.month, month, &mut s.fields.conflict, "month");
            Some(())
        });
        self.separators();
        self.optional(|s| {
            let day = u64::from(s.fixed_digits(2)?);
            record(&mut s.fields.day, day, &mut s.fields.conflict, "day");
            Some(())
        });
        self.optional(|s| {
            let day = s.greedy_digits(1)?;
            record(&mut s.fields.day, day, &mut s.fields.conflict, "day");
            Some(())
        });
    }

    fn month_name(&mut self) -> Option<u64> {
        let rest = &self.bytes[self.pos..];
        let index = MONTH_ABBREVIATIONS
            .iter()
            .position(|name| rest.starts_with(name.as_bytes()))?;
        self.pos += 3;
        Some(index as u64 + 1)
    }

    /// `[[' '][G]]`
    fn era_suffix(&mut self) {
        self.optional(|s| {
            s.optional(|s| s.literal(b' '));
            s.optional(|s| {
                let rest = &s.bytes[s.pos..];
                let era = if rest.starts_with(b"AD") {
                    Era::Ad
                } else if rest.starts_with(b"BC") {
                    Era::Bc
                } else {
                    return None;
                };
                s.pos += 2;
                record(&mut s.fields.era, era, &mut s.fields.conflict, "era");
                Some(())
            });
            Some(())
        });
    }

    fn time_of_day(&mut self, with_era: bool) -> Option<()> {
        let hour = self.fixed_digits(2)?;
        self.literal(b':')?;
        let minute = self.fixed_digits(2)?;
        record(&mut self.fields.hour, hour, &mut self.fields.conflict, "hour");
        record(&mut self.fields.minute, minute, &mut self.fields.conflict, "minute");

        // Fraction and zone are only reachable once seconds are present.
        self.optional(|s| {
            s.literal(b':')?;
            let second = s.fixed_digits(2)?;
            record(&mut s.fields.second, second, &mut s.fields.conflict, "second");
            s.optional(|s| s.literal(b'.'));
            for width in [6usize, 5, 4, 3] {
                s.optional(|s| {
                    let fraction = s.fixed_digits(width)?;
                    let nano = fraction * 10u32.pow(9 - width as u32);
                    record(&mut s.fields.nano, nano, &mut s.fields.conflict, "fraction");
                    Some(())
                });
            }
            s.optional(|s| s.literal(b' '));
            s.optional(|s| {
                let zone = s.zone()?;
                record(&mut s.fields.zone, zone, &mut s.fields.conflict, "zone");
                Some(())
            });
            if with_era {
                s.era_suffix();
            }
            Some(())
        });
        Some(())
    }

    fn zone(&mut self) -> Option<Zone> {
        match self.peek()? {
            b'+' | b'-' => self.numeric_offset(false).map(Zone::Offset),
            b if b.is_ascii_alphabetic() => self.named_zone(),
            _ => None,
        }
    }

    /// `±HH`, `±HHmm` or `±HH:mm`; with `short_hours`, also `±H` (as in `GMT+8`).
    fn numeric_offset(&mut self, short_hours: bool) -> Option<FixedOffset> {
        let sign = match self.peek()? {
            b'+' => 1,
            b'-' => -1,
            _ => return None,
        };
        self.pos += 1;
        let hours = match self.fixed_digits(2) {
            Some(hours) => hours,
            None if short_hours => self.fixed_digits(1)?,
            None => return None,
        };

        let mut minutes = 0;
        let before_minutes = self.pos;
        if self.literal(b':').is_some() {
            match self.fixed_digits(2) {
                Some(m) => minutes = m,
                None => self.pos = before_minutes,
            }
        } else if let Some(m) = self.fixed_digits(2) {
            minutes = m;
        }

        if hours > MAX_OFFSET_HOURS || minutes > 59 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
    }

    fn named_zone(&mut self) -> Option<Zone> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            let continues = b.is_ascii_alphabetic()
                || b == b'_'
                || b == b'/'
                || (b == b'-'
                    && self
                        .bytes
                        .get(self.pos + 1)
                        .is_some_and(u8::is_ascii_alphabetic));
            if !continues {
                break;
            }
            self.pos += 1;
        }
        let input = self.input;
        let word = &input[start..self.pos];

        match word {
            "Z" => return Some(Zone::Offset(Utc.fix())),
            "UTC" | "GMT" | "UT" => {
                let before_offset = self.pos;
                let offset = self.numeric_offset(true).unwrap_or_else(|| {
                    self.pos = before_offset;
                    Utc.fix()
                });
                return Some(Zone::Offset(offset));
            }
            _ => {}
        }

        ZONE_ABBREVIATIONS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|&(_, tz)| Zone::Region(tz))
            .or_else(|| word.parse::<Tz>().ok().map(Zone::Region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn two_digit_year_is_in_the_2000s() {
        let fields = scan_date_time("99-12-31").unwrap();
        assert_eq!(fields.date().unwrap(), ymd(2099, 12, 31));
    }

    #[test]
    fn mixed_separators_in_declared_order() {
        assert_eq!(scan_date_time("2023-/01 15").unwrap().date().unwrap(), ymd(2023, 1, 15));
        // ' ' is tried after '-', so the reverse order leaves text unparsed.
        assert!(scan_date_time("2023 -01-15").is_err());
    }

    #[test]
    fn single_digit_month_and_day() {
        assert_eq!(scan_date_time("2023.1.5").unwrap().date().unwrap(), ymd(2023, 1, 5));
    }

    #[test]
    fn bc_era_counts_backwards_from_year_one() {
        let fields = scan_date_time("0044-03-15 BC").unwrap();
        assert_eq!(fields.date().unwrap(), ymd(-43, 3, 15));
    }

    #[test]
    fn day_past_month_end_is_clamped() {
        assert_eq!(scan_date_time("2023-02-30").unwrap().date().unwrap(), ymd(2023, 2, 28));
        assert_eq!(scan_date_time("2024-02-31").unwrap().date().unwrap(), ymd(2024, 2, 29));
        assert!(scan_date_time("2023-02-32").unwrap().date().is_err());
    }

    #[test]
    fn fraction_requires_three_to_six_digits() {
        let nano = |text: &str| scan_time(text).unwrap().time().unwrap().unwrap().nanosecond();
        assert_eq!(nano("10:00:00.123"), 123_000_000);
        assert_eq!(nano("10:00:00.1234"), 123_400_000);
        assert_eq!(nano("10:00:00.123456"), 123_456_000);
        assert!(scan_time("10:00:00.12").is_err());
        assert!(scan_time("10:00:00.1234567").is_err());
    }

    #[test]
    fn zone_requires_seconds() {
        assert!(scan_time("10:00:00Z").is_ok());
        assert!(scan_time("10:00Z").is_err());
    }

    #[test]
    fn numeric_offset_forms() {
        let offset = |text: &str| match scan_time(text).unwrap().zone {
            Some(Zone::Offset(o)) => o.local_minus_utc(),
            other => panic!("expected an offset, got {other:?}"),
        };
        assert_eq!(offset("10:00:00+05:30"), 5 * 3600 + 30 * 60);
        assert_eq!(offset("10:00:00+0530"), 5 * 3600 + 30 * 60);
        assert_eq!(offset("10:00:00-08"), -8 * 3600);
        assert_eq!(offset("10:00:00 GMT+8"), 8 * 3600);
        assert_eq!(offset("10:00:00 UTC"), 0);
        assert!(scan_time("10:00:00+19:00").is_err());
    }

    #[test]
    fn named_zones_resolve_to_regions() {
        let fields = scan_time("10:00:00 PST").unwrap();
        assert_eq!(fields.zone, Some(Zone::Region(Tz::America__Los_Angeles)));
        let fields = scan_date_time("2023-01-15T10:00:00 Europe/Berlin").unwrap();
        assert_eq!(fields.zone, Some(Zone::Region(Tz::Europe__Berlin)));
        assert!(scan_time("10:00:00 Mars/Olympus").is_err());
    }

    #[test]
    fn conflicting_fields_fail_the_scan() {
        // [.] is optional, so "123456789" reads as SSSSSS=123456 then SSS=789.
        assert!(scan_time("10:00:00.123456789").is_err());
    }

    #[test]
    fn abandoned_time_section_leaves_text_unparsed() {
        assert!(scan_date_time("2023-01-15T10").is_err());
    }
}
