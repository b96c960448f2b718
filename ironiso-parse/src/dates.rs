/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Date reconstruction for the year-less wire formats.
//!
//! DATE10 and DATE4 carry no year. The year is taken from the reference
//! instant (the local clock in production); when the resulting date lands
//! more than six months in the future it is rolled back one year, which
//! handles December transactions parsed in early January.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

/// Parses two ASCII digits of `raw` starting at `at`.
fn two_digits(raw: &str, at: usize) -> Option<u32> {
    let bytes = raw.as_bytes();
    let hi = *bytes.get(at)?;
    let lo = *bytes.get(at + 1)?;
    if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
        return None;
    }
    Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
}

/// Applies the six-month rollback rule.
fn roll_back_if_future(candidate: NaiveDateTime, reference: NaiveDateTime) -> NaiveDateTime {
    match reference.checked_add_months(Months::new(6)) {
        Some(limit) if candidate > limit => candidate
            .with_year(candidate.year() - 1)
            .unwrap_or(candidate),
        _ => candidate,
    }
}

/// Parses `MMddHHmmss` against the reference year.
pub(crate) fn parse_date10(raw: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let month = two_digits(raw, 0)?;
    let day = two_digits(raw, 2)?;
    let hour = two_digits(raw, 4)?;
    let minute = two_digits(raw, 6)?;
    let second = two_digits(raw, 8)?;
    let candidate = NaiveDate::from_ymd_opt(reference.year(), month, day)?
        .and_hms_opt(hour, minute, second)?;
    Some(roll_back_if_future(candidate, reference))
}

/// Parses `MMdd` against the reference year, at midnight.
pub(crate) fn parse_date4(raw: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let month = two_digits(raw, 0)?;
    let day = two_digits(raw, 2)?;
    let candidate = NaiveDate::from_ymd_opt(reference.year(), month, day)?.and_hms_opt(0, 0, 0)?;
    Some(roll_back_if_future(candidate, reference))
}

/// Parses a `yyMM` card expiry within the reference century. Expiry dates
/// are forward-looking and never roll back.
pub(crate) fn parse_date_exp(raw: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let year = two_digits(raw, 0)?;
    let month = two_digits(raw, 2)?;
    let century = reference.year() - reference.year() % 100;
    let resolved = century + year as i32;
    NaiveDate::from_ymd_opt(resolved, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Parses `HHmmss` on the reference date.
pub(crate) fn parse_time(raw: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let hour = two_digits(raw, 0)?;
    let minute = two_digits(raw, 2)?;
    let second = two_digits(raw, 4)?;
    reference.date().and_hms_opt(hour, minute, second)
}
