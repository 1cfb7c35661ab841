/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::error::FtpListParseError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub(super) fn unix_month(s: &str) -> Option<u32> {
    if s.len() != 3 {
        return None;
    }
    let s = s.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == s)
        .map(|i| i as u32 + 1)
}

/// Parse the `Mon DD HH:MM` or `Mon DD YYYY` fields of `ls -l`.
///
/// Without a year the entry is assumed to be from the past 12 months.
pub(super) fn parse_unix(
    month: u32,
    day: &str,
    time_or_year: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, FtpListParseError> {
    let day: u32 = day.parse().map_err(|_| FtpListParseError::NoTimeField)?;

    if time_or_year.contains(':') {
        let time = NaiveTime::parse_from_str(time_or_year, "%H:%M")?;
        let mut year = now.year();
        let tomorrow = now.date_naive() + TimeDelta::days(1);
        if tomorrow.year() == year && (month, day) > (tomorrow.month(), tomorrow.day()) {
            year -= 1;
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(FtpListParseError::NoTimeField)?;
        Ok(NaiveDateTime::new(date, time).and_utc())
    } else {
        let year: i32 = time_or_year
            .parse()
            .map_err(|_| FtpListParseError::NoTimeField)?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(FtpListParseError::NoTimeField)?;
        Ok(NaiveDateTime::new(date, NaiveTime::MIN).and_utc())
    }
}

/// Parse the `MM-DD-YY HH:MMAM` fields of a DOS style listing.
pub(super) fn parse_dos(date: &str, time: &str) -> Result<DateTime<Utc>, FtpListParseError> {
    let year_len = date.rsplit('-').next().map(str::len).unwrap_or_default();
    let date = if year_len == 4 {
        NaiveDate::parse_from_str(date, "%m-%d-%Y")?
    } else {
        NaiveDate::parse_from_str(date, "%m-%d-%y")?
    };
    let time = NaiveTime::parse_from_str(time, "%I:%M%p")?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}
