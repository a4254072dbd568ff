//! Partial ISO 8601 dates.
//!
//! Clinical datasets carry dates at whatever precision was collected:
//! `2021`, `2021-03`, `2021-03-15`, `2021-03-15T12:30:45`. A partial date
//! parses into whichever leading components are present; a comparison on a
//! component either side lacks is false.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use clinrules_common::RuleError;

static ISO_PARTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:[T ](\d{2})(?::(\d{2})(?::(\d{2})(?:\.\d{1,9})?)?)?(?:Z|[+-]\d{2}:?\d{2})?)?)?)?$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl PartialDate {
    /// Parse a (possibly partial) ISO 8601 date. Components must be in
    /// range; a day is checked against the actual month length.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = ISO_PARTIAL.captures(text.trim())?;
        let year: i32 = caps[1].parse().ok()?;
        let group = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let (month, day) = (group(2), group(3));
        let (hour, minute, second) = (group(4), group(5), group(6));

        if let Some(m) = month {
            if !(1..=12).contains(&m) {
                return None;
            }
        }
        if let Some(d) = day {
            NaiveDate::from_ymd_opt(year, month?, d)?;
        }
        if hour.is_some_and(|h| h > 23)
            || minute.is_some_and(|m| m > 59)
            || second.is_some_and(|s| s > 60)
        {
            return None;
        }

        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// A date is complete when year, month and day are all present.
    pub fn is_complete(&self) -> bool {
        self.day.is_some()
    }

    pub fn component(&self, component: DateComponent) -> Option<i64> {
        match component {
            DateComponent::Year => Some(i64::from(self.year)),
            DateComponent::Month => self.month.map(i64::from),
            DateComponent::Day => self.day.map(i64::from),
            DateComponent::Hour => self.hour.map(i64::from),
            DateComponent::Minute => self.minute.map(i64::from),
            DateComponent::Second => self.second.map(i64::from),
        }
    }
}

/// The date sub-field a date comparison operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComponent {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateComponent {
    pub fn parse(token: &str) -> Result<Self, RuleError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            "second" => Ok(Self::Second),
            other => Err(RuleError::precondition(format!(
                "unknown date component `{other}`"
            ))),
        }
    }
}
