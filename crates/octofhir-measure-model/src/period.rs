//! Measurement period parsing

use crate::fhir::Period;
use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive measurement period at day precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Period parsing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PeriodError {
    #[error("Invalid date '{0}': expected YYYY, YYYY-MM, YYYY-MM-DD or a date-time")]
    InvalidDate(String),

    #[error("Period start {start} is after period end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

impl MeasurementPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse `periodStart` / `periodEnd` operation parameters
    ///
    /// Partial dates widen to the whole year or month they name.
    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        Self::new(parse_boundary(start, Boundary::Start)?, parse_boundary(end, Boundary::End)?)
    }

    pub fn to_fhir(&self) -> Period {
        Period {
            start: Some(self.start.format("%Y-%m-%d").to_string()),
            end: Some(self.end.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for MeasurementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Start,
    End,
}

fn parse_boundary(value: &str, boundary: Boundary) -> Result<NaiveDate, PeriodError> {
    let invalid = || PeriodError::InvalidDate(value.to_string());
    let value = value.trim();

    if value.len() > 10 {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
            return Ok(datetime.date_naive());
        }
        // Local date-times without an offset still carry a usable date part
        return value
            .get(..10)
            .filter(|_| value.as_bytes().get(10) == Some(&b'T'))
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .ok_or_else(invalid);
    }

    let parts: Vec<&str> = value.split('-').collect();
    let number = |s: &str, len: usize| -> Option<u32> {
        (s.len() == len && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse().ok())
            .flatten()
    };

    match parts.as_slice() {
        [year] => {
            let year = number(*year, 4).ok_or_else(invalid)? as i32;
            let (month, day) = match boundary {
                Boundary::Start => (1, 1),
                Boundary::End => (12, 31),
            };
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
        }
        [year, month] => {
            let year = number(*year, 4).ok_or_else(invalid)? as i32;
            let month = number(*month, 2).ok_or_else(invalid)?;
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            match boundary {
                Boundary::Start => Ok(first),
                Boundary::End => last_day_of_month(first).ok_or_else(invalid),
            }
        }
        [year, month, day] => {
            let year = number(*year, 4).ok_or_else(invalid)? as i32;
            let month = number(*month, 2).ok_or_else(invalid)?;
            let day = number(*day, 2).ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
