use std::fmt;

use serde::{Deserialize, Serialize};

pub const DAY_KEY_LEN: usize = 10;

/// Calendar day a session is pinned to, stored as `YYYY-MM-DD`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(String);

impl DayKey {
    pub fn parse(value: &str) -> Result<Self, DayKeyError> {
        let value = value.trim();
        if value.len() != DAY_KEY_LEN {
            return Err(DayKeyError::InvalidLength {
                expected: DAY_KEY_LEN,
                found: value.len(),
            });
        }
        for (idx, ch) in value.chars().enumerate() {
            let separator = idx == 4 || idx == 7;
            if separator && ch != '-' {
                return Err(DayKeyError::InvalidCharacter { ch, index: idx });
            }
            if !separator && !ch.is_ascii_digit() {
                return Err(DayKeyError::InvalidCharacter { ch, index: idx });
            }
        }
        let year = value[0..4].parse::<i32>().unwrap_or_default();
        let month = value[5..7].parse::<u32>().unwrap_or_default();
        let day = value[8..10].parse::<u32>().unwrap_or_default();
        Self::from_ymd(year, month, day)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DayKeyError> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(DayKeyError::OutOfRange { year, month, day });
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(DayKeyError::OutOfRange { year, month, day });
        }
        Ok(Self(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for DayKey {
    type Error = DayKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DayKey> for String {
    fn from(value: DayKey) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DayKeyError {
    #[error("day key must be {expected} chars, got {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
    #[error("{year:04}-{month:02}-{day:02} is not a calendar day")]
    OutOfRange { year: i32, month: u32, day: u32 },
}
