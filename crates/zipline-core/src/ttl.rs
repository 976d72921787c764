use crate::error::ValidateError;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Recognized time-to-live classes for a short link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtlClass {
    OneHour,
    OneDay,
    OneWeek,
    Never,
}

impl TtlClass {
    /// The lifetime this class grants, or `None` for `Never`.
    pub fn duration(self) -> Option<SignedDuration> {
        match self {
            TtlClass::OneHour => Some(SignedDuration::from_hours(1)),
            TtlClass::OneDay => Some(SignedDuration::from_hours(24)),
            TtlClass::OneWeek => Some(SignedDuration::from_hours(24 * 7)),
            TtlClass::Never => None,
        }
    }

    /// Computes the expiry instant for a record created at `now`.
    pub fn expires_at(self, now: Timestamp) -> Option<Timestamp> {
        self.duration().map(|duration| now + duration)
    }
}

impl FromStr for TtlClass {
    type Err = ValidateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "1h" => Ok(TtlClass::OneHour),
            "24h" | "1d" => Ok(TtlClass::OneDay),
            "1w" => Ok(TtlClass::OneWeek),
            "never" => Ok(TtlClass::Never),
            other => Err(ValidateError::InvalidTtl(other.to_string())),
        }
    }
}

impl Display for TtlClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TtlClass::OneHour => "1h",
            TtlClass::OneDay => "1d",
            TtlClass::OneWeek => "1w",
            TtlClass::Never => "never",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_values_parse() {
        assert_eq!("1h".parse::<TtlClass>().unwrap(), TtlClass::OneHour);
        assert_eq!("24h".parse::<TtlClass>().unwrap(), TtlClass::OneDay);
        assert_eq!("1d".parse::<TtlClass>().unwrap(), TtlClass::OneDay);
        assert_eq!("1w".parse::<TtlClass>().unwrap(), TtlClass::OneWeek);
        assert_eq!("never".parse::<TtlClass>().unwrap(), TtlClass::Never);
    }

    #[test]
    fn unrecognized_values_fail() {
        for raw in ["2h", "1 h", "forever", "", "1H"] {
            assert!(
                matches!(raw.parse::<TtlClass>(), Err(ValidateError::InvalidTtl(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn never_has_no_expiry() {
        let now = Timestamp::from_second(0).unwrap();
        assert_eq!(TtlClass::Never.expires_at(now), None);
    }

    #[test]
    fn expiry_is_relative_to_creation() {
        let now = Timestamp::from_second(10_000).unwrap();
        assert_eq!(
            TtlClass::OneHour.expires_at(now),
            Some(now + SignedDuration::from_hours(1))
        );
        assert_eq!(
            TtlClass::OneWeek.expires_at(now),
            Some(now + SignedDuration::from_hours(168))
        );
    }
}
