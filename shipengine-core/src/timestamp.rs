use crate::error::{ErrorCode, Result, ShipEngineError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An ISO-8601 timestamp as sent by the API.
///
/// Carrier tracking events sometimes arrive without an offset, so both zoned
/// and local forms are accepted. The original text is kept for display and
/// re-serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoTimestamp {
    raw: String,
    value: Moment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moment {
    Zoned(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl IsoTimestamp {
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let value = parse_moment(trimmed).ok_or_else(|| {
            ShipEngineError::validation(
                format!("'{}' is not a valid ISO 8601 timestamp.", text),
                ErrorCode::InvalidFieldValue,
            )
        })?;
        Ok(IsoTimestamp {
            raw: trimmed.to_string(),
            value,
        })
    }

    pub fn has_timezone(&self) -> bool {
        matches!(self.value, Moment::Zoned(_))
    }

    /// The instant in UTC, only defined when the timestamp carries an offset.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self.value {
            Moment::Zoned(at) => Some(at.with_timezone(&Utc)),
            Moment::Local(_) => None,
        }
    }

    /// Wall-clock time, ignoring any offset.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self.value {
            Moment::Zoned(at) => at.naive_local(),
            Moment::Local(at) => at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_moment(text: &str) -> Option<Moment> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(Moment::Zoned(at));
    }
    if let Some(at) = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(Moment::Local(at));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Moment::Local)
}

impl fmt::Display for IsoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for IsoTimestamp {
    type Err = ShipEngineError;

    fn from_str(s: &str) -> Result<Self> {
        IsoTimestamp::parse(s)
    }
}

impl Serialize for IsoTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for IsoTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        IsoTimestamp::parse(&text).map_err(serde::de::Error::custom)
    }
}
