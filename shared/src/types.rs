//! Common types used across the platform

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Skip/limit paging for history queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Paging {
    pub limit: i64,
    pub skip: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            limit: 100,
            skip: 0,
        }
    }
}

/// Inclusive time range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Parse a timestamp in any of the formats clients send
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) and `YYYY-MM-DD`.
pub fn parse_flexible_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for timestamps written by hand-made clients and CSV tools
pub mod flexible_datetime {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_flexible_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("unable to parse time: {}", raw)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&v.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => parse_flexible_datetime(s)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("unable to parse time: {}", s))),
            }
        }
    }
}
