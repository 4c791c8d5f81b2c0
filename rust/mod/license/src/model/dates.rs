//! Date normalization at the wire boundary.
//!
//! The service is inconsistent about dates: the same field may arrive as
//! `"2025-03-01"`, as `"2025-03-01T09:30:00.000Z"`, or as epoch
//! milliseconds. Everything is normalized during deserialization so a
//! cached record only ever holds one representation:
//!
//! - calendar fields → [`NaiveDate`], written back as `YYYY-MM-DD`
//! - instants → [`DateTime<Utc>`], written back as RFC 3339

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Millis(i64),
    Text(String),
}

/// Parse any accepted representation as a calendar date.
pub fn parse_calendar(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(d);
    }
    parse_instant(s).map(|dt| dt.date_naive())
}

/// Parse any accepted representation as a UTC instant.
///
/// A bare date is taken as midnight UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn raw_to_instant<E: serde::de::Error>(raw: Raw) -> Result<DateTime<Utc>, E> {
    match raw {
        Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
        Raw::Text(s) => parse_instant(&s).ok_or_else(|| E::custom(format!("invalid timestamp: {s}"))),
    }
}

fn raw_to_calendar<E: serde::de::Error>(raw: Raw) -> Result<NaiveDate, E> {
    match raw {
        Raw::Millis(_) => raw_to_instant(raw).map(|dt| dt.date_naive()),
        Raw::Text(s) => parse_calendar(&s).ok_or_else(|| E::custom(format!("invalid date: {s}"))),
    }
}

/// `#[serde(with = "dates::calendar")]`
pub mod calendar {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        raw_to_calendar(Raw::deserialize(d)?)
    }
}

/// `#[serde(with = "dates::instant")]`
pub mod instant {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        raw_to_instant(Raw::deserialize(d)?)
    }
}

/// `#[serde(default, with = "dates::option_instant")]`: `null`, missing
/// and empty strings all become `None`.
pub mod option_instant {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_some(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(None),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(raw) => raw_to_instant(raw).map(Some),
        }
    }
}
