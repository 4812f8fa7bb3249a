//! Record shapes stored in the warehouse.
//!
//! The warehouse schema owns typing and integrity; these structs only shape
//! rows for tool results. Skills are stored as one comma-joined string and
//! exposed as an ordered list.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Date format used for training dates on the wire and in the warehouse.
pub const TRAINING_DATE_FORMAT: &str = "%Y-%m-%d";

/// DATETIME renderings accepted for a training date. Only the date is kept.
const TRAINING_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeProfile {
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub email: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub department: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub role: String,
    #[serde(deserialize_with = "skills_from_csv", default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingRecord {
    #[serde(default, deserialize_with = "string_or_null")]
    pub email: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub skills: String,
    /// NULL in the warehouse stays `None` and is rendered as JSON null.
    #[serde(
        default,
        serialize_with = "date_to_string",
        deserialize_with = "date_from_warehouse"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectPortfolioEntry {
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub customer: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub customer_profile: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub customer_location: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub skills_needed: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub status: String,
}

/// Split a comma-joined skills string into trimmed, ordered entries.
///
/// Empty segments are dropped, so `""` yields an empty list.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a training date as returned by the warehouse.
///
/// DATE columns come back as `YYYY-MM-DD`. DATETIME and TIMESTAMP renderings
/// carry a time after `T` or a space; the time is dropped. Anything else
/// trailing the date is rejected.
pub fn parse_training_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, TRAINING_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    TRAINING_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
}

pub fn format_training_date(date: &NaiveDate) -> String {
    date.format(TRAINING_DATE_FORMAT).to_string()
}

fn skills_from_csv<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Skills {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Skills>::deserialize(deserializer)? {
        Some(Skills::Joined(raw)) => parse_skills(&raw),
        Some(Skills::List(list)) => list.into_iter().map(|s| s.trim().to_string()).collect(),
        None => Vec::new(),
    })
}

/// NULL columns come back as JSON null; treat them as empty text.
fn string_or_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn date_from_warehouse<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_training_date(&raw).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid training date '{}'", raw))
        }),
        None => Ok(None),
    }
}

fn date_to_string<S>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&format_training_date(date)),
        None => serializer.serialize_none(),
    }
}
