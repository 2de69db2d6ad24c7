//! Lenient field decoders for backend records.
//!
//! The backend serialises pandas rows, so effect flags arrive as booleans,
//! 0/1 numbers or `"True"`/`"False"` strings, and gridpoint ids arrive as
//! strings or numbers depending on the source CSV.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawFlag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(RawFlag::Bool(b)) => Ok(b),
        Some(RawFlag::Int(i)) => Ok(i != 0),
        Some(RawFlag::Float(f)) => Ok(f != 0.0),
        Some(RawFlag::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid effect flag '{}'", other))),
        },
    }
}

pub(crate) fn gridpoint_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Text(s) => Ok(s.trim().to_string()),
        RawId::Int(i) => Ok(i.to_string()),
        RawId::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(format!("{}", f as i64)),
        RawId::Float(f) => Ok(f.to_string()),
    }
}

/// Missing, null and blank strings all decode to `None`.
pub(crate) fn optional_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
