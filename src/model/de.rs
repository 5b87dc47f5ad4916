//! Lenient deserializers for backend fields. The portal is not consistent about whether numbers
//! arrive as JSON numbers or strings, or which date format a field uses, so these accept every
//! shape we have seen and map anything empty to `None`.

use crate::model::Amount;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(serde_json::Number),
    Text(String),
}

/// Deserializes an optional decimal from a JSON number, a numeric string, or null.
pub(crate) fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawNumber::Number(n)) => number_to_decimal(&n)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("number out of range: {n}"))),
        Some(RawNumber::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawNumber::Text(s)) => Amount::from_str(&s)
            .map(|a| Some(a.value()))
            .map_err(serde::de::Error::custom),
    }
}

/// `opt_decimal` wrapped into an `Amount`.
pub(crate) fn opt_amount<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_decimal(deserializer)?.map(Amount::new))
}

/// Deserializes an optional integer, accepting the same shapes as `opt_decimal`. Fractional values
/// are truncated.
pub(crate) fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use rust_decimal::prelude::ToPrimitive;
    let value = opt_decimal(deserializer)?;
    Ok(value.and_then(|d| d.trunc().to_i64()))
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    let s = n.to_string();
    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
}

/// Deserializes an optional date. Accepts `2025-10-20`, ISO date-times, RFC 3339 and the RFC 2822
/// form Flask emits (`Mon, 20 Oct 2025 00:00:00 GMT`). Empty or unrecognized values become `None`
/// and are treated as unknown by the filter and sort code.
pub(crate) fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
        return Some(d);
    }
    tracing::trace!("Unrecognized date '{s}', treating it as unknown");
    None
}

/// Deserializes `T`, mapping `null` to `T::default()`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a string that may be absent, null or blank into `Option<String>`.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }
    let raw = Option::<RawText>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawText::Text(s)) if s.trim().is_empty() => None,
        Some(RawText::Text(s)) => Some(s),
        Some(RawText::Number(n)) => Some(n.to_string()),
        Some(RawText::Flag(b)) => Some(b.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "opt_decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "opt_date")]
        date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "opt_text")]
        text: Option<String>,
        #[serde(default, deserialize_with = "opt_int")]
        days: Option<i64>,
    }

    fn row(json: &str) -> Row {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decimal_from_number_and_string() {
        assert_eq!(row(r#"{"amount": -40.5}"#).amount, Some(Decimal::new(-405, 1)));
        assert_eq!(row(r#"{"amount": "125"}"#).amount, Some(Decimal::from(125)));
        assert_eq!(row(r#"{"amount": null}"#).amount, None);
        assert_eq!(row(r#"{"amount": ""}"#).amount, None);
        assert_eq!(row(r#"{}"#).amount, None);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let result = serde_json::from_str::<Row>(r#"{"amount": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 20);
        assert_eq!(row(r#"{"date": "2025-10-20"}"#).date, expected);
        assert_eq!(row(r#"{"date": "2025-10-20T08:15:00"}"#).date, expected);
        assert_eq!(row(r#"{"date": "2025-10-20T08:15:00+02:00"}"#).date, expected);
        assert_eq!(
            row(r#"{"date": "Mon, 20 Oct 2025 00:00:00 GMT"}"#).date,
            expected
        );
        assert_eq!(row(r#"{"date": "20.10.2025"}"#).date, expected);
    }

    #[test]
    fn test_date_unknown() {
        assert_eq!(row(r#"{"date": null}"#).date, None);
        assert_eq!(row(r#"{"date": ""}"#).date, None);
        assert_eq!(row(r#"{"date": "sometime"}"#).date, None);
    }

    #[test]
    fn test_text_blank_is_none() {
        assert_eq!(row(r#"{"text": "  "}"#).text, None);
        assert_eq!(row(r#"{"text": 42}"#).text.as_deref(), Some("42"));
        assert_eq!(row(r#"{"text": "Miete"}"#).text.as_deref(), Some("Miete"));
    }

    #[test]
    fn test_int_truncates() {
        assert_eq!(row(r#"{"days": 12.5}"#).days, Some(12));
        assert_eq!(row(r#"{"days": "7"}"#).days, Some(7));
    }
}
