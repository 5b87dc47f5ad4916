//! Display formatting in the portal's locale (de-DE). Every function has a fixed rendering for a
//! missing value so that markup never shows `undefined` or `null`.

use crate::model::amount::group_digits;
use crate::model::Amount;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

/// Placeholder for missing text and dates.
pub const MISSING: &str = "-";

/// `1.234,56 €`; missing renders as `0,00 €`.
pub fn currency(value: Option<Decimal>) -> String {
    Amount::new(value.unwrap_or_default()).to_string()
}

/// Grouped digits, `1.234`; missing renders as `0`.
pub fn count(value: Option<i64>) -> String {
    group_digits(Decimal::from(value.unwrap_or_default()), 0)
}

/// Grouped digits for collection sizes.
pub fn count_usize(value: usize) -> String {
    group_digits(Decimal::from(value), 0)
}

/// A decimal quantity such as working days: no fraction when whole, otherwise one decimal.
pub fn quantity(value: Option<Decimal>) -> String {
    let rounded = value
        .unwrap_or_default()
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    if rounded.fract().is_zero() {
        group_digits(rounded, 0)
    } else {
        format!("{rounded:.1}").replace('.', ",")
    }
}

/// `12,3%` with one decimal.
pub fn percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}%").replace('.', ",")
}

/// `20.10.2025`; missing renders as `-`.
pub fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// `20.10.2025 14:05`
pub fn timestamp(value: NaiveDateTime) -> String {
    value.format("%d.%m.%Y %H:%M").to_string()
}

/// The text itself, or `-` when missing.
pub fn text(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

/// Shows only the last four characters of an IBAN: `•••• 1234`. Short values are shown as-is.
pub fn masked_iban(iban: Option<&str>) -> String {
    match iban {
        None => MISSING.to_string(),
        Some(s) if s.chars().count() <= 8 => s.to_string(),
        Some(s) => {
            let tail: String = s
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("•••• {tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_missing_values_use_placeholders() {
        assert_eq!(currency(None), "0,00 €");
        assert_eq!(count(None), "0");
        assert_eq!(date(None), "-");
        assert_eq!(text(None), "-");
        assert_eq!(masked_iban(None), "-");
    }

    #[test]
    fn test_count_grouping() {
        assert_eq!(count(Some(1234567)), "1.234.567");
        assert_eq!(count_usize(120), "120");
        assert_eq!(count(Some(-4500)), "-4.500");
    }

    #[test]
    fn test_currency() {
        assert_eq!(currency(Some(Decimal::from(85))), "85,00 €");
        assert_eq!(
            currency(Some(Decimal::from_str("-142.675").unwrap())),
            "-142,68 €"
        );
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity(Some(Decimal::from(5))), "5");
        assert_eq!(quantity(Some(Decimal::from_str("2.50").unwrap())), "2,5");
        assert_eq!(quantity(None), "0");
        assert_eq!(quantity(Some(Decimal::from_str("2.96").unwrap())), "3");
        assert_eq!(quantity(Some(Decimal::from_str("-0.04").unwrap())), "0");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(Decimal::from_str("12.345").unwrap()), "12,3%");
        assert_eq!(percent(Decimal::ZERO), "0,0%");
    }

    #[test]
    fn test_date() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7);
        assert_eq!(date(d), "07.03.2025");
    }

    #[test]
    fn test_masked_iban() {
        assert_eq!(
            masked_iban(Some("DE89370400440532013000")),
            "•••• 3000"
        );
        assert_eq!(masked_iban(Some("DE12")), "DE12");
    }
}
