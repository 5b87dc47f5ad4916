//! Summary figures over a set of records.

use crate::model::Record;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals of a record set. `positive - negative == net` holds exactly because all arithmetic is
/// decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    /// Sum of the amounts that are zero or greater.
    pub positive: Decimal,
    /// Sum of the absolute values of the amounts below zero.
    pub negative: Decimal,
    pub net: Decimal,
}

/// Reduces `records` into a `Summary`. A record without an amount is counted but adds nothing.
pub fn summarize<'a, R>(records: impl IntoIterator<Item = &'a R>) -> Summary
where
    R: Record + 'a,
{
    let mut summary = Summary::default();
    for record in records {
        summary.count += 1;
        if let Some(amount) = record.amount() {
            if amount.is_sign_negative() && !amount.is_zero() {
                summary.negative += amount.abs();
            } else {
                summary.positive += amount;
            }
            summary.net += amount;
        }
    }
    summary
}

/// `part` as a percentage of `whole`. A zero `whole` yields zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part * Decimal::ONE_HUNDRED / whole
    }
}

/// Number of records and sum of their amounts for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Group {
    pub count: usize,
    pub total: Decimal,
}

/// Groups `records` by `key`, ordered by key. Records without a key go under `placeholder`.
pub fn group_by<'a, R, F>(
    records: impl IntoIterator<Item = &'a R>,
    key: F,
    placeholder: &str,
) -> BTreeMap<String, Group>
where
    R: Record + 'a,
    F: Fn(&R) -> Option<String>,
{
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for record in records {
        let group = groups
            .entry(key(record).unwrap_or_else(|| placeholder.to_string()))
            .or_default();
        group.count += 1;
        group.total += record.amount().unwrap_or_default();
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Transaction};

    fn tx(amount: Option<i64>, account: Option<&str>) -> Transaction {
        Transaction {
            amount: amount.map(|a| Amount::new(Decimal::from(a))),
            account_id: account.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_three_records() {
        let records = vec![
            tx(Some(100), None),
            tx(Some(-40), None),
            tx(Some(25), None),
        ];
        let s = summarize(&records);
        assert_eq!(s.positive, Decimal::from(125));
        assert_eq!(s.negative, Decimal::from(40));
        assert_eq!(s.net, Decimal::from(85));
        assert_eq!(s.count, 3);
    }

    #[test]
    fn test_empty_set() {
        let records: Vec<Transaction> = Vec::new();
        let s = summarize(&records);
        assert_eq!(s, Summary::default());
        assert_eq!(s.positive - s.negative, s.net);
    }

    #[test]
    fn test_positive_minus_negative_is_net() {
        let amounts = ["0.1", "-0.2", "0.3", "-1234.56", "999.99", "0", "-0.01"];
        let records: Vec<Transaction> = amounts
            .iter()
            .map(|a| Transaction {
                amount: Some(a.parse().unwrap()),
                ..Default::default()
            })
            .collect();
        for n in 0..=records.len() {
            let s = summarize(&records[..n]);
            assert_eq!(s.positive - s.negative, s.net, "prefix of {n}");
        }
    }

    #[test]
    fn test_missing_amount_counts_only() {
        let records = vec![tx(None, None), tx(Some(-5), None)];
        let s = summarize(&records);
        assert_eq!(s.count, 2);
        assert_eq!(s.net, Decimal::from(-5));
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent_of(Decimal::from(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_of(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(
            percent_of(Decimal::from(1), Decimal::from(4)),
            Decimal::from(25)
        );
    }

    #[test]
    fn test_group_by_with_placeholder() {
        let records = vec![
            tx(Some(10), Some("2")),
            tx(Some(-4), None),
            tx(Some(5), Some("2")),
        ];
        let groups = group_by(&records, |t| t.account_id.clone(), "ohne");
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["2"],
            Group {
                count: 2,
                total: Decimal::from(15)
            }
        );
        assert_eq!(groups["ohne"].total, Decimal::from(-4));
    }
}
