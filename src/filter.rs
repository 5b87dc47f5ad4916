//! The filter predicates applied to a view's collection.

use crate::model::Record;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Keeps income (amount zero or greater) or expenses (amount below zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Direction);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

serde_plain::derive_display_from_serialize!(Status);

/// The current values of all filter controls. Every field is optional and `None` passes every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Earliest date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
    pub query: Option<String>,
    pub direction: Option<Direction>,
    pub status: Option<Status>,
}

impl FilterState {
    /// The query lowercased, or `None` if blank.
    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.category.is_none()
            && self.needle().is_none()
            && self.direction.is_none()
            && self.status.is_none()
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.matches_with(record, self.needle().as_deref())
    }

    fn matches_with<R: Record>(&self, record: &R, needle: Option<&str>) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let Some(date) = record.date() else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if record.category().as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(direction) = self.direction {
            let amount = record.amount().unwrap_or_default();
            let income = !(amount.is_sign_negative() && amount != Decimal::ZERO);
            if income != (direction == Direction::Income) {
                return false;
            }
        }

        if let Some(status) = self.status {
            match record.is_active() {
                Some(active) if active == (status == Status::Active) => {}
                _ => return false,
            }
        }

        if let Some(needle) = needle {
            let found = record
                .search_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle));
            if !found {
                return false;
            }
        }

        true
    }
}

/// Applies `state` to the full collection and returns the matching records in display order.
pub fn filter<'a, R: Record>(records: &'a [R], state: &FilterState) -> Vec<&'a R> {
    let needle = state.needle();
    let mut kept: Vec<&R> = records
        .iter()
        .filter(|r| state.matches_with(*r, needle.as_deref()))
        .collect();
    kept.sort_by(|a, b| R::display_order(a, b));
    tracing::debug!("Filter kept {} of {} records", kept.len(), records.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Amount, Transaction};

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 10, d)
    }

    fn tx(id: &str, day: Option<u32>, amount: i64, account: &str, purpose: Option<&str>) -> Transaction {
        Transaction {
            id: Some(id.into()),
            booking_date: day.and_then(date),
            amount: Some(Amount::new(Decimal::from(amount))),
            account_id: Some(account.into()),
            purpose: purpose.map(str::to_string),
            ..Default::default()
        }
    }

    fn records() -> Vec<Transaction> {
        vec![
            tx("a", Some(1), 100, "1", Some("Miete Oktober")),
            tx("b", Some(10), -40, "2", Some("Tankstelle")),
            tx("c", Some(20), 25, "1", None),
            tx("d", None, -5, "1", Some("Gebühr MIETE")),
        ]
    }

    fn ids(kept: &[&Transaction]) -> Vec<String> {
        kept.iter().map(|t| t.id()).collect()
    }

    #[test]
    fn test_empty_state_passes_all_in_display_order() {
        let r = records();
        let state = FilterState::default();
        assert!(state.is_empty());
        assert_eq!(ids(&filter(&r, &state)), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let r = records();
        let state = FilterState {
            from: date(1),
            to: date(10),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&r, &state)), vec!["b", "a"]);
    }

    #[test]
    fn test_missing_date_excluded_by_range() {
        let r = records();
        let state = FilterState {
            to: date(31),
            ..Default::default()
        };
        assert!(!ids(&filter(&r, &state)).contains(&"d".to_string()));
    }

    #[test]
    fn test_search_is_case_insensitive_and_skips_missing() {
        let r = records();
        let state = FilterState {
            query: Some("miete".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&r, &state)), vec!["a", "d"]);
    }

    #[test]
    fn test_blank_query_is_inactive() {
        let r = records();
        let state = FilterState {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert!(state.is_empty());
        assert_eq!(filter(&r, &state).len(), 4);
    }

    #[test]
    fn test_conjunction() {
        let r = records();
        let state = FilterState {
            category: Some("1".into()),
            direction: Some(Direction::Expense),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&r, &state)), vec!["d"]);
    }

    #[test]
    fn test_direction_income_includes_zero() {
        let mut r = records();
        r.push(tx("z", Some(5), 0, "3", None));
        let state = FilterState {
            direction: Some(Direction::Income),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&r, &state)), vec!["c", "z", "a"]);
    }

    #[test]
    fn test_changing_a_field_recomputes_from_full_set() {
        let r = records();
        let mut state = FilterState {
            category: Some("2".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&r, &state)), vec!["b"]);
        state.category = Some("1".into());
        assert_eq!(ids(&filter(&r, &state)), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_status_requires_flag() {
        let accounts = vec![
            Account {
                id: Some("1".into()),
                active: Some(true),
                ..Default::default()
            },
            Account {
                id: Some("2".into()),
                active: Some(false),
                ..Default::default()
            },
            Account {
                id: Some("3".into()),
                ..Default::default()
            },
        ];
        let state = FilterState {
            status: Some(Status::Inactive),
            ..Default::default()
        };
        let kept: Vec<String> = filter(&accounts, &state).iter().map(|a| a.id()).collect();
        assert_eq!(kept, vec!["2"]);
    }
}
