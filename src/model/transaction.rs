use crate::model::de::{opt_amount, opt_date, opt_text};
use crate::model::{Amount, Record};
use crate::render::{Cell, ChartKind, ChartSpec, Column, Dataset};
use crate::view::ViewKind;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One booking on a bank account, as listed by `/api/bankenspiegel/transaktionen`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "opt_text")]
    pub id: Option<String>,
    #[serde(rename = "konto_id", default, deserialize_with = "opt_text")]
    pub account_id: Option<String>,
    #[serde(rename = "buchungsdatum", default, deserialize_with = "opt_date")]
    pub booking_date: Option<NaiveDate>,
    #[serde(rename = "betrag", default, deserialize_with = "opt_amount")]
    pub amount: Option<Amount>,
    #[serde(rename = "verwendungszweck", default, deserialize_with = "opt_text")]
    pub purpose: Option<String>,
    #[serde(rename = "bank_name", default, deserialize_with = "opt_text")]
    pub bank: Option<String>,
    #[serde(rename = "kontoname", default, deserialize_with = "opt_text")]
    pub account_name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub iban: Option<String>,
}

const COLUMNS: [Column; 4] = [
    Column::new("Datum"),
    Column::new("Konto"),
    Column::new("Verwendungszweck"),
    Column::end("Betrag"),
];

impl Record for Transaction {
    const VIEW: ViewKind = ViewKind::Transactions;

    type Context = ();

    fn id(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    fn date(&self) -> Option<NaiveDate> {
        self.booking_date
    }

    fn amount(&self) -> Option<Decimal> {
        self.amount.map(|a| a.value())
    }

    /// Transactions are filtered by account.
    fn category(&self) -> Option<String> {
        self.account_id.clone()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![self.purpose.as_deref()]
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let mut account = Vec::new();
        if let Some(bank) = &self.bank {
            account.push(bank.clone());
        }
        if let Some(name) = self.account_name.as_ref().or(self.iban.as_ref()) {
            account.push(name.clone());
        }
        vec![
            Cell::Date(self.booking_date),
            Cell::Lines(account),
            Cell::text(self.purpose.as_deref()),
            Cell::Flow(self.amount()),
        ]
    }

    fn charts(_context: &(), filtered: &[&Self]) -> Vec<ChartSpec> {
        let summary = crate::aggregate::summarize(filtered.iter().copied());
        vec![ChartSpec::new("transactions-flow", "Einnahmen und Ausgaben", ChartKind::Bar)
            .labels(vec!["Einnahmen".into(), "Ausgaben".into()])
            .dataset(Dataset::new(
                "Betrag",
                vec![
                    summary.positive.to_f64().unwrap_or_default(),
                    summary.negative.to_f64().unwrap_or_default(),
                ],
            ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_row() {
        let json = r#"{
            "id": 4711,
            "konto_id": 3,
            "buchungsdatum": "Mon, 20 Oct 2025 00:00:00 GMT",
            "betrag": "-87.43",
            "verwendungszweck": "Tankstelle",
            "bank_name": "Sparkasse",
            "kontoname": null,
            "iban": "DE89370400440532013000"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id(), "4711");
        assert_eq!(t.category().as_deref(), Some("3"));
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2025, 10, 20));
        assert_eq!(t.amount(), Some(Decimal::new(-8743, 2)));
        assert_eq!(t.account_name, None);
    }

    #[test]
    fn test_cells_fall_back_to_iban() {
        let t = Transaction {
            bank: Some("Sparkasse".into()),
            iban: Some("DE00".into()),
            ..Default::default()
        };
        let cells = t.cells();
        assert_eq!(cells.len(), Transaction::columns().len());
        assert_eq!(cells[1].plain(), "Sparkasse; DE00");
        assert_eq!(cells[0].plain(), "-");
        assert_eq!(cells[3].plain(), "0,00 €");
    }

    #[test]
    fn test_serialize_uses_backend_names() {
        let t = Transaction {
            amount: Some(Amount::new(Decimal::from(25))),
            ..Default::default()
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["betrag"], serde_json::json!(25.0));
    }
}
