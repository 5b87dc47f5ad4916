use crate::model::de::{opt_amount, opt_text};
use crate::model::{Amount, Kpi, Record};
use crate::render::{format, Cell, Column, Tone};
use crate::view::ViewKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A bank account from `/api/bankenspiegel/konten`.
///
/// The backend reports the balance as `saldo` in some responses and `aktueller_saldo` in others.
/// Both are kept and `balance` prefers the current one.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "opt_text")]
    pub id: Option<String>,
    #[serde(rename = "bank_name", default, deserialize_with = "opt_text")]
    pub bank: Option<String>,
    #[serde(rename = "kontoname", default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub iban: Option<String>,
    #[serde(rename = "saldo", default, deserialize_with = "opt_amount")]
    pub booked_balance: Option<Amount>,
    #[serde(
        rename = "aktueller_saldo",
        default,
        deserialize_with = "opt_amount"
    )]
    pub current_balance: Option<Amount>,
    #[serde(rename = "aktiv", default, deserialize_with = "opt_flag")]
    pub active: Option<bool>,
}

impl Account {
    pub fn balance(&self) -> Option<Amount> {
        self.current_balance.or(self.booked_balance)
    }

    /// Sum of the balances of all active accounts. Accounts without a balance count as zero.
    pub fn total_active_balance(accounts: &[Account]) -> Decimal {
        accounts
            .iter()
            .filter(|a| a.active == Some(true))
            .filter_map(|a| a.balance())
            .map(|a| a.value())
            .sum()
    }
}

/// The portal sends `aktiv` as a JSON bool, as 0/1, or as a string.
fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Flag(bool),
        Number(i64),
        Text(String),
    }
    Ok(match Option::<RawFlag>::deserialize(deserializer)? {
        None => None,
        Some(RawFlag::Flag(b)) => Some(b),
        Some(RawFlag::Number(n)) => Some(n != 0),
        Some(RawFlag::Text(s)) => match s.trim().to_lowercase().as_str() {
            "" => None,
            "true" | "1" | "ja" | "aktiv" => Some(true),
            _ => Some(false),
        },
    })
}

const COLUMNS: [Column; 5] = [
    Column::new("Status"),
    Column::new("Bank"),
    Column::new("Konto"),
    Column::new("IBAN"),
    Column::end("Saldo"),
];

impl Record for Account {
    const VIEW: ViewKind = ViewKind::Accounts;

    type Context = ();

    fn id(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    fn amount(&self) -> Option<Decimal> {
        self.balance().map(|a| a.value())
    }

    /// Accounts are filtered by bank.
    fn category(&self) -> Option<String> {
        self.bank.clone()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.iban.as_deref(),
            self.name.as_deref(),
            self.bank.as_deref(),
        ]
    }

    fn is_active(&self) -> Option<bool> {
        self.active
    }

    /// Banks alphabetically, then account name. Accounts have no date.
    fn display_order(a: &Self, b: &Self) -> std::cmp::Ordering {
        (a.bank.as_deref(), a.name.as_deref()).cmp(&(b.bank.as_deref(), b.name.as_deref()))
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let status = match self.active {
            Some(true) => Cell::Badge("Aktiv".into(), Tone::Success),
            _ => Cell::Badge("Inaktiv".into(), Tone::Neutral),
        };
        let mut name = vec![format::text(self.name.as_deref())];
        if self.iban.is_some() {
            name.push(format::masked_iban(self.iban.as_deref()));
        }
        vec![
            status,
            Cell::text(self.bank.as_deref()),
            Cell::Lines(name),
            Cell::code(self.iban.as_deref()),
            Cell::Currency(self.amount()),
        ]
    }

    /// The total balance is taken over every active account, independent of the filter.
    fn highlights(_context: &(), all: &[Self], _filtered: &[&Self]) -> Vec<Kpi> {
        let total = Account::total_active_balance(all);
        vec![Kpi::new(
            "Gesamtsaldo aktive Konten",
            format::currency(Some(total)),
            Tone::of_sign(total),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<Account> {
        serde_json::from_str(
            r#"[
                {"id": 1, "bank_name": "Sparkasse", "kontoname": "Geschäftskonto",
                 "iban": "DE89370400440532013000", "saldo": 100, "aktueller_saldo": "1500.50", "aktiv": true},
                {"id": 2, "bank_name": "Volksbank", "kontoname": "Kredit",
                 "saldo": -200, "aktiv": 1},
                {"id": 3, "bank_name": "Commerzbank", "saldo": 999, "aktiv": false}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_balance_prefers_current() {
        let a = accounts();
        assert_eq!(a[0].amount(), Some(Decimal::new(150050, 2)));
        assert_eq!(a[1].amount(), Some(Decimal::from(-200)));
    }

    #[test]
    fn test_total_over_active_only() {
        let a = accounts();
        assert_eq!(Account::total_active_balance(&a), Decimal::new(130050, 2));
        let kpis = Account::highlights(&(), &a, &[]);
        assert_eq!(kpis[0].value, "1.300,50 €");
        assert_eq!(kpis[0].tone, Tone::Success);
    }

    #[test]
    fn test_flag_shapes() {
        let a = accounts();
        assert_eq!(a[0].is_active(), Some(true));
        assert_eq!(a[1].is_active(), Some(true));
        assert_eq!(a[2].is_active(), Some(false));
    }

    #[test]
    fn test_cells_mask_iban_in_name_column() {
        let cells = accounts()[0].cells();
        assert_eq!(cells[2].plain(), "Geschäftskonto; •••• 3000");
        assert_eq!(cells[3].plain(), "DE89370400440532013000");
        assert_eq!(cells[4].plain(), "1.500,50 €");
    }
}
