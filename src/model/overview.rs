use crate::model::de::{opt_amount, opt_int, or_default};
use crate::model::{Amount, Kpi, Transaction};
use crate::render::{format, ChartKind, ChartSpec, Dataset, Tone};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Everything the overview page shows: the bank figures and the latest bookings.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub dashboard: DashboardOverview,
    pub recent: Vec<Transaction>,
}

/// The bank overview object returned as `dashboard` by `/api/bankenspiegel/dashboard`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOverview {
    #[serde(rename = "gesamtsaldo", default, deserialize_with = "opt_amount")]
    pub total_balance: Option<Amount>,
    #[serde(rename = "anzahl_banken", default, deserialize_with = "opt_int")]
    pub banks: Option<i64>,
    #[serde(rename = "anzahl_konten", default, deserialize_with = "opt_int")]
    pub active_accounts: Option<i64>,
    #[serde(rename = "anzahl_konten_gesamt", default, deserialize_with = "opt_int")]
    pub all_accounts: Option<i64>,
    #[serde(rename = "letzte_30_tage", default, deserialize_with = "or_default")]
    pub last_30_days: Period,
    #[serde(
        rename = "interne_transfers_30_tage",
        default,
        deserialize_with = "or_default"
    )]
    pub internal_transfers: Transfers,
}

/// Bookings of a recent period.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(rename = "anzahl_transaktionen", default, deserialize_with = "opt_int")]
    pub transactions: Option<i64>,
    #[serde(rename = "einnahmen", default, deserialize_with = "opt_amount")]
    pub income: Option<Amount>,
    /// The backend reports expenses either signed or unsigned; they are displayed unsigned.
    #[serde(rename = "ausgaben", default, deserialize_with = "opt_amount")]
    pub expenses: Option<Amount>,
    #[serde(rename = "saldo", default, deserialize_with = "opt_amount")]
    pub net: Option<Amount>,
}

/// Transfers between the company's own accounts.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfers {
    #[serde(rename = "anzahl_transaktionen", default, deserialize_with = "opt_int")]
    pub transactions: Option<i64>,
    #[serde(rename = "volumen", default, deserialize_with = "opt_amount")]
    pub volume: Option<Amount>,
}

fn value(amount: Option<Amount>) -> Amount {
    amount.unwrap_or_default()
}

impl DashboardOverview {
    pub fn kpis(&self) -> Vec<Kpi> {
        let total = value(self.total_balance);
        let net = value(self.last_30_days.net);
        let all_accounts = self.all_accounts.or(self.active_accounts);
        vec![
            Kpi::new(
                "Gesamtsaldo",
                total.to_string(),
                Tone::of_sign(total.value()),
            ),
            Kpi::new("Banken", format::count(self.banks), Tone::Neutral),
            Kpi::new(
                "Konten",
                format!(
                    "{} von {}",
                    format::count(self.active_accounts),
                    format::count(all_accounts)
                ),
                Tone::Neutral,
            ),
            Kpi::new(
                "Transaktionen (30 Tage)",
                format::count(self.last_30_days.transactions),
                Tone::Neutral,
            ),
            Kpi::new(
                "Einnahmen (30 Tage)",
                value(self.last_30_days.income).to_string(),
                Tone::Success,
            ),
            Kpi::new(
                "Ausgaben (30 Tage)",
                value(self.last_30_days.expenses).abs().to_string(),
                Tone::Danger,
            ),
            Kpi::new(
                "Saldo (30 Tage)",
                net.to_string(),
                Tone::of_sign(net.value()),
            ),
            Kpi::new(
                "Interne Transfers",
                format!(
                    "{} / {}",
                    format::count(self.internal_transfers.transactions),
                    value(self.internal_transfers.volume)
                ),
                Tone::Info,
            ),
        ]
    }

    /// Income against expenses for the last 30 days.
    pub fn chart(&self) -> ChartSpec {
        let f = |a: Option<Amount>| value(a).abs().value().to_f64().unwrap_or_default();
        ChartSpec::new("overview-flow", "Letzte 30 Tage", ChartKind::Bar)
            .labels(vec!["Letzte 30 Tage".into()])
            .dataset(Dataset::single(
                "Einnahmen",
                vec![f(self.last_30_days.income)],
                "#198754",
            ))
            .dataset(Dataset::single(
                "Ausgaben",
                vec![f(self.last_30_days.expenses)],
                "#dc3545",
            ))
    }
}
