use crate::aggregate::percent_of;
use crate::model::de::{opt_amount, opt_decimal, opt_int, opt_text, or_default};
use crate::model::{Amount, Kpi, Record, Section};
use crate::render::{format, Cell, ChartKind, ChartSpec, Column, Dataset, Tone};
use crate::view::{ContextSource, ViewKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const UNKNOWN: &str = "Unbekannt";
const STELLANTIS: &str = "Stellantis";

/// A vehicle bought through a financing institute, from the `top_fahrzeuge` list of
/// `/api/bankenspiegel/einkaufsfinanzierung`. The list is the ranked top of the stock, not the
/// whole portfolio.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancedVehicle {
    #[serde(default, deserialize_with = "opt_text")]
    pub vin: Option<String>,
    #[serde(rename = "institut", default, deserialize_with = "opt_text")]
    pub institute: Option<String>,
    #[serde(rename = "modell", default, deserialize_with = "opt_text")]
    pub model: Option<String>,
    #[serde(rename = "marke", default, deserialize_with = "opt_text")]
    pub brand: Option<String>,
    /// Outstanding balance.
    #[serde(rename = "saldo", default, deserialize_with = "opt_amount")]
    pub balance: Option<Amount>,
    /// Amount originally financed.
    #[serde(rename = "original", default, deserialize_with = "opt_amount")]
    pub original: Option<Amount>,
    /// Days in stock.
    #[serde(rename = "alter", default, deserialize_with = "opt_int")]
    pub age_days: Option<i64>,
}

impl FinancedVehicle {
    fn balance_value(&self) -> Decimal {
        self.balance.map(|a| a.value()).unwrap_or_default()
    }
}

/// Everything the financing envelope carries beside `top_fahrzeuge`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingContext {
    /// Totals over the whole portfolio.
    #[serde(rename = "gesamt", default)]
    pub totals: Option<FinancingTotals>,
    #[serde(rename = "institute", default, deserialize_with = "or_default")]
    pub institutes: Vec<Institute>,
    /// Vehicles whose interest-free period is running out.
    #[serde(rename = "warnungen", default, deserialize_with = "or_default")]
    pub warnings: Vec<InterestWarning>,
}

/// Financing figures of the portfolio or of one institute.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingTotals {
    #[serde(
        rename = "anzahl_fahrzeuge",
        alias = "anzahl",
        default,
        deserialize_with = "opt_int"
    )]
    pub vehicles: Option<i64>,
    /// Outstanding balance.
    #[serde(rename = "finanzierung", default, deserialize_with = "opt_amount")]
    pub balance: Option<Amount>,
    #[serde(rename = "original", default, deserialize_with = "opt_amount")]
    pub original: Option<Amount>,
    #[serde(rename = "abbezahlt", default, deserialize_with = "opt_amount")]
    pub repaid: Option<Amount>,
    #[serde(rename = "abbezahlt_prozent", default, deserialize_with = "opt_decimal")]
    pub repaid_percent: Option<Decimal>,
}

impl FinancingTotals {
    fn value(amount: Option<Amount>) -> Decimal {
        amount.map(|a| a.value()).unwrap_or_default()
    }

    pub fn balance(&self) -> Decimal {
        Self::value(self.balance)
    }

    pub fn original(&self) -> Decimal {
        Self::value(self.original)
    }

    /// `abbezahlt`, or what is no longer outstanding when the backend left it out.
    pub fn repaid(&self) -> Decimal {
        self.repaid
            .map(|a| a.value())
            .unwrap_or_else(|| self.original() - self.balance())
    }

    /// Share of the original amount already repaid, 0 when nothing was financed.
    pub fn repaid_percent(&self) -> Decimal {
        self.repaid_percent
            .unwrap_or_else(|| percent_of(self.repaid(), self.original()))
    }
}

/// One financing institute with its brands.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institute {
    #[serde(default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(rename = "anzahl", default, deserialize_with = "opt_int")]
    pub vehicles: Option<i64>,
    #[serde(rename = "finanzierung", default, deserialize_with = "opt_amount")]
    pub balance: Option<Amount>,
    #[serde(rename = "original", default, deserialize_with = "opt_amount")]
    pub original: Option<Amount>,
    #[serde(rename = "abbezahlt", default, deserialize_with = "opt_amount")]
    pub repaid: Option<Amount>,
    /// Average balance per vehicle.
    #[serde(rename = "durchschnitt", default, deserialize_with = "opt_amount")]
    pub average: Option<Amount>,
    /// Days the oldest vehicle has been in stock.
    #[serde(rename = "aeltestes", default, deserialize_with = "opt_int")]
    pub oldest_days: Option<i64>,
    #[serde(rename = "marken", default, deserialize_with = "or_default")]
    pub brands: Vec<BrandCount>,
}

impl Institute {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }

    /// The institute's figures. The repaid share is always computed here, guarded against an
    /// original amount of zero.
    pub fn totals(&self) -> FinancingTotals {
        FinancingTotals {
            vehicles: self.vehicles,
            balance: self.balance,
            original: self.original,
            repaid: self.repaid,
            repaid_percent: None,
        }
    }

    /// `Stellantis Bank`, but `VW Bank` stays as it is.
    fn label(&self) -> String {
        let name = self.name();
        if name.ends_with("Bank") {
            name.to_string()
        } else {
            format!("{name} Bank")
        }
    }

    fn tone(&self) -> Tone {
        if self.name() == STELLANTIS {
            Tone::Primary
        } else {
            Tone::Info
        }
    }
}

/// Financed vehicles of one brand.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandCount {
    #[serde(default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(rename = "anzahl", default, deserialize_with = "opt_int")]
    pub count: Option<i64>,
}

/// A vehicle whose interest-free period ends soon.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestWarning {
    #[serde(default, deserialize_with = "opt_text")]
    pub vin: Option<String>,
    #[serde(rename = "institut", default, deserialize_with = "opt_text")]
    pub institute: Option<String>,
    #[serde(rename = "modell", default, deserialize_with = "opt_text")]
    pub model: Option<String>,
    #[serde(rename = "tage_uebrig", default, deserialize_with = "opt_int")]
    pub days_left: Option<i64>,
    #[serde(rename = "kritisch", default, deserialize_with = "or_default")]
    pub critical: bool,
    #[serde(rename = "saldo", default, deserialize_with = "opt_amount")]
    pub balance: Option<Amount>,
    #[serde(rename = "alter", default, deserialize_with = "opt_int")]
    pub age_days: Option<i64>,
}

impl InterestWarning {
    fn cells(&self) -> Vec<Cell> {
        let tone = if self.critical {
            Tone::Danger
        } else {
            Tone::Warning
        };
        let status = if self.critical {
            Cell::Badge("KRITISCH".into(), Tone::Danger)
        } else {
            Cell::Text(None)
        };
        vec![
            Cell::Badge(
                self.institute.clone().unwrap_or_else(|| STELLANTIS.into()),
                Tone::Primary,
            ),
            Cell::code(self.vin.as_deref()),
            Cell::text(self.model.as_deref()),
            Cell::Badge(format!("{} Tage", format::count(self.days_left)), tone),
            status,
            Cell::Currency(self.balance.map(|a| a.value())),
            days(self.age_days),
        ]
    }
}

fn days(value: Option<i64>) -> Cell {
    match value {
        Some(days) => Cell::Text(Some(format!("{} Tage", format::count(Some(days))))),
        None => Cell::Text(None),
    }
}

const COLUMNS: [Column; 7] = [
    Column::new("Institut"),
    Column::new("VIN"),
    Column::new("Modell"),
    Column::new("Marke"),
    Column::end("Saldo"),
    Column::end("Original"),
    Column::end("Alter"),
];

const WARNING_COLUMNS: [Column; 7] = [
    Column::new("Institut"),
    Column::new("VIN"),
    Column::new("Modell"),
    Column::new("Zinsfreiheit"),
    Column::new("Status"),
    Column::end("Saldo"),
    Column::end("Alter"),
];

impl Record for FinancedVehicle {
    const VIEW: ViewKind = ViewKind::Financing;

    const CONTEXT: ContextSource = ContextSource::Envelope;

    type Context = FinancingContext;

    fn id(&self) -> String {
        self.vin.clone().unwrap_or_default()
    }

    fn amount(&self) -> Option<Decimal> {
        self.balance.map(|a| a.value())
    }

    fn category(&self) -> Option<String> {
        self.institute.clone()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.vin.as_deref(),
            self.model.as_deref(),
            self.brand.as_deref(),
        ]
    }

    /// Largest outstanding balance first.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.balance_value().cmp(&a.balance_value())
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let institute = self.institute.clone().unwrap_or_else(|| UNKNOWN.into());
        let tone = if institute == STELLANTIS {
            Tone::Primary
        } else {
            Tone::Info
        };
        vec![
            Cell::Badge(institute, tone),
            Cell::code(self.vin.as_deref()),
            Cell::text(self.model.as_deref()),
            Cell::text(self.brand.as_deref()),
            Cell::Currency(self.amount()),
            Cell::Currency(self.original.map(|a| a.value())),
            days(self.age_days),
        ]
    }

    /// Portfolio totals, the warning count and one card per institute.
    fn highlights(context: &FinancingContext, _all: &[Self], _filtered: &[&Self]) -> Vec<Kpi> {
        let mut kpis = Vec::new();
        if let Some(totals) = &context.totals {
            kpis.push(Kpi::new(
                "Fahrzeuge",
                format::count(totals.vehicles),
                Tone::Neutral,
            ));
            kpis.push(Kpi::new(
                "Finanzierung",
                format!(
                    "{} von {}",
                    format::currency(Some(totals.balance())),
                    format::currency(Some(totals.original()))
                ),
                Tone::Primary,
            ));
            kpis.push(Kpi::new(
                "Abbezahlt",
                format!(
                    "{} ({})",
                    format::currency(Some(totals.repaid())),
                    format::percent(totals.repaid_percent())
                ),
                Tone::Success,
            ));
        }
        let warning_tone = if context.warnings.iter().any(|w| w.critical) {
            Tone::Danger
        } else if context.warnings.is_empty() {
            Tone::Neutral
        } else {
            Tone::Warning
        };
        kpis.push(Kpi::new(
            "Warnungen",
            format::count_usize(context.warnings.len()),
            warning_tone,
        ));
        for institute in &context.institutes {
            let totals = institute.totals();
            kpis.push(Kpi::new(
                institute.label(),
                format!(
                    "{} Fzg., {}, {} abbezahlt",
                    format::count(totals.vehicles),
                    Amount::new(totals.balance()).short(),
                    format::percent(totals.repaid_percent())
                ),
                institute.tone(),
            ));
        }
        kpis
    }

    fn charts(context: &FinancingContext, _filtered: &[&Self]) -> Vec<ChartSpec> {
        let institutes = &context.institutes;
        let mut brand_labels = Vec::new();
        let mut brand_counts = Vec::new();
        for institute in institutes {
            for brand in &institute.brands {
                brand_labels.push(format!(
                    "{} ({})",
                    brand.name.as_deref().unwrap_or(UNKNOWN),
                    institute.name()
                ));
                brand_counts.push(brand.count.unwrap_or_default() as f64);
            }
        }
        vec![
            ChartSpec::new(
                "financing-by-institute",
                "Finanzierung je Institut",
                ChartKind::Pie,
            )
            .labels(institutes.iter().map(|i| i.name().to_string()).collect())
            .dataset(Dataset::new(
                "Finanzierung",
                institutes
                    .iter()
                    .map(|i| i.totals().balance().to_f64().unwrap_or_default())
                    .collect(),
            )),
            ChartSpec::new("financing-by-brand", "Fahrzeuge je Marke", ChartKind::Bar)
                .labels(brand_labels)
                .dataset(Dataset::new("Anzahl Fahrzeuge", brand_counts)),
        ]
    }

    fn sections(context: &FinancingContext) -> Vec<Section> {
        vec![Section {
            id: "financing-warnings",
            title: "Zinsfreiheit läuft ab".to_string(),
            columns: &WARNING_COLUMNS,
            rows: context.warnings.iter().map(InterestWarning::cells).collect(),
        }]
    }
}
