use crate::model::de::{opt_amount, opt_int, opt_text, or_default};
use crate::model::{Amount, Kpi, Record, Section};
use crate::render::{format, Cell, ChartKind, ChartSpec, Column, Dataset, Tone};
use crate::view::{ContextSource, ViewKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Incoming orders of one salesperson for a month, from `/api/verkauf/auftragseingang/detail`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    #[serde(rename = "verkaufer_name", default, deserialize_with = "opt_text")]
    pub salesperson: Option<String>,
    #[serde(rename = "summe_neu", default, deserialize_with = "opt_int")]
    pub new_total: Option<i64>,
    #[serde(rename = "summe_test_vorfuehr", default, deserialize_with = "opt_int")]
    pub demo_total: Option<i64>,
    #[serde(rename = "summe_gebraucht", default, deserialize_with = "opt_int")]
    pub used_total: Option<i64>,
    #[serde(rename = "summe_gesamt", default, deserialize_with = "opt_int")]
    pub total: Option<i64>,
    #[serde(rename = "neu", default, deserialize_with = "or_default")]
    pub new_models: Vec<ModelCount>,
    #[serde(rename = "test_vorfuehr", default, deserialize_with = "or_default")]
    pub demo_models: Vec<ModelCount>,
    #[serde(rename = "gebraucht", default, deserialize_with = "or_default")]
    pub used_models: Vec<ModelCount>,
}

/// Orders of one model.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCount {
    #[serde(rename = "modell", default, deserialize_with = "opt_text")]
    pub model: Option<String>,
    #[serde(rename = "anzahl", default, deserialize_with = "opt_int")]
    pub count: Option<i64>,
}

impl ModelCount {
    fn label(&self) -> String {
        format!(
            "{} ({}x)",
            self.model.as_deref().unwrap_or("-"),
            self.count.unwrap_or_default()
        )
    }
}

impl SalesEntry {
    fn name(&self) -> &str {
        self.salesperson.as_deref().unwrap_or("Unbekannt")
    }

    /// `summe_gesamt`, or the sum of the parts when the backend left it out.
    pub fn grand_total(&self) -> i64 {
        self.total.unwrap_or_else(|| {
            self.new_total.unwrap_or_default()
                + self.demo_total.unwrap_or_default()
                + self.used_total.unwrap_or_default()
        })
    }
}

/// The month's orders per brand, from `/api/verkauf/auftragseingang/summary`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    #[serde(rename = "summary", default, deserialize_with = "or_default")]
    pub brands: Vec<BrandSales>,
}

/// Orders of one brand.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSales {
    #[serde(rename = "make_number", default, deserialize_with = "opt_int")]
    pub make: Option<i64>,
    #[serde(rename = "marke", default, deserialize_with = "opt_text")]
    pub brand: Option<String>,
    #[serde(rename = "gesamt", default, deserialize_with = "opt_int")]
    pub total: Option<i64>,
    #[serde(rename = "neu", default, deserialize_with = "opt_int")]
    pub new: Option<i64>,
    #[serde(rename = "test_vorfuehr", default, deserialize_with = "opt_int")]
    pub demo: Option<i64>,
    #[serde(rename = "gebraucht", default, deserialize_with = "opt_int")]
    pub used: Option<i64>,
    #[serde(rename = "umsatz_gesamt", default, deserialize_with = "opt_amount")]
    pub revenue: Option<Amount>,
}

/// Make numbers of the brands sold new. Every other brand only comes in as a used car.
const OPEL: i64 = 40;
const HYUNDAI: i64 = 27;

/// Orders and revenue summed over some brands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrandGroup {
    pub total: i64,
    pub new: i64,
    pub demo: i64,
    pub used: i64,
    pub revenue: Decimal,
}

impl BrandGroup {
    fn add(&mut self, brand: &BrandSales) {
        self.total += brand.total.unwrap_or_default();
        self.new += brand.new.unwrap_or_default();
        self.demo += brand.demo.unwrap_or_default();
        self.used += brand.used.unwrap_or_default();
        self.revenue += brand.revenue.map(|a| a.value()).unwrap_or_default();
    }

    fn of<'a>(brands: impl IntoIterator<Item = &'a BrandSales>) -> Self {
        let mut group = BrandGroup::default();
        for brand in brands {
            group.add(brand);
        }
        group
    }

    fn cells(&self, label: &str) -> Vec<Cell> {
        vec![
            Cell::Text(Some(label.to_string())),
            Cell::Count(Some(self.total)),
            Cell::Badge(self.new.to_string(), Tone::Success),
            Cell::Badge(self.demo.to_string(), Tone::Warning),
            Cell::Badge(self.used.to_string(), Tone::Neutral),
            Cell::Currency(Some(self.revenue)),
        ]
    }
}

impl SalesSummary {
    fn brand(&self, make: i64) -> Option<&BrandSales> {
        self.brands.iter().find(|b| b.make == Some(make))
    }

    fn is_new_car_brand(brand: &BrandSales) -> bool {
        matches!(brand.make, Some(OPEL) | Some(HYUNDAI))
    }

    /// Opel and Hyundai.
    pub fn new_cars(&self) -> BrandGroup {
        BrandGroup::of(self.brands.iter().filter(|b| Self::is_new_car_brand(b)))
    }

    /// Every brand other than Opel and Hyundai.
    pub fn used_cars(&self) -> BrandGroup {
        BrandGroup::of(self.brands.iter().filter(|b| !Self::is_new_car_brand(b)))
    }

    pub fn total(&self) -> BrandGroup {
        BrandGroup::of(&self.brands)
    }

    /// The summary rows: used cars when there are any, new cars, Opel and Hyundai when they
    /// were reported, and the total.
    fn rows(&self) -> Vec<Vec<Cell>> {
        if self.brands.is_empty() {
            return Vec::new();
        }
        let mut rows = Vec::new();
        let used = self.used_cars();
        if used.total > 0 {
            rows.push(used.cells("Gebrauchtwagen (andere Marken)"));
        }
        rows.push(self.new_cars().cells("Neuwagen (Opel + Hyundai)"));
        for (make, label) in [(OPEL, "Opel"), (HYUNDAI, "Hyundai")] {
            if let Some(brand) = self.brand(make) {
                rows.push(BrandGroup::of([brand]).cells(label));
            }
        }
        rows.push(self.total().cells("Gesamt"));
        rows
    }
}

const SUMMARY_COLUMNS: [Column; 6] = [
    Column::new("Marken"),
    Column::end("Gesamt"),
    Column::center("Neu"),
    Column::center("Test/Vorführ"),
    Column::center("Gebraucht"),
    Column::end("Umsatz"),
];

const COLUMNS: [Column; 8] = [
    Column::new("Verkäufer"),
    Column::center("Neu"),
    Column::center("Test/Vorführ"),
    Column::center("Gebraucht"),
    Column::end("Gesamt"),
    Column::new("Modelle Neu"),
    Column::new("Modelle Test/Vorführ"),
    Column::new("Modelle Gebraucht"),
];

impl Record for SalesEntry {
    const VIEW: ViewKind = ViewKind::Sales;

    const CONTEXT: ContextSource = ContextSource::Path("/api/verkauf/auftragseingang/summary");

    type Context = SalesSummary;

    fn id(&self) -> String {
        self.name().to_string()
    }

    fn amount(&self) -> Option<Decimal> {
        Some(Decimal::from(self.grand_total()))
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        let mut fields = vec![self.salesperson.as_deref()];
        fields.extend(
            self.new_models
                .iter()
                .chain(&self.demo_models)
                .chain(&self.used_models)
                .map(|m| m.model.as_deref()),
        );
        fields
    }

    /// Best salespeople first.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.grand_total()
            .cmp(&a.grand_total())
            .then_with(|| a.name().cmp(b.name()))
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let count = |v: Option<i64>| v.unwrap_or_default().to_string();
        let models =
            |list: &[ModelCount]| Cell::Lines(list.iter().map(ModelCount::label).collect());
        vec![
            Cell::Text(Some(self.name().to_string())),
            Cell::Badge(count(self.new_total), Tone::Success),
            Cell::Badge(count(self.demo_total), Tone::Warning),
            Cell::Badge(count(self.used_total), Tone::Neutral),
            Cell::Count(Some(self.grand_total())),
            models(&self.new_models),
            models(&self.demo_models),
            models(&self.used_models),
        ]
    }

    /// Revenue of the month over all brands.
    fn highlights(context: &SalesSummary, _all: &[Self], _filtered: &[&Self]) -> Vec<Kpi> {
        if context.brands.is_empty() {
            return Vec::new();
        }
        vec![Kpi::new(
            "Umsatz",
            format::currency(Some(context.total().revenue)),
            Tone::Primary,
        )]
    }

    fn charts(_context: &SalesSummary, filtered: &[&Self]) -> Vec<ChartSpec> {
        let labels = filtered.iter().map(|e| e.name().to_string()).collect();
        let series = |f: fn(&SalesEntry) -> Option<i64>| {
            filtered
                .iter()
                .map(|e| f(*e).unwrap_or_default() as f64)
                .collect::<Vec<_>>()
        };
        vec![
            ChartSpec::new("sales-by-person", "Auftragseingang je Verkäufer", ChartKind::Bar)
                .labels(labels)
                .dataset(Dataset::single("Neu", series(|e| e.new_total), "#198754"))
                .dataset(Dataset::single(
                    "Test/Vorführ",
                    series(|e| e.demo_total),
                    "#ffc107",
                ))
                .dataset(Dataset::single(
                    "Gebraucht",
                    series(|e| e.used_total),
                    "#6c757d",
                )),
        ]
    }

    fn sections(context: &SalesSummary) -> Vec<Section> {
        vec![Section {
            id: "sales-brands",
            title: "Auftragseingang nach Marken".to_string(),
            columns: &SUMMARY_COLUMNS,
            rows: context.rows(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<SalesEntry> {
        serde_json::from_str(
            r#"[
                {"verkaufer_name": "Meier", "summe_neu": 2, "summe_test_vorfuehr": 1,
                 "summe_gebraucht": 0, "summe_gesamt": 3,
                 "neu": [{"modell": "Corsa", "anzahl": 2}], "test_vorfuehr": [{"modell": "Astra", "anzahl": 1}]},
                {"verkaufer_name": "Schulz", "summe_neu": 4, "summe_gebraucht": 3}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_grand_total_falls_back_to_parts() {
        let e = entries();
        assert_eq!(e[0].grand_total(), 3);
        assert_eq!(e[1].grand_total(), 7);
    }

    #[test]
    fn test_order_by_total_desc() {
        let e = entries();
        assert_eq!(SalesEntry::display_order(&e[0], &e[1]), Ordering::Greater);
    }

    #[test]
    fn test_search_includes_models() {
        let e = entries();
        assert!(e[0].search_fields().contains(&Some("Astra")));
    }

    #[test]
    fn test_cells() {
        let cells = entries()[0].cells();
        assert_eq!(cells.len(), SalesEntry::columns().len());
        assert_eq!(cells[5].plain(), "Corsa (2x)");
        assert_eq!(cells[7].plain(), "-");
    }

    #[test]
    fn test_chart_series() {
        let e = entries();
        let refs: Vec<&SalesEntry> = e.iter().collect();
        let charts = SalesEntry::charts(&SalesSummary::default(), &refs);
        assert_eq!(charts[0].labels, vec!["Meier", "Schulz"]);
        assert_eq!(charts[0].datasets[2].data, vec![0.0, 3.0]);
    }

    fn summary() -> SalesSummary {
        serde_json::from_str(
            r#"{
                "month": 10, "year": 2025,
                "summary": [
                    {"make_number": 40, "marke": "Opel", "gesamt": 12, "neu": 7, "test_vorfuehr": 3,
                     "gebraucht": 2, "umsatz_gesamt": 310000.50},
                    {"make_number": 27, "marke": "Hyundai", "gesamt": 5, "neu": 4, "test_vorfuehr": 1,
                     "gebraucht": 0, "umsatz_gesamt": 140000},
                    {"make_number": 3, "marke": "Skoda", "gesamt": 2, "neu": 0, "test_vorfuehr": 0,
                     "gebraucht": 2, "umsatz_gesamt": "25000.00"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_brand_groups() {
        let s = summary();
        let new_cars = s.new_cars();
        assert_eq!((new_cars.total, new_cars.new, new_cars.demo), (17, 11, 4));
        assert_eq!(s.used_cars().total, 2);
        assert_eq!(
            s.total().revenue,
            Decimal::from_str_exact("475000.50").unwrap()
        );
    }

    #[test]
    fn test_summary_section_rows() {
        let sections = SalesEntry::sections(&summary());
        let labels: Vec<String> = sections[0].rows.iter().map(|r| r[0].plain()).collect();
        assert_eq!(
            labels,
            vec![
                "Gebrauchtwagen (andere Marken)",
                "Neuwagen (Opel + Hyundai)",
                "Opel",
                "Hyundai",
                "Gesamt"
            ]
        );
        let total = sections[0].rows.last().unwrap();
        assert_eq!(total[1].plain(), "19");
        assert_eq!(total[5].plain(), "475.000,50 €");
    }

    #[test]
    fn test_summary_without_used_cars() {
        let mut s = summary();
        s.brands.retain(|b| b.make != Some(3));
        let rows = SalesEntry::sections(&s).remove(0).rows;
        assert_eq!(rows[0][0].plain(), "Neuwagen (Opel + Hyundai)");
        assert_eq!(rows.len(), 4);
        assert!(SalesEntry::sections(&SalesSummary::default())[0]
            .rows
            .is_empty());
    }

    #[test]
    fn test_revenue_highlight() {
        let kpis = SalesEntry::highlights(&summary(), &[], &[]);
        assert_eq!(kpis[0].value, "475.000,50 €");
        assert!(SalesEntry::highlights(&SalesSummary::default(), &[], &[]).is_empty());
    }
}
