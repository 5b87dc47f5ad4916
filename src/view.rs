//! The dashboard views and the state each of them goes through.
//!
//! A view starts out `Loading`, ends up in `Content` or `Error` when its load finishes, and only
//! leaves `Error` through an explicit reload. Filter and page changes never touch the loaded
//! records: the filtered rows, the summary and the page are derived from the full collection
//! every time they are asked for.

use crate::aggregate::{summarize, Summary};
use crate::error::LoadError;
use crate::filter::{filter, FilterState};
use crate::model::Record;
use crate::paginate::{Page, PageState};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The tabular views of the portal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Bookings on all bank accounts.
    Transactions,
    /// Bank accounts and their balances.
    Accounts,
    /// Vacation requests waiting for approval.
    Approvals,
    /// Incoming orders per salesperson.
    Sales,
    /// Vehicles financed through a bank.
    Financing,
}

serde_plain::derive_display_from_serialize!(ViewKind);
serde_plain::derive_fromstr_from_deserialize!(ViewKind);

/// How the four summary cards of a view are labelled and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLabels {
    pub positive: &'static str,
    pub negative: Option<&'static str>,
    pub net: Option<&'static str>,
    pub count: &'static str,
    /// Whether summed amounts are money. Otherwise they are plain quantities.
    pub currency: bool,
}

impl ViewKind {
    pub fn path(&self) -> &'static str {
        match self {
            ViewKind::Transactions => "/api/bankenspiegel/transaktionen",
            ViewKind::Accounts => "/api/bankenspiegel/konten",
            ViewKind::Approvals => "/api/vacation/approvals/pending",
            ViewKind::Sales => "/api/verkauf/auftragseingang/detail",
            ViewKind::Financing => "/api/bankenspiegel/einkaufsfinanzierung",
        }
    }

    /// The envelope key holding the rows.
    pub fn collection(&self) -> &'static str {
        match self {
            ViewKind::Transactions => "transaktionen",
            ViewKind::Accounts => "konten",
            ViewKind::Approvals => "data",
            ViewKind::Sales => "verkaufer",
            ViewKind::Financing => "top_fahrzeuge",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewKind::Transactions => "Transaktionen",
            ViewKind::Accounts => "Konten",
            ViewKind::Approvals => "Offene Urlaubsanträge",
            ViewKind::Sales => "Auftragseingang",
            ViewKind::Financing => "Einkaufsfinanzierung",
        }
    }

    /// Plural noun used in the range label and the empty-state message.
    pub fn noun(&self) -> &'static str {
        match self {
            ViewKind::Transactions => "Transaktionen",
            ViewKind::Accounts => "Konten",
            ViewKind::Approvals => "Anträge",
            ViewKind::Sales => "Verkäufer",
            ViewKind::Financing => "Fahrzeuge",
        }
    }

    pub fn summary_labels(&self) -> SummaryLabels {
        match self {
            ViewKind::Transactions => SummaryLabels {
                positive: "Einnahmen",
                negative: Some("Ausgaben"),
                net: Some("Saldo"),
                count: "Transaktionen",
                currency: true,
            },
            ViewKind::Accounts => SummaryLabels {
                positive: "Guthaben",
                negative: Some("Verbindlichkeiten"),
                net: Some("Saldo"),
                count: "Konten",
                currency: true,
            },
            ViewKind::Approvals => SummaryLabels {
                positive: "Arbeitstage",
                negative: None,
                net: None,
                count: "Offene Anträge",
                currency: false,
            },
            ViewKind::Sales => SummaryLabels {
                positive: "Aufträge",
                negative: None,
                net: None,
                count: "Verkäufer",
                currency: false,
            },
            ViewKind::Financing => SummaryLabels {
                positive: "Saldo Top-Fahrzeuge",
                negative: None,
                net: None,
                count: "Top-Fahrzeuge",
                currency: true,
            },
        }
    }

    /// Query parameters sent unless the caller overrides them.
    pub fn default_query(&self, today: NaiveDate) -> Vec<(String, String)> {
        match self {
            ViewKind::Transactions => vec![
                ("limit".into(), "10000".into()),
                ("offset".into(), "0".into()),
            ],
            ViewKind::Sales => vec![
                ("month".into(), today.month().to_string()),
                ("year".into(), today.year().to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// The endpoint for this view. `params` are added to the default query and replace defaults
    /// with the same key.
    pub fn endpoint(&self, today: NaiveDate, params: &[(String, String)]) -> Endpoint {
        let mut query = self.default_query(today);
        query.retain(|(key, _)| !params.iter().any(|(k, _)| k == key));
        query.extend(params.iter().cloned());
        Endpoint {
            path: self.path().to_string(),
            query,
            collection: self.collection().to_string(),
        }
    }
}

/// A backend GET: path relative to the base URL, query string and the envelope key to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub collection: String,
}

impl Endpoint {
    pub const OVERVIEW_PATH: &'static str = "/api/bankenspiegel/dashboard";

    /// The bank overview object.
    pub fn overview() -> Self {
        Self {
            path: Self::OVERVIEW_PATH.to_string(),
            query: Vec::new(),
            collection: "dashboard".to_string(),
        }
    }

    /// The most recent transactions shown under the overview.
    pub fn recent_transactions(limit: usize) -> Self {
        Self {
            path: ViewKind::Transactions.path().to_string(),
            query: vec![
                ("limit".into(), limit.to_string()),
                ("offset".into(), "0".into()),
            ],
            collection: ViewKind::Transactions.collection().to_string(),
        }
    }
}

/// Where a view finds the figures it shows beside its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Nothing beyond the rows.
    None,
    /// The envelope that holds the rows.
    Envelope,
    /// A second endpoint, queried with the same parameters as the rows.
    Path(&'static str),
}

impl Endpoint {
    /// The same query sent to `path`.
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            path: path.to_string(),
            query: self.query.clone(),
            collection: self.collection.clone(),
        }
    }
}

/// The rows and the context of one successful load.
#[derive(Debug, Clone)]
pub struct Loaded<R: Record> {
    pub records: Vec<R>,
    pub context: R::Context,
}

impl<R: Record> From<Vec<R>> for Loaded<R> {
    fn from(records: Vec<R>) -> Self {
        Self {
            records,
            context: R::Context::default(),
        }
    }
}

/// `Loading -> Content | Error`. Only a reload leaves `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Content(T),
    Error(String),
}

impl<T> ViewState<T> {
    /// Converts a finished load. Failures are logged and kept as a displayable message.
    pub fn from_result(result: std::result::Result<T, LoadError>) -> Self {
        match result {
            Ok(value) => ViewState::Content(value),
            Err(e) => {
                warn!("Loading failed: {e}");
                let message = e.to_string();
                if message.trim().is_empty() {
                    ViewState::Error("Unbekannter Fehler".to_string())
                } else {
                    ViewState::Error(message)
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn content(&self) -> Option<&T> {
        match self {
            ViewState::Content(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Everything derived from a view's records for one render.
#[derive(Debug)]
pub struct Derived<'a, R> {
    /// All records passing the filter, in display order.
    pub filtered: Vec<&'a R>,
    /// Totals over `filtered`.
    pub summary: Summary,
    pub page: Page,
}

impl<'a, R> Derived<'a, R> {
    /// The records on the current page.
    pub fn rows(&self) -> &[&'a R] {
        self.page.slice(&self.filtered)
    }
}

/// The state of one view: what was loaded, which filter is set and which page is shown.
#[derive(Debug, Clone)]
pub struct View<R: Record> {
    state: ViewState<Vec<R>>,
    context: R::Context,
    filter: FilterState,
    page: PageState,
    loaded_at: Option<NaiveDateTime>,
}

impl<R: Record> View<R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: ViewState::Loading,
            context: R::Context::default(),
            filter: FilterState::default(),
            page: PageState::new(page_size),
            loaded_at: None,
        }
    }

    pub fn kind(&self) -> ViewKind {
        R::VIEW
    }

    pub fn state(&self) -> &ViewState<Vec<R>> {
        &self.state
    }

    /// What was loaded beside the rows. The default unless the view has content.
    pub fn context(&self) -> &R::Context {
        &self.context
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn page_state(&self) -> &PageState {
        &self.page
    }

    /// When the current content was loaded.
    pub fn loaded_at(&self) -> Option<NaiveDateTime> {
        self.loaded_at
    }

    /// The full loaded collection, empty unless the view has content.
    pub fn records(&self) -> &[R] {
        self.state.content().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enters `Loading`. Filter and page are kept.
    pub fn begin_reload(&mut self) {
        debug!("Reloading {}", R::VIEW);
        self.state = ViewState::Loading;
    }

    /// Leaves `Loading` with the outcome of the load.
    pub fn finish_load(&mut self, result: std::result::Result<Loaded<R>, LoadError>) {
        self.finish_load_at(result, Local::now().naive_local());
    }

    pub fn finish_load_at(
        &mut self,
        result: std::result::Result<Loaded<R>, LoadError>,
        at: NaiveDateTime,
    ) {
        let records = match result {
            Ok(Loaded { records, context }) => {
                self.context = context;
                Ok(records)
            }
            Err(e) => {
                self.context = R::Context::default();
                Err(e)
            }
        };
        self.state = ViewState::from_result(records);
        if let ViewState::Content(records) = &self.state {
            debug!("Loaded {} {}", records.len(), R::VIEW.noun());
            self.loaded_at = Some(at);
            // A refreshed collection may be shorter than the page we were on.
            let count = filter(records, &self.filter).len();
            let page = self.page.page();
            if !self.page.goto(page, count) {
                self.page.reset();
            }
        }
    }

    /// Replaces the filter and goes back to the first page.
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.page.reset();
    }

    /// Moves to `page` if it exists for the current filter. Returns `false` otherwise.
    pub fn goto_page(&mut self, page: usize) -> bool {
        let count = filter(self.records(), &self.filter).len();
        self.page.goto(page, count)
    }

    /// Filters the full collection and computes the summary and current page. `None` unless the
    /// view has content.
    pub fn derive(&self) -> Option<Derived<'_, R>> {
        let records = self.state.content()?;
        let filtered = filter(records, &self.filter);
        let summary = summarize(filtered.iter().copied());
        let page = Page::new(filtered.len(), &self.page);
        Some(Derived {
            filtered,
            summary,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, BrandSales, SalesEntry, SalesSummary, Transaction};
    use rust_decimal::Decimal;

    fn transactions(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                id: Some(i.to_string()),
                account_id: Some(if i % 2 == 0 { "1" } else { "2" }.to_string()),
                amount: Some(Amount::new(Decimal::from(i as i64 - 10))),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_starts_loading() {
        let view: View<Transaction> = View::new(50);
        assert!(view.state().is_loading());
        assert!(view.derive().is_none());
    }

    #[test]
    fn test_http_500_moves_to_error() {
        let mut view: View<Transaction> = View::new(50);
        view.finish_load(Err(LoadError::status(500, "")));
        assert!(!view.state().is_loading());
        let message = view.state().error().unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("500"));
    }

    #[test]
    fn test_error_left_only_by_reload() {
        let mut view: View<Transaction> = View::new(50);
        view.finish_load(Err(LoadError::Parse("kaputt".into())));
        view.set_filter(FilterState::default());
        assert!(view.state().error().is_some());
        view.begin_reload();
        assert!(view.state().is_loading());
        view.finish_load(Ok(transactions(3).into()));
        assert_eq!(view.records().len(), 3);
    }

    #[test]
    fn test_failed_reload_drops_context() {
        let mut view: View<SalesEntry> = View::new(50);
        let context = SalesSummary {
            brands: vec![BrandSales {
                make: Some(40),
                total: Some(3),
                ..Default::default()
            }],
        };
        view.finish_load(Ok(Loaded {
            records: Vec::new(),
            context: context.clone(),
        }));
        assert_eq!(view.context(), &context);
        view.begin_reload();
        view.finish_load(Err(LoadError::status(502, "")));
        assert!(view.context().brands.is_empty());
    }

    #[test]
    fn test_pagination_scenario() {
        let mut view: View<Transaction> = View::new(50);
        view.finish_load(Ok(transactions(120).into()));
        assert!(view.goto_page(3));
        let derived = view.derive().unwrap();
        assert_eq!((derived.page.start, derived.page.end), (100, 120));
        assert_eq!(derived.rows().len(), 20);
        assert_eq!(derived.page.range_label(), "101-120 von 120");
    }

    #[test]
    fn test_filter_change_resets_page_and_recomputes() {
        let mut view: View<Transaction> = View::new(10);
        view.finish_load(Ok(transactions(40).into()));
        assert!(view.goto_page(3));
        view.set_filter(FilterState {
            category: Some("2".into()),
            ..Default::default()
        });
        assert_eq!(view.page_state().page(), 1);
        let derived = view.derive().unwrap();
        assert_eq!(derived.summary.count, 20);

        view.set_filter(FilterState {
            category: Some("1".into()),
            ..Default::default()
        });
        let derived = view.derive().unwrap();
        assert_eq!(derived.summary.count, 20);
        assert!(derived.filtered.iter().all(|t| t.category().as_deref() == Some("1")));
    }

    #[test]
    fn test_goto_page_out_of_range() {
        let mut view: View<Transaction> = View::new(50);
        view.finish_load(Ok(transactions(120).into()));
        assert!(!view.goto_page(4));
        assert_eq!(view.page_state().page(), 1);
    }

    #[test]
    fn test_reload_with_fewer_records_clamps_page() {
        let mut view: View<Transaction> = View::new(10);
        view.finish_load(Ok(transactions(40).into()));
        assert!(view.goto_page(4));
        view.begin_reload();
        view.finish_load(Ok(transactions(5).into()));
        assert_eq!(view.page_state().page(), 1);
    }

    #[test]
    fn test_endpoint_params_override_defaults() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let endpoint = ViewKind::Sales.endpoint(today, &[("month".into(), "9".into())]);
        assert_eq!(
            endpoint.query,
            vec![
                ("year".to_string(), "2025".to_string()),
                ("month".to_string(), "9".to_string())
            ]
        );
        assert_eq!(endpoint.collection, "verkaufer");
        let tx = ViewKind::Transactions.endpoint(today, &[]);
        assert_eq!(tx.query[0], ("limit".to_string(), "10000".to_string()));
    }

    #[test]
    fn test_view_kind_names() {
        assert_eq!(ViewKind::Approvals.to_string(), "approvals");
        assert_eq!("financing".parse::<ViewKind>().unwrap(), ViewKind::Financing);
    }
}
