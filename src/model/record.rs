use crate::render::{ChartSpec, Cell, Column, Tone};
use crate::view::{ContextSource, ViewKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Debug;

/// One backend row shown in a dashboard table. Each view's row type implements this so that the
/// same filter, aggregate, paginate and render code serves every view.
///
/// Everything a row may lack is an `Option`: the filter treats a missing value as non-matching
/// and the default ordering sorts unknown dates last.
pub trait Record: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static {
    /// The view that lists this kind of row.
    const VIEW: ViewKind;

    /// Where the context is loaded from.
    const CONTEXT: ContextSource = ContextSource::None;

    /// Figures the portal sends beside the rows, such as portfolio totals. They describe the whole
    /// data set, so the filter never applies to them. `()` for views without any.
    type Context: DeserializeOwned + Serialize + Default + Clone + Debug + Send + Sync + 'static;

    /// A stable identifier, used for `id` attributes in markup and for approval actions.
    fn id(&self) -> String;

    /// The date used by the date-range filter and the default ordering.
    fn date(&self) -> Option<NaiveDate> {
        None
    }

    /// The signed amount fed to the aggregator and the direction filter.
    fn amount(&self) -> Option<Decimal> {
        None
    }

    /// The key matched exactly by the category filter.
    fn category(&self) -> Option<String> {
        None
    }

    /// The text fields searched by the free-text filter.
    fn search_fields(&self) -> Vec<Option<&str>> {
        Vec::new()
    }

    /// The active flag matched by the status filter, for rows that have one.
    fn is_active(&self) -> Option<bool> {
        None
    }

    /// Rows sharing a group key are rendered under a common heading.
    fn group_key(&self) -> Option<String> {
        None
    }

    /// Display order. Defaults to newest first with unknown dates last.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        match (a.date(), b.date()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Table header.
    fn columns() -> &'static [Column];

    /// One cell per entry in `columns()`.
    fn cells(&self) -> Vec<Cell>;

    /// Extra figures shown above the table. `all` is the unfiltered collection, `filtered` the
    /// rows passing the current filter.
    fn highlights(_context: &Self::Context, _all: &[Self], _filtered: &[&Self]) -> Vec<Kpi> {
        Vec::new()
    }

    /// Charts drawn from the filtered rows or the context.
    fn charts(_context: &Self::Context, _filtered: &[&Self]) -> Vec<ChartSpec> {
        Vec::new()
    }

    /// Secondary tables built from the context. Sections without rows are not shown.
    fn sections(_context: &Self::Context) -> Vec<Section> {
        Vec::new()
    }
}

/// A secondary table shown between the charts and the main table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: &'static str,
    pub title: String,
    pub columns: &'static [Column],
    pub rows: Vec<Vec<Cell>>,
}

/// A labelled figure rendered as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl Kpi {
    pub fn new(label: impl Into<String>, value: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone,
        }
    }
}
