//! Output formats for a rendered view.

use crate::aggregate::Summary;
use crate::filter::FilterState;
use crate::model::{DashboardOverview, Kpi, Overview, Record, Transaction};
use crate::paginate::Page;
use crate::render::{Align, Cell, Column, Renderer};
use crate::view::{Derived, View, ViewKind, ViewState};
use crate::Result;
use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

/// How `show`, `watch` and `overview` write their result.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// A complete HTML page with tables and charts.
    #[default]
    Html,
    /// The current page of rows together with the summary.
    Json,
    /// The current page of rows as CSV.
    Csv,
    /// The current page of rows as a markdown table.
    Table,
}

serde_plain::derive_display_from_serialize!(Format);
serde_plain::derive_fromstr_from_deserialize!(Format);

impl Format {
    /// File extension for reports written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Table => "md",
        }
    }
}

/// A view in the requested output format.
#[derive(Clone, Serialize)]
#[serde(untagged)]
pub enum Rows {
    Html(String),
    Json(serde_json::Value),
    Table(String),
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Html(s) => write!(f, "Rows::Html({} chars)", s.len()),
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Html(s) | Rows::Table(s) | Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Serialize)]
struct PageJson<'a, R: Record> {
    view: ViewKind,
    filter: &'a FilterState,
    summary: Summary,
    page: Page,
    range: String,
    highlights: Vec<Kpi>,
    context: &'a R::Context,
    rows: &'a [&'a R],
}

/// Writes `view` in `format`. HTML always succeeds, showing an error box for a failed load. The
/// data formats have nothing to show for a failed load and return its message as an error.
pub fn export<R: Record>(renderer: &mut Renderer, view: &View<R>, format: Format) -> Result<Rows> {
    match format {
        Format::Html => Ok(Rows::Html(renderer.document(view))),
        Format::Json => {
            let derived = loaded(view)?;
            let json = PageJson {
                view: R::VIEW,
                filter: view.filter_state(),
                summary: derived.summary,
                page: derived.page,
                range: derived.page.range_label(),
                highlights: R::highlights(view.context(), view.records(), &derived.filtered),
                context: view.context(),
                rows: derived.rows(),
            };
            let value = serde_json::to_value(json).context("Unable to serialize the view")?;
            Ok(Rows::Json(value))
        }
        Format::Csv => {
            let derived = loaded(view)?;
            let rows = derived.rows().iter().map(|r| r.cells());
            Ok(Rows::Csv(csv(R::columns(), rows)?))
        }
        Format::Table => {
            let derived = loaded(view)?;
            let rows = derived.rows().iter().map(|r| r.cells());
            Ok(Rows::Table(markdown(R::columns(), rows)))
        }
    }
}

fn loaded<R: Record>(view: &View<R>) -> Result<Derived<'_, R>> {
    if let ViewState::Error(message) = view.state() {
        bail!("{message}");
    }
    view.derive()
        .with_context(|| format!("{} are still loading", R::VIEW.noun()))
}

#[derive(Serialize)]
struct OverviewJson<'a> {
    dashboard: &'a DashboardOverview,
    kpis: Vec<Kpi>,
    recent: &'a [Transaction],
}

/// Writes the bank overview in `format`. The data formats list its KPI cards.
pub fn export_overview(
    renderer: &mut Renderer,
    state: &ViewState<Overview>,
    format: Format,
) -> Result<Rows> {
    const COLUMNS: [Column; 2] = [Column::new("Kennzahl"), Column::end("Wert")];
    if format == Format::Html {
        return Ok(Rows::Html(renderer.overview_document(state)));
    }
    let overview = match state {
        ViewState::Error(message) => bail!("{message}"),
        ViewState::Loading => bail!("The overview is still loading"),
        ViewState::Content(overview) => overview,
    };
    let kpis = overview.dashboard.kpis();
    let cells = kpis.iter().map(|k| {
        vec![
            Cell::text(Some(k.label.as_str())),
            Cell::text(Some(k.value.as_str())),
        ]
    });
    match format {
        Format::Csv => Ok(Rows::Csv(csv(&COLUMNS, cells)?)),
        Format::Table => Ok(Rows::Table(markdown(&COLUMNS, cells))),
        Format::Html | Format::Json => {
            let json = OverviewJson {
                dashboard: &overview.dashboard,
                kpis: kpis.clone(),
                recent: &overview.recent,
            };
            let value =
                serde_json::to_value(json).context("Unable to serialize the overview")?;
            Ok(Rows::Json(value))
        }
    }
}

fn csv(columns: &[Column], rows: impl Iterator<Item = Vec<Cell>>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|c| c.title))
        .context("Unable to write CSV header")?;
    for cells in rows {
        writer
            .write_record(cells.iter().map(Cell::plain))
            .context("Unable to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn markdown(columns: &[Column], rows: impl Iterator<Item = Vec<Cell>>) -> String {
    let escape = |s: String| s.replace('|', "\\|").replace('\n', " ");
    let line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));
    let mut out = line(columns.iter().map(|c| escape(c.title.to_string())).collect());
    out.push_str(&line(
        columns
            .iter()
            .map(|c| match c.align {
                Align::End => "---:".to_string(),
                Align::Center => ":---:".to_string(),
                Align::Start => "---".to_string(),
            })
            .collect(),
    ));
    for cells in rows {
        out.push_str(&line(cells.iter().map(|c| escape(c.plain())).collect()));
    }
    out
}
