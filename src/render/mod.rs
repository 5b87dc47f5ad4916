//! Turns view state into HTML.
//!
//! Rendering is a function of the state passed in: the same state always yields the same markup.
//! The only thing a `Renderer` carries between calls is its `ChartRegistry`, which makes sure a
//! canvas never has more than one live chart no matter how often a view is re-rendered.

mod cell;
mod chart;
pub mod format;

pub use cell::{Align, Cell, Column, Tone};
pub use chart::{ChartHandle, ChartKind, ChartRegistry, ChartSpec, Dataset};

use crate::aggregate::{group_by, Summary};
use crate::model::{Kpi, Overview, Record, Section};
use crate::paginate::Page;
use crate::view::{SummaryLabels, View, ViewState};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

const STYLE: &str = r#"
.kpi-card { min-width: 12rem; }
.chart-container { position: relative; height: 320px; margin-bottom: 1.5rem; }
tr.group-header td { background: #f8f9fa; font-weight: 600; }
.empty-state { color: #6c757d; padding: 2rem 0; text-align: center; }
"#;

// Hands each embedded chart configuration to Chart.js, destroying any chart already on the canvas.
const CHART_BOOTSTRAP: &str = r#"
document.querySelectorAll('script[data-chart-for]').forEach(function (el) {
  var canvas = document.getElementById(el.dataset.chartFor);
  if (!canvas || !window.Chart) { return; }
  var existing = Chart.getChart(canvas);
  if (existing) { existing.destroy(); }
  new Chart(canvas, JSON.parse(el.textContent));
});
"#;

/// Renders views and owns their charts.
#[derive(Debug, Default)]
pub struct Renderer {
    charts: ChartRegistry,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    /// The view as an HTML fragment.
    pub fn render<R: Record>(&mut self, view: &View<R>) -> Markup {
        let kind = R::VIEW;
        let body = match view.state() {
            ViewState::Loading => {
                self.charts.clear();
                loading(kind.noun())
            }
            ViewState::Error(message) => {
                self.charts.clear();
                error_box(message)
            }
            ViewState::Content(records) => self.content(view, records),
        };
        html! {
            section.view id={ "view-" (kind.to_string()) } {
                h1.mb-4 { (kind.title()) }
                (body)
            }
        }
    }

    /// The view as a complete HTML document.
    pub fn document<R: Record>(&mut self, view: &View<R>) -> String {
        let body = self.render(view);
        page(R::VIEW.title(), body).into_string()
    }

    /// The bank overview as an HTML fragment.
    pub fn render_overview(&mut self, state: &ViewState<Overview>) -> Markup {
        let body = match state {
            ViewState::Loading => {
                self.charts.clear();
                loading("Daten")
            }
            ViewState::Error(message) => {
                self.charts.clear();
                error_box(message)
            }
            ViewState::Content(overview) => {
                let charts = self.draw(vec![overview.dashboard.chart()]);
                let recent: Vec<_> = overview.recent.iter().collect();
                html! {
                    (kpi_row(&overview.dashboard.kpis()))
                    @for chart in &charts { (chart) }
                    h2.h5.mt-4 { "Letzte Transaktionen" }
                    @if recent.is_empty() {
                        p.empty-state { "Keine Transaktionen vorhanden" }
                    } @else {
                        (table(&recent, &BTreeMap::new()))
                    }
                }
            }
        };
        html! {
            section.view id="view-overview" {
                h1.mb-4 { "Bankenspiegel" }
                (body)
            }
        }
    }

    pub fn overview_document(&mut self, state: &ViewState<Overview>) -> String {
        let body = self.render_overview(state);
        page("Bankenspiegel", body).into_string()
    }

    fn content<R: Record>(&mut self, view: &View<R>, records: &[R]) -> Markup {
        let kind = R::VIEW;
        let Some(derived) = view.derive() else {
            return html! {};
        };
        debug!(
            "Rendering {} of {} {} (page {} of {})",
            derived.rows().len(),
            derived.filtered.len(),
            kind.noun(),
            derived.page.current,
            derived.page.total_pages
        );

        let mut kpis = summary_kpis(kind.summary_labels(), &derived.summary);
        kpis.extend(R::highlights(view.context(), records, &derived.filtered));

        let specs = if derived.filtered.is_empty() {
            Vec::new()
        } else {
            R::charts(view.context(), &derived.filtered)
                .into_iter()
                .filter(|spec| !spec.is_empty())
                .collect()
        };
        let charts = self.draw(specs);
        let sections: Vec<Section> = R::sections(view.context())
            .into_iter()
            .filter(|section| !section.rows.is_empty())
            .collect();

        let group_counts: BTreeMap<String, usize> =
            group_by(derived.filtered.iter().copied(), |r| r.group_key(), "")
                .into_iter()
                .map(|(key, group)| (key, group.count))
                .collect();

        let rows = derived.rows();
        html! {
            (kpi_row(&kpis))
            @if !charts.is_empty() {
                div.row.charts {
                    @for chart in &charts {
                        div.col-md-6 { (chart) }
                    }
                }
            }
            @for section in &sections { (section_table(section)) }
            @if rows.is_empty() {
                p.empty-state { "Keine " (kind.noun()) " gefunden" }
            } @else {
                p.text-muted.info { (derived.page.range_label()) " " (kind.noun()) }
                (table(rows, &group_counts))
            }
            (pagination(&derived.page))
            @if let Some(at) = view.loaded_at() {
                p.text-muted.small.stand { "Stand: " (format::timestamp(at)) }
            }
        }
    }

    /// Binds `specs` to their canvases and releases charts no longer drawn.
    fn draw(&mut self, specs: Vec<ChartSpec>) -> Vec<Markup> {
        let keep: BTreeSet<String> = specs.iter().map(|s| s.canvas.clone()).collect();
        self.charts.retain(&keep);
        specs
            .into_iter()
            .map(|spec| self.charts.create(spec).markup())
            .collect()
    }
}

fn summary_kpis(labels: SummaryLabels, summary: &Summary) -> Vec<Kpi> {
    let amount = |v: Decimal| {
        if labels.currency {
            format::currency(Some(v))
        } else {
            format::quantity(Some(v))
        }
    };
    let positive_tone = if labels.negative.is_some() {
        Tone::Success
    } else {
        Tone::Primary
    };
    let mut kpis = vec![Kpi::new(
        labels.positive,
        amount(summary.positive),
        positive_tone,
    )];
    if let Some(label) = labels.negative {
        kpis.push(Kpi::new(label, amount(summary.negative), Tone::Danger));
    }
    if let Some(label) = labels.net {
        kpis.push(Kpi::new(
            label,
            amount(summary.net),
            Tone::of_sign(summary.net),
        ));
    }
    kpis.push(Kpi::new(
        labels.count,
        format::count_usize(summary.count),
        Tone::Neutral,
    ));
    kpis
}

fn kpi_row(kpis: &[Kpi]) -> Markup {
    html! {
        div.row.g-3.mb-4.kpis {
            @for kpi in kpis {
                div.col {
                    div.card.kpi-card {
                        div.card-body {
                            h6.text-muted { (kpi.label) }
                            h4 class={ "mb-0 text-" (kpi.tone.to_string()) } { (kpi.value) }
                        }
                    }
                }
            }
        }
    }
}

fn table<R: Record>(rows: &[&R], group_counts: &BTreeMap<String, usize>) -> Markup {
    let columns = R::columns();
    let mut current_group: Option<String> = None;
    let mut body = Vec::with_capacity(rows.len());
    for row in rows {
        let key = row.group_key();
        if key.is_some() && key != current_group {
            if let Some(k) = &key {
                let count = group_counts.get(k).copied().unwrap_or_default();
                body.push(html! {
                    tr.group-header {
                        td colspan=(columns.len()) {
                            (k) " "
                            span.badge.bg-secondary { (count) }
                        }
                    }
                });
            }
            current_group = key;
        }
        let cells = row.cells();
        body.push(html! {
            tr id={ (R::VIEW.to_string()) "-" (row.id()) } {
                @for (column, cell) in columns.iter().zip(&cells) {
                    (column.cell(cell))
                }
            }
        });
    }
    html! {
        div.table-responsive {
            table.table.table-hover.align-middle {
                thead.table-light {
                    tr { @for column in columns { (column.header()) } }
                }
                tbody {
                    @for row in &body { (row) }
                }
            }
        }
    }
}

fn section_table(section: &Section) -> Markup {
    html! {
        div.card.mb-4.section id={ "section-" (section.id) } {
            div.card-header {
                h2.h6.mb-0 {
                    (section.title) " "
                    span.badge.bg-secondary { (section.rows.len()) }
                }
            }
            div.table-responsive {
                table.table.table-sm.mb-0 {
                    thead.table-light {
                        tr { @for column in section.columns { (column.header()) } }
                    }
                    tbody {
                        @for row in &section.rows {
                            tr {
                                @for (column, cell) in section.columns.iter().zip(row) {
                                    (column.cell(cell))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn pagination(page: &Page) -> Markup {
    if !page.has_navigation() {
        return html! {};
    }
    let previous = page.current.saturating_sub(1).max(1);
    let next = (page.current + 1).min(page.total_pages);
    html! {
        nav aria-label="Seitennavigation" {
            ul.pagination.justify-content-center {
                li.page-item.disabled[!page.has_previous()] {
                    a.page-link href={ "?page=" (previous) } { "«" }
                }
                @for n in page.window() {
                    li.page-item.active[n == page.current] {
                        a.page-link href={ "?page=" (n) } { (n) }
                    }
                }
                li.page-item.disabled[!page.has_next()] {
                    a.page-link href={ "?page=" (next) } { "»" }
                }
            }
        }
    }
}

fn loading(noun: &str) -> Markup {
    html! {
        div.text-center.py-4.loading {
            div.spinner-border role="status" {}
            p.mt-2 { "Lade " (noun) "..." }
        }
    }
}

fn error_box(message: &str) -> Markup {
    html! {
        div.alert.alert-danger role="alert" { "Fehler: " (message) }
    }
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="de" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | Portal" }
                link rel="stylesheet" href=(BOOTSTRAP_CSS);
                style { (PreEscaped(STYLE)) }
            }
            body {
                main.container.py-4 { (body) }
                script src=(CHART_JS) {}
                script { (PreEscaped(CHART_BOOTSTRAP)) }
            }
        }
    }
}
