//! Chart descriptions and the registry that owns the live chart objects.
//!
//! A chart is bound to a named canvas. The HTML document carries a `<canvas>` element together
//! with the chart configuration as embedded JSON, and a small bootstrap script hands each
//! configuration to Chart.js. On every render the registry releases the chart previously bound to
//! a canvas before binding a new one, so re-rendering never accumulates chart instances.

use maud::{html, Markup, PreEscaped};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

const PALETTE: [&str; 8] = [
    "#0d6efd", "#198754", "#dc3545", "#ffc107", "#0dcaf0", "#6f42c1", "#fd7e14", "#20c997",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

impl Dataset {
    /// A dataset with one palette colour per data point.
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        let colors = (0..data.len())
            .map(|i| PALETTE[i % PALETTE.len()].to_string())
            .collect();
        Self {
            label: label.into(),
            data,
            colors,
        }
    }

    /// A dataset drawn in a single colour.
    pub fn single(label: impl Into<String>, data: Vec<f64>, color: &str) -> Self {
        let colors = vec![color.to_string(); data.len()];
        Self {
            label: label.into(),
            data,
            colors,
        }
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub canvas: String,
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSpec {
    pub fn new(canvas: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            canvas: canvas.into(),
            title: title.into(),
            kind,
            labels: Vec::new(),
            datasets: Vec::new(),
        }
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.push(dataset);
        self
    }

    /// A chart with nothing to draw is not rendered.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.datasets.iter().all(|d| d.data.is_empty())
    }

    /// The Chart.js configuration object.
    pub fn config(&self) -> serde_json::Value {
        let datasets: Vec<_> = self
            .datasets
            .iter()
            .map(|d| {
                json!({
                    "label": d.label,
                    "data": d.data,
                    "backgroundColor": d.colors,
                })
            })
            .collect();
        let legend = self.kind != ChartKind::Bar;
        json!({
            "type": self.kind,
            "data": { "labels": self.labels, "datasets": datasets },
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": {
                    "title": { "display": true, "text": self.title },
                    "legend": { "display": legend },
                },
            },
        })
    }
}

/// A live chart bound to a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartHandle {
    serial: u64,
    spec: ChartSpec,
}

impl ChartHandle {
    /// Monotonic creation number. Not part of the markup.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn markup(&self) -> Markup {
        // `</` inside a script element would end it early.
        let config = self.spec.config().to_string().replace("</", "<\\/");
        html! {
            div.chart-container {
                canvas id=(self.spec.canvas) {}
                script type="application/json" data-chart-for=(self.spec.canvas) {
                    (PreEscaped(config))
                }
            }
        }
    }
}

/// Owns the charts of one rendered view, at most one per canvas.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    live: BTreeMap<String, ChartHandle>,
    created: u64,
    released: u64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new chart to `spec.canvas`, releasing whatever chart was bound there before.
    pub fn create(&mut self, spec: ChartSpec) -> &ChartHandle {
        if let Some(previous) = self.live.remove(&spec.canvas) {
            self.release(previous);
        }
        self.created += 1;
        trace!("Creating chart #{} on canvas '{}'", self.created, spec.canvas);
        let canvas = spec.canvas.clone();
        self.live.entry(canvas).or_insert(ChartHandle {
            serial: self.created,
            spec,
        })
    }

    /// Releases the charts whose canvas is not in `keep`. A re-render that no longer draws a chart
    /// (for example because the filter left nothing to plot) must not leave it alive.
    pub fn retain(&mut self, keep: &BTreeSet<String>) {
        let stale: Vec<String> = self
            .live
            .keys()
            .filter(|canvas| !keep.contains(*canvas))
            .cloned()
            .collect();
        for canvas in stale {
            if let Some(handle) = self.live.remove(&canvas) {
                self.release(handle);
            }
        }
    }

    /// Releases every chart.
    pub fn clear(&mut self) {
        self.retain(&BTreeSet::new());
    }

    fn release(&mut self, handle: ChartHandle) {
        trace!(
            "Releasing chart #{} on canvas '{}'",
            handle.serial,
            handle.spec.canvas
        );
        self.released += 1;
    }

    pub fn get(&self, canvas: &str) -> Option<&ChartHandle> {
        self.live.get(canvas)
    }

    /// The number of charts currently alive.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(canvas: &str) -> ChartSpec {
        ChartSpec::new(canvas, "Test", ChartKind::Bar)
            .labels(vec!["a".into(), "b".into()])
            .dataset(Dataset::new("Werte", vec![1.0, 2.0]))
    }

    #[test]
    fn test_create_releases_previous_on_same_canvas() {
        let mut registry = ChartRegistry::new();
        registry.create(spec("flow"));
        registry.create(spec("flow"));
        registry.create(spec("flow"));
        assert_eq!(registry.live(), 1);
        assert_eq!(registry.created(), 3);
        assert_eq!(registry.released(), 2);
        assert_eq!(registry.get("flow").unwrap().serial(), 3);
    }

    #[test]
    fn test_distinct_canvases_coexist() {
        let mut registry = ChartRegistry::new();
        registry.create(spec("a"));
        registry.create(spec("b"));
        assert_eq!(registry.live(), 2);
        assert_eq!(registry.released(), 0);
    }

    #[test]
    fn test_retain_releases_stale() {
        let mut registry = ChartRegistry::new();
        registry.create(spec("a"));
        registry.create(spec("b"));
        let keep: BTreeSet<String> = ["b".to_string()].into_iter().collect();
        registry.retain(&keep);
        assert_eq!(registry.live(), 1);
        assert!(registry.get("a").is_none());
        assert_eq!(registry.released(), 1);
        registry.clear();
        assert_eq!(registry.live(), 0);
        assert_eq!(registry.released(), 2);
    }

    #[test]
    fn test_markup_is_independent_of_serial() {
        let mut registry = ChartRegistry::new();
        let first = registry.create(spec("flow")).markup().into_string();
        let second = registry.create(spec("flow")).markup().into_string();
        assert_eq!(first, second);
        assert!(first.contains(r#"<canvas id="flow"></canvas>"#));
        assert!(first.contains(r#""type":"bar""#));
    }

    #[test]
    fn test_script_close_is_escaped() {
        let chart = ChartSpec::new("x", "</script><b>", ChartKind::Pie)
            .labels(vec!["a".into()])
            .dataset(Dataset::new("d", vec![1.0]));
        let mut registry = ChartRegistry::new();
        let markup = registry.create(chart).markup().into_string();
        assert!(!markup.contains("</script><b>"));
    }

    #[test]
    fn test_is_empty() {
        assert!(ChartSpec::new("x", "t", ChartKind::Pie).is_empty());
        assert!(!spec("x").is_empty());
    }
}
