use crate::render::format;
use chrono::NaiveDate;
use maud::{html, Markup};
use rust_decimal::Decimal;
use serde::Serialize;

/// Colour hint for badges, KPI cards and signed amounts. Serialized names match the CSS classes
/// used by the document stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Primary,
    Success,
    Danger,
    Warning,
    Info,
}

serde_plain::derive_display_from_serialize!(Tone);

impl Tone {
    /// Green for non-negative values, red for negative ones.
    pub fn of_sign(value: Decimal) -> Self {
        if value.is_sign_negative() && !value.is_zero() {
            Tone::Danger
        } else {
            Tone::Success
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    End,
    Center,
}

impl Align {
    fn class(&self) -> Option<&'static str> {
        match self {
            Align::Start => None,
            Align::End => Some("text-end"),
            Align::Center => Some("text-center"),
        }
    }
}

/// A table header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub align: Align,
}

impl Column {
    pub const fn new(title: &'static str) -> Self {
        Self {
            title,
            align: Align::Start,
        }
    }

    pub const fn end(title: &'static str) -> Self {
        Self {
            title,
            align: Align::End,
        }
    }

    pub const fn center(title: &'static str) -> Self {
        Self {
            title,
            align: Align::Center,
        }
    }

    pub(crate) fn header(&self) -> Markup {
        html! { th class=[self.align.class()] { (self.title) } }
    }

    pub(crate) fn cell(&self, cell: &Cell) -> Markup {
        html! { td class=[self.align.class()] { (cell.markup()) } }
    }
}

/// A typed table cell. Each variant knows its placeholder for a missing value so that the same
/// row renders identically as HTML, CSV or a markdown table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(Option<String>),
    /// Monospace text such as an IBAN or VIN.
    Code(Option<String>),
    Date(Option<NaiveDate>),
    Currency(Option<Decimal>),
    /// An amount shown without its sign, with an arrow and colour for the direction.
    Flow(Option<Decimal>),
    Count(Option<i64>),
    Quantity(Option<Decimal>),
    Badge(String, Tone),
    /// Several short entries stacked in one cell.
    Lines(Vec<String>),
}

impl Cell {
    pub fn text(value: Option<&str>) -> Self {
        Cell::Text(value.map(str::to_string))
    }

    pub fn code(value: Option<&str>) -> Self {
        Cell::Code(value.map(str::to_string))
    }

    /// The cell as plain text, used by the CSV and table exports.
    pub fn plain(&self) -> String {
        match self {
            Cell::Text(s) | Cell::Code(s) => format::text(s.as_deref()),
            Cell::Date(d) => format::date(*d),
            Cell::Currency(v) | Cell::Flow(v) => format::currency(*v),
            Cell::Count(n) => format::count(*n),
            Cell::Quantity(v) => format::quantity(*v),
            Cell::Badge(text, _) => text.clone(),
            Cell::Lines(lines) if lines.is_empty() => format::MISSING.to_string(),
            Cell::Lines(lines) => lines.join("; "),
        }
    }

    pub fn markup(&self) -> Markup {
        match self {
            Cell::Code(s) => html! { code { (format::text(s.as_deref())) } },
            Cell::Flow(v) => {
                let value = v.unwrap_or_default();
                let tone = Tone::of_sign(value);
                let arrow = if tone == Tone::Danger { "↓" } else { "↑" };
                html! {
                    span class={ "text-" (tone.to_string()) } {
                        (arrow) " " (format::currency(Some(value.abs())))
                    }
                }
            }
            Cell::Badge(text, tone) => html! { span class={ "badge bg-" (tone.to_string()) } { (text) } },
            Cell::Lines(lines) if !lines.is_empty() => html! {
                @for (i, line) in lines.iter().enumerate() {
                    @if i > 0 { br; }
                    small { (line) }
                }
            },
            other => html! { (other.plain()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_placeholders() {
        assert_eq!(Cell::Text(None).plain(), "-");
        assert_eq!(Cell::Currency(None).plain(), "0,00 €");
        assert_eq!(Cell::Count(None).plain(), "0");
        assert_eq!(Cell::Lines(vec![]).plain(), "-");
    }

    #[test]
    fn test_flow_markup() {
        let expense = Cell::Flow(Some(Decimal::from(-40))).markup().into_string();
        assert_eq!(expense, r#"<span class="text-danger">↓ 40,00 €</span>"#);
        let income = Cell::Flow(Some(Decimal::from(100))).markup().into_string();
        assert_eq!(income, r#"<span class="text-success">↑ 100,00 €</span>"#);
    }

    #[test]
    fn test_text_is_escaped() {
        let cell = Cell::text(Some("<b>Miete</b>"));
        assert_eq!(cell.markup().into_string(), "&lt;b&gt;Miete&lt;/b&gt;");
    }

    #[test]
    fn test_badge() {
        let cell = Cell::Badge("Aktiv".into(), Tone::Success);
        assert_eq!(
            cell.markup().into_string(),
            r#"<span class="badge bg-success">Aktiv</span>"#
        );
    }

    #[test]
    fn test_column_alignment() {
        let col = Column::end("Betrag");
        assert_eq!(
            col.header().into_string(),
            r#"<th class="text-end">Betrag</th>"#
        );
        assert_eq!(Column::new("Datum").header().into_string(), "<th>Datum</th>");
    }

    #[test]
    fn test_tone_display() {
        assert_eq!(Tone::Danger.to_string(), "danger");
    }
}
