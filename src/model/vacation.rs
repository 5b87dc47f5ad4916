use crate::model::de::{opt_date, opt_decimal, opt_text};
use crate::model::Record;
use crate::render::{format, Cell, Column};
use crate::view::ViewKind;
use crate::Result;
use anyhow::{bail, ensure};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Group heading for requests whose employee has no department.
pub const NO_DEPARTMENT: &str = "Keine Abteilung";

/// A vacation request awaiting the current user's decision, from `/api/vacation/approvals/pending`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRequest {
    #[serde(default, deserialize_with = "opt_text")]
    pub request_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub employee_name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub working_days: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_text")]
    pub vacation_type: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub comment: Option<String>,
}

const COLUMNS: [Column; 6] = [
    Column::new("ID"),
    Column::new("Mitarbeiter"),
    Column::new("Zeitraum"),
    Column::end("Arbeitstage"),
    Column::new("Art"),
    Column::new("Kommentar"),
];

impl Record for VacationRequest {
    const VIEW: ViewKind = ViewKind::Approvals;

    type Context = ();

    fn id(&self) -> String {
        self.request_id.clone().unwrap_or_default()
    }

    fn date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Working days are what the approvals summary adds up.
    fn amount(&self) -> Option<Decimal> {
        self.working_days
    }

    fn category(&self) -> Option<String> {
        self.department.clone()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.employee_name.as_deref(),
            self.comment.as_deref(),
            self.vacation_type.as_deref(),
        ]
    }

    fn group_key(&self) -> Option<String> {
        Some(
            self.department
                .clone()
                .unwrap_or_else(|| NO_DEPARTMENT.to_string()),
        )
    }

    /// Department first so that grouped rows are contiguous, then the earliest start first.
    fn display_order(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.group_key()
            .cmp(&b.group_key())
            .then_with(|| match (a.start_date, b.start_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let period = format!(
            "{} - {}",
            format::date(self.start_date),
            format::date(self.end_date)
        );
        vec![
            Cell::code(self.request_id.as_deref()),
            Cell::text(self.employee_name.as_deref()),
            Cell::Text(Some(period)),
            Cell::Quantity(self.working_days),
            Cell::text(self.vacation_type.as_deref()),
            Cell::text(self.comment.as_deref()),
        ]
    }
}

/// What to do with one or more pending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Approve,
    Reject,
}

serde_plain::derive_display_from_serialize!(Action);
serde_plain::derive_fromstr_from_deserialize!(Action);

/// A validated approve or reject decision, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    action: Action,
    request_ids: Vec<u64>,
    comment: Option<String>,
}

impl Decision {
    /// Validates the decision. A rejection must carry a non-blank reason; an approval comment is
    /// optional and a blank one is dropped.
    pub fn new(action: Action, request_ids: Vec<u64>, comment: Option<String>) -> Result<Self> {
        ensure!(
            !request_ids.is_empty(),
            "At least one request ID is required"
        );
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if action == Action::Reject && comment.is_none() {
            bail!("A reason is required to reject a vacation request");
        }
        Ok(Self {
            action,
            request_ids,
            comment,
        })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn request_ids(&self) -> &[u64] {
        &self.request_ids
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// More than one request goes through the batch endpoint.
    pub fn is_batch(&self) -> bool {
        self.request_ids.len() > 1
    }
}

/// The backend's answer to a submitted decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub action: Action,
    pub request_ids: Vec<u64>,
    /// How many requests the backend reports as processed.
    pub processed: u64,
}

impl DecisionOutcome {
    pub fn message(&self) -> String {
        let verb = match self.action {
            Action::Approve => "genehmigt",
            Action::Reject => "abgelehnt",
        };
        if self.processed == 1 {
            format!("1 Antrag {verb}")
        } else {
            format!("{} Anträge {verb}", self.processed)
        }
    }
}
