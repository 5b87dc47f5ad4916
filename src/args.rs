//! These structs provide the CLI interface for portal-dash.

use crate::export::Format;
use crate::filter::{Direction, FilterState, Status};
use crate::view::ViewKind;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// portal-dash: Dashboards of the business portal on the command line.
///
/// The portal's backend serves bank accounts and their bookings, vehicle financing, sales figures
/// and pending vacation requests as JSON. This program fetches them, filters, totals and pages
/// them, and renders the result as an HTML page with tables and charts, or as JSON, CSV or a
/// markdown table.
///
/// Run `portal-dash init --base-url <URL>` once to point it at your portal.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and its configuration file.
    ///
    /// This is the first command you should run. By default the home directory is
    /// $HOME/portal-dash; pass --home or set PORTAL_DASH_HOME to put it somewhere else.
    Init(InitArgs),
    /// Load one view, filter and page it, and write it once.
    Show(ShowArgs),
    /// Load one view and write it again on every refresh until interrupted with Ctrl-C.
    Watch(WatchArgs),
    /// Show the bank overview with its key figures and the latest bookings.
    Overview(OverviewArgs),
    /// Approve one or more pending vacation requests.
    Approve(DecisionArgs),
    /// Reject one or more pending vacation requests. A reason is required.
    Reject(DecisionArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and reports are held. Defaults to ~/portal-dash
    #[arg(long, env = "PORTAL_DASH_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `portal-dash init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The root URL of the portal, e.g. http://portal.local
    #[arg(long)]
    base_url: String,
}

impl InitArgs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Filter controls shared by `show` and `watch`. All of them are optional and combine with AND.
#[derive(Debug, Parser, Clone, Default)]
pub struct FilterArgs {
    /// Earliest date to include, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest date to include, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only rows in this category: the account ID for transactions, the bank for accounts, the
    /// department for approvals and the institute for financing
    #[arg(long)]
    category: Option<String>,

    /// Case-insensitive text to look for in the descriptive fields
    #[arg(long)]
    search: Option<String>,

    /// Only money coming in or going out
    #[arg(long, value_enum)]
    direction: Option<Direction>,

    /// Only active or inactive accounts
    #[arg(long, value_enum)]
    status: Option<Status>,
}

impl FilterArgs {
    pub fn to_state(&self) -> FilterState {
        FilterState {
            from: self.from,
            to: self.to,
            category: self.category.clone(),
            query: self.search.clone(),
            direction: self.direction,
            status: self.status,
        }
    }
}

/// Extra query parameters such as `konto_id=3` or `month=9`, passed to the backend as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param(pub String, pub String);

impl FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Param(key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(format!("expected key=value, got '{s}'")),
        }
    }
}

fn to_query(params: &[Param]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|Param(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// (Not shown): Args for the `portal-dash show` command.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Which view to show
    #[arg(value_enum)]
    view: ViewKind,

    #[clap(flatten)]
    filters: FilterArgs,

    /// The page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Rows per page, defaults to page_size from config.json
    #[arg(long)]
    page_size: Option<usize>,

    /// Extra query parameter for the backend as key=value. May be repeated.
    #[arg(long = "param")]
    params: Vec<Param>,

    /// The output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ShowArgs {
    pub fn new(view: ViewKind, filters: FilterArgs, format: Format) -> Self {
        Self {
            view,
            filters,
            page: 1,
            page_size: None,
            params: Vec::new(),
            format,
            out: None,
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    pub fn params(&self) -> Vec<(String, String)> {
        to_query(&self.params)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// (Not shown): Args for the `portal-dash watch` command.
#[derive(Debug, Parser, Clone)]
pub struct WatchArgs {
    /// Which view to watch
    #[arg(value_enum)]
    view: ViewKind,

    #[clap(flatten)]
    filters: FilterArgs,

    /// Rows per page, defaults to page_size from config.json
    #[arg(long)]
    page_size: Option<usize>,

    /// Extra query parameter for the backend as key=value. May be repeated.
    #[arg(long = "param")]
    params: Vec<Param>,

    /// Seconds between refreshes, defaults to refresh_secs from config.json
    #[arg(long)]
    interval: Option<u64>,

    /// The output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// The file to rewrite on every refresh. Defaults to <view>.<format> in the reports directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl WatchArgs {
    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    pub fn params(&self) -> Vec<(String, String)> {
        to_query(&self.params)
    }

    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// (Not shown): Args for the `portal-dash overview` command.
#[derive(Debug, Parser, Clone)]
pub struct OverviewArgs {
    /// The output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

impl OverviewArgs {
    pub fn new(format: Format, out: Option<PathBuf>) -> Self {
        Self { format, out }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// (Not shown): Args for the `portal-dash approve` and `portal-dash reject` commands.
#[derive(Debug, Parser, Clone)]
pub struct DecisionArgs {
    /// The IDs of the vacation requests
    #[arg(required = true)]
    ids: Vec<u64>,

    /// A comment for the employee. Required when rejecting.
    #[arg(long)]
    comment: Option<String>,
}

impl DecisionArgs {
    pub fn new(ids: Vec<u64>, comment: Option<String>) -> Self {
        Self { ids, comment }
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("portal-dash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or PORTAL_DASH_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("portal-dash")
        }
    })
}

#[derive(
    Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show() {
        let args = Args::try_parse_from([
            "portal-dash",
            "--home",
            "/tmp/pd",
            "show",
            "transactions",
            "--from",
            "2025-10-01",
            "--direction",
            "expense",
            "--param",
            "konto_id=3",
            "--format",
            "csv",
            "--page",
            "2",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/pd"));
        let Command::Show(show) = args.command() else {
            panic!("expected show");
        };
        assert_eq!(show.view(), ViewKind::Transactions);
        assert_eq!(show.page(), 2);
        assert_eq!(show.format(), Format::Csv);
        assert_eq!(
            show.params(),
            vec![("konto_id".to_string(), "3".to_string())]
        );
        let state = show.filters().to_state();
        assert_eq!(state.from, NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(state.direction, Some(Direction::Expense));
        assert!(state.to.is_none());
    }

    #[test]
    fn test_bad_param_is_rejected() {
        let result = Args::try_parse_from(["portal-dash", "show", "sales", "--param", "month"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_needs_ids() {
        assert!(Args::try_parse_from(["portal-dash", "reject", "--comment", "x"]).is_err());
        let args =
            Args::try_parse_from(["portal-dash", "reject", "7", "8", "--comment", "Sperre"])
                .unwrap();
        let Command::Reject(reject) = args.command() else {
            panic!("expected reject");
        };
        assert_eq!(reject.ids(), &[7, 8]);
    }

    #[test]
    fn test_param_value_may_contain_equals() {
        let param: Param = "q=a=b".parse().unwrap();
        assert_eq!(param, Param("q".into(), "a=b".into()));
    }
}
