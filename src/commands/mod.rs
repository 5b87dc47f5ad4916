//! Command handlers for the portal-dash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod decide;
mod init;
mod overview;
mod show;
mod watch;

use crate::export::{Format, Rows};
use crate::paginate::Page;
use crate::{utils, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use decide::decide;
pub use init::init;
pub use overview::overview;
pub use show::show;
pub use watch::watch;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data describing what it did.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// What a rendering command wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// `overview` or the name of the view.
    pub view: String,
    pub format: Format,
    /// The page that was written, absent for the overview and for failed loads.
    pub page: Option<Page>,
    /// The file written to, absent when writing to stdout.
    pub out: Option<PathBuf>,
}

impl Report {
    fn message(&self) -> String {
        let what = match &self.page {
            Some(page) => format!("{}: {}", self.view, page.range_label()),
            None => self.view.clone(),
        };
        match &self.out {
            Some(path) => format!("{what}, written to {}", path.display()),
            None => what,
        }
    }
}

/// Writes `rows` to `out`, creating its parent directory, or to stdout if `out` is `None`.
async fn emit(rows: &Rows, out: Option<&Path>) -> Result<()> {
    let mut text = rows.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match out {
        Some(path) => utils::write_creating_parent(path, text).await,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
