//! Access to the portal backend.
//!
//! Everything goes through the `Backend` trait, which moves raw HTTP exchanges. `DataLoader` bounds
//! each exchange by a timeout and turns the responses into typed records; `submit` posts approval
//! decisions. `HttpBackend` talks to the real portal; `TestBackend` serves seeded data from memory.

mod actions;
mod envelope;
mod http;
mod loader;
mod test_backend;

pub use actions::submit;
pub use loader::DataLoader;
pub use test_backend::TestBackend;

use crate::error::LoadError;
use crate::{Config, Result};
use http::HttpBackend;

/// When this environment variable is set and non-empty, the program uses `TestBackend` instead of
/// the portal.
pub const TEST_MODE_ENV: &str = "PORTAL_DASH_IN_TEST_MODE";

/// Which backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Portal,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Portal,
        }
    }
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves raw requests to the portal. Only transport failures are errors here; HTTP error statuses
/// come back as responses so that the envelope's error message can be reported.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> std::result::Result<RawResponse, LoadError>;

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<RawResponse, LoadError>;
}

/// Creates a loader over the backend for `mode`, bounded by the configured timeout.
pub fn loader(config: &Config, mode: Mode) -> Result<DataLoader> {
    Ok(DataLoader::new(backend(config, mode)?).with_timeout(config.timeout()))
}

/// Creates the backend for `mode`.
pub fn backend(config: &Config, mode: Mode) -> Result<Box<dyn Backend>> {
    match mode {
        Mode::Portal => Ok(Box::new(HttpBackend::new(config)?)),
        Mode::Test => Ok(Box::new(TestBackend::default())),
    }
}
