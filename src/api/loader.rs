use crate::api::{envelope, Backend, RawResponse};
use crate::config::TIMEOUT_SECS;
use crate::error::LoadError;
use crate::model::Record;
use crate::view::{ContextSource, Endpoint, Loaded};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Fetches a view's collection from the portal and parses it into records.
///
/// There is no caching and no retry. Every call issues one request, and calling again is how a
/// view is refreshed. A request that gets no response within the timeout fails as a transport
/// error.
pub struct DataLoader {
    backend: Box<dyn Backend>,
    timeout: Duration,
}

impl DataLoader {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded(
        &self,
        request: impl Future<Output = Result<RawResponse, LoadError>>,
    ) -> Result<RawResponse, LoadError> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(response) => response,
            Err(_) => Err(LoadError::transport(format!(
                "no response within {}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }

    /// GETs `endpoint` and returns the checked envelope.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Map<String, Value>, LoadError> {
        let response = self
            .bounded(self.backend.get(&endpoint.path, &endpoint.query))
            .await?;
        envelope::open(&response)
    }

    /// GETs `endpoint` and returns the records under its collection key.
    pub async fn load<R>(&self, endpoint: &Endpoint) -> Result<Vec<R>, LoadError>
    where
        R: DeserializeOwned,
    {
        let records = envelope::collection(self.fetch(endpoint).await?, &endpoint.collection)?;
        debug!(
            "Loaded {} rows from '{}' of {}",
            records.len(),
            endpoint.collection,
            endpoint.path
        );
        Ok(records)
    }

    /// Loads the rows of a view together with the figures it shows beside them.
    ///
    /// When the context comes from a second endpoint, both are requested at once and either
    /// failing fails the load. The rows' error is reported first.
    pub async fn load_view<R: Record>(&self, endpoint: &Endpoint) -> Result<Loaded<R>, LoadError> {
        match R::CONTEXT {
            ContextSource::None => Ok(self.load::<R>(endpoint).await?.into()),
            ContextSource::Envelope => {
                let envelope = self.fetch(endpoint).await?;
                let context = envelope::context(&envelope)?;
                let records = envelope::collection(envelope, &endpoint.collection)?;
                debug!("Loaded {} rows with context from {}", records.len(), endpoint.path);
                Ok(Loaded { records, context })
            }
            ContextSource::Path(path) => {
                let context_endpoint = endpoint.with_path(path);
                let (records, context) = tokio::join!(
                    self.load::<R>(endpoint),
                    self.fetch(&context_endpoint)
                );
                let records = records?;
                let context = envelope::context(&context?)?;
                Ok(Loaded { records, context })
            }
        }
    }

    /// GETs `endpoint` and returns the single object under its collection key.
    pub async fn load_object<T>(&self, endpoint: &Endpoint) -> Result<T, LoadError>
    where
        T: DeserializeOwned + Default,
    {
        envelope::object(self.fetch(endpoint).await?, &endpoint.collection)
    }

    /// POSTs `body` to `path` and returns the checked envelope.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Map<String, Value>, LoadError> {
        let response = self.bounded(self.backend.post(path, body)).await?;
        envelope::open(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RawResponse, TestBackend};
    use crate::model::{Account, DashboardOverview, FinancedVehicle, SalesEntry, Transaction};
    use crate::view::ViewKind;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
    }

    #[tokio::test]
    async fn test_load_seeded_accounts() {
        let loader = DataLoader::new(Box::new(TestBackend::default()));
        let accounts: Vec<Account> = loader
            .load(&ViewKind::Accounts.endpoint(today(), &[]))
            .await
            .unwrap();
        assert!(!accounts.is_empty());
        assert!(accounts.iter().any(|a| a.active == Some(false)));
    }

    #[tokio::test]
    async fn test_limit_is_sent() {
        let backend = TestBackend::default();
        let loader = DataLoader::new(Box::new(backend.clone()));
        let endpoint = Endpoint::recent_transactions(2);
        let rows: Vec<Transaction> = loader.load(&endpoint).await.unwrap();
        assert_eq!(rows.len(), 2);
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].1.contains(&("limit".to_string(), "2".to_string())));
    }

    #[tokio::test]
    async fn test_http_500_is_network_error() {
        let backend = TestBackend::default();
        backend.set_response(
            ViewKind::Transactions.path(),
            RawResponse::new(500, "Internal Server Error"),
        );
        let loader = DataLoader::new(Box::new(backend));
        let result = loader
            .load::<Transaction>(&ViewKind::Transactions.endpoint(today(), &[]))
            .await;
        assert_eq!(result.unwrap_err(), LoadError::status(500, ""));
    }

    #[tokio::test]
    async fn test_load_overview_object() {
        let loader = DataLoader::new(Box::new(TestBackend::default()));
        let overview: DashboardOverview = loader.load_object(&Endpoint::overview()).await.unwrap();
        assert!(overview.total_balance.is_some());
        assert!(overview.banks.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let backend = TestBackend::default();
        backend.set_delay(Duration::from_secs(10));
        let loader = DataLoader::new(Box::new(backend)).with_timeout(Duration::from_millis(50));
        let err = loader
            .load::<Account>(&ViewKind::Accounts.endpoint(today(), &[]))
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::transport("no response within 0.05s"));
    }

    #[tokio::test]
    async fn test_financing_context_from_envelope() {
        let loader = DataLoader::new(Box::new(TestBackend::default()));
        let loaded = loader
            .load_view::<FinancedVehicle>(&ViewKind::Financing.endpoint(today(), &[]))
            .await
            .unwrap();
        assert!(!loaded.records.is_empty());
        let totals = loaded.context.totals.unwrap();
        assert!(totals.vehicles.unwrap() > loaded.records.len() as i64);
        assert!(!loaded.context.institutes.is_empty());
        assert!(loaded.context.warnings.iter().any(|w| w.critical));
    }

    #[tokio::test]
    async fn test_sales_summary_uses_same_month() {
        let backend = TestBackend::default();
        let loader = DataLoader::new(Box::new(backend.clone()));
        let endpoint = ViewKind::Sales.endpoint(today(), &[]);
        let loaded = loader.load_view::<SalesEntry>(&endpoint).await.unwrap();
        assert!(!loaded.records.is_empty());
        assert!(!loaded.context.brands.is_empty());
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|(_, query)| query == &endpoint.query));
    }

    #[tokio::test]
    async fn test_failed_summary_fails_the_view() {
        let backend = TestBackend::default();
        backend.set_response(
            "/api/verkauf/auftragseingang/summary",
            RawResponse::new(503, ""),
        );
        let loader = DataLoader::new(Box::new(backend));
        let result = loader
            .load_view::<SalesEntry>(&ViewKind::Sales.endpoint(today(), &[]))
            .await;
        assert_eq!(result.unwrap_err(), LoadError::status(503, ""));
    }
}
