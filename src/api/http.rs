//! Implements the `Backend` trait with `reqwest`.

use crate::api::{Backend, RawResponse};
use crate::error::LoadError;
use crate::{Config, Result};
use anyhow::Context;
use reqwest::header::ACCEPT;
use tracing::trace;
use url::Url;

pub(super) struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub(super) fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url().clone(),
        })
    }

    /// Resolves an absolute API path below the base URL, which may itself have a path prefix.
    fn url(&self, path: &str) -> std::result::Result<Url, LoadError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| LoadError::transport(format!("Invalid request path '{path}': {e}")))
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> std::result::Result<RawResponse, LoadError> {
        let url = self.url(path)?;
        trace!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(LoadError::transport)?;
        read(response).await
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<RawResponse, LoadError> {
        let url = self.url(path)?;
        trace!("POST {url} {body}");
        let response = self
            .client
            .post(url)
            .json(body)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(LoadError::transport)?;
        read(response).await
    }
}

async fn read(response: reqwest::Response) -> std::result::Result<RawResponse, LoadError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(LoadError::transport)?;
    trace!("HTTP {status}, {} bytes", body.len());
    Ok(RawResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_url_keeps_base_path() {
        let env = TestEnv::with_base_url("http://portal.local/intern").await;
        let backend = HttpBackend::new(&env.config()).unwrap();
        let url = backend.url("/api/bankenspiegel/konten").unwrap();
        assert_eq!(
            url.as_str(),
            "http://portal.local/intern/api/bankenspiegel/konten"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 on localhost is discard; nothing should be listening.
        let env = TestEnv::with_base_url("http://127.0.0.1:9").await;
        let backend = HttpBackend::new(&env.config()).unwrap();
        let result = backend.get("/api/bankenspiegel/konten", &[]).await;
        assert!(matches!(
            result,
            Err(LoadError::Network { status: None, .. })
        ));
    }
}
