use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::catalog::MarketEndpoint;
use crate::errors::{ToolError, ToolResult};

pub const ALPHA_VANTAGE_HOST: &str = "https://www.alphavantage.co";

#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub host: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl MarketDataConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: ALPHA_VANTAGE_HOST.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Thin client over the Alpha Vantage `query` endpoint
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    client: Client,
    config: MarketDataConfig,
}

impl MarketDataClient {
    pub fn new(config: MarketDataConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Issue one GET for `endpoint` and return the body as compact JSON text.
    ///
    /// Key order of the upstream document is preserved. A non-2xx status
    /// becomes [`ToolError::Upstream`] carrying the reason phrase.
    pub async fn fetch(&self, endpoint: &MarketEndpoint, search_query: &str) -> ToolResult<String> {
        let url = format!("{}/query", self.config.host.trim_end_matches('/'));
        let mut query = endpoint.query_pairs(search_query);
        query.push(("apikey", self.config.api_key.as_str()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status_code: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .map(String::from)
                    .unwrap_or_else(|| status.as_str().to_string()),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidPayload(e.to_string()))?;
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::lookup;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_client() -> (MockServer, MarketDataClient) {
        let mock_server = MockServer::start().await;
        let config = MarketDataConfig {
            host: mock_server.uri(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        };
        (mock_server, MarketDataClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_reserializes_body() {
        let (mock_server, client) = setup_client().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("apikey", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"price": 123.45}"#, "application/json"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let output = client
            .fetch(lookup("stock_quote").unwrap(), "AAPL")
            .await
            .unwrap();
        assert_eq!(output, r#"{"price":123.45}"#);
    }

    #[tokio::test]
    async fn test_fetch_keeps_key_order() {
        let (mock_server, client) = setup_client().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"Meta Data": {"2. Symbol": "IBM"}, "Error": null, "Alpha": 1}"#,
                "application/json",
            ))
            .mount(&mock_server)
            .await;

        let output = client
            .fetch(lookup("stock_trend_monthly").unwrap(), "IBM")
            .await
            .unwrap();
        assert_eq!(
            output,
            r#"{"Meta Data":{"2. Symbol":"IBM"},"Error":null,"Alpha":1}"#
        );
    }

    #[tokio::test]
    async fn test_fetch_upstream_failure() {
        let (mock_server, client) = setup_client().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = client
            .fetch(lookup("company_overview").unwrap(), "AAPL")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Upstream {
                status_code: 500,
                reason: "Internal Server Error".to_string()
            }
        );
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_fetch_non_json_body() {
        let (mock_server, client) = setup_client().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&mock_server)
            .await;

        let err = client
            .fetch(lookup("stock_quote").unwrap(), "AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let config = MarketDataConfig {
            // Nothing listens on the discard port
            host: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        };
        let client = MarketDataClient::new(config).unwrap();

        let err = client
            .fetch(lookup("stock_quote").unwrap(), "AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Transport(_)));
    }
}
