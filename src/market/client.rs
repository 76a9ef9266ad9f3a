use std::time::Duration;

use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{config::ProvidersConfig, error::AppError, market::dto::Timespan};

const NEWS_FROM: &str = "2024-01-01";
const NEWS_TO: &str = "2025-07-10";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("{provider} API key is not configured")]
    MissingApiKey { provider: &'static str },

    #[error("{provider} API returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} base URL is invalid: {reason}")]
    BaseUrl {
        provider: &'static str,
        reason: String,
    },

    #[error("No data found for symbol: {0}")]
    MissingData(String),

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Bad provider answers are a gateway problem; a failed call or missing key is ours.
impl From<MarketError> for AppError {
    fn from(e: MarketError) -> Self {
        match e {
            MarketError::Status { .. } | MarketError::MissingData(_) => {
                AppError::Upstream(e.to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}

/// Thin pass-through client for Polygon.io and Finnhub.
#[derive(Clone)]
pub struct MarketClient {
    http: reqwest::Client,
    config: ProvidersConfig,
}

impl MarketClient {
    pub fn new(config: ProvidersConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build http client")?;
        Ok(Self { http, config })
    }

    fn polygon_key(&self) -> Result<&str, MarketError> {
        self.config
            .polygon_api_key
            .as_deref()
            .ok_or(MarketError::MissingApiKey { provider: "Polygon" })
    }

    fn finnhub_key(&self) -> Result<&str, MarketError> {
        self.config
            .finnhub_api_key
            .as_deref()
            .ok_or(MarketError::MissingApiKey { provider: "Finnhub" })
    }

    async fn get_json(
        &self,
        provider: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, MarketError> {
        let transport = |source| MarketError::Transport { provider, source };

        let resp = request.send().await.map_err(transport)?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            warn!(provider, %status, "provider returned error status");
            return Err(MarketError::Status {
                provider,
                status,
                body,
            });
        }
        resp.json::<Value>().await.map_err(transport)
    }

    /// Reference data for a ticker (`results` object of Polygon's ticker details).
    pub async fn ticker_summary(&self, symbol: &str) -> Result<Value, MarketError> {
        let ticker = symbol.to_uppercase();
        let url = endpoint(
            "Polygon",
            &self.config.polygon_base_url,
            &["v3", "reference", "tickers", &ticker],
        )?;
        let request = self.http.get(url).query(&[("apiKey", self.polygon_key()?)]);
        let mut data = self.get_json("Polygon", request).await?;

        debug!(symbol, "ticker summary fetched");
        match data.get_mut("results") {
            Some(results) => Ok(results.take()),
            None => Err(MarketError::MissingData(symbol.to_string())),
        }
    }

    /// OHLCV aggregates, one bar per `timespan`. A body without `results` is an empty series.
    pub async fn historical_prices(
        &self,
        symbol: &str,
        timespan: Timespan,
        from: &str,
        to: &str,
    ) -> Result<Vec<Value>, MarketError> {
        let url = endpoint(
            "Polygon",
            &self.config.polygon_base_url,
            &["v2", "aggs", "ticker", symbol, "range", "1", timespan.as_str(), from, to],
        )?;
        let request = self.http.get(url).query(&[
            ("adjusted", "true"),
            ("sort", "asc"),
            ("limit", "5000"),
            ("apiKey", self.polygon_key()?),
        ]);
        let data = self.get_json("Polygon", request).await?;

        Ok(match data.get("results") {
            Some(Value::Array(bars)) => bars.clone(),
            _ => Vec::new(),
        })
    }

    pub async fn company_news(&self, symbol: &str) -> Result<Value, MarketError> {
        let url = endpoint(
            "Finnhub",
            &self.config.finnhub_base_url,
            &["api", "v1", "company-news"],
        )?;
        let request = self.http.get(url).query(&[
            ("symbol", symbol),
            ("from", NEWS_FROM),
            ("to", NEWS_TO),
            ("token", self.finnhub_key()?),
        ]);
        self.get_json("Finnhub", request).await
    }
}

/// Appends `segments` to `base`, percent-encoding each one so caller input
/// cannot add path levels or a query string.
fn endpoint(provider: &'static str, base: &str, segments: &[&str]) -> Result<Url, MarketError> {
    let invalid = |reason: String| MarketError::BaseUrl { provider, reason };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Embeddable Yahoo Finance chart page; no request is made.
pub fn chart_url(symbol: &str) -> String {
    format!("https://finance.yahoo.com/chart/{symbol}?p={symbol}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> MarketClient {
        MarketClient::new(ProvidersConfig {
            polygon_api_key: Some("poly-key".into()),
            finnhub_api_key: Some("fh-key".into()),
            polygon_base_url: server.uri(),
            finnhub_base_url: server.uri(),
        })
        .unwrap()
    }

    #[test]
    fn chart_url_points_at_symbol() {
        assert_eq!(
            chart_url("AAPL"),
            "https://finance.yahoo.com/chart/AAPL?p=AAPL"
        );
    }

    #[tokio::test]
    async fn ticker_summary_uppercases_and_unwraps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/AAPL"))
            .and(query_param("apiKey", "poly-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": { "ticker": "AAPL", "name": "Apple Inc." }
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).ticker_summary("aapl").await.unwrap();
        assert_eq!(summary["name"], "Apple Inc.");
    }

    #[tokio::test]
    async fn ticker_summary_without_results_is_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/ZZZZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "OK" })))
            .mount(&server)
            .await;

        let err = client_for(&server).ticker_summary("ZZZZ").await.unwrap_err();
        assert!(matches!(err, MarketError::MissingData(_)));
        assert!(matches!(AppError::from(err), AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn non_200_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/AAPL"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client_for(&server).ticker_summary("AAPL").await.unwrap_err();
        match err {
            MarketError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn historical_prices_builds_range_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/AAPL/range/1/week/2024-01-01/2024-02-01"))
            .and(query_param("adjusted", "true"))
            .and(query_param("sort", "asc"))
            .and(query_param("limit", "5000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "c": 10.0 }, { "c": 12.0 }]
            })))
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .historical_prices("AAPL", Timespan::Week, "2024-01-01", "2024-02-01")
            .await
            .unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[tokio::test]
    async fn historical_prices_without_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resultsCount": 0 })))
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .historical_prices("AAPL", Timespan::Day, "2024-01-01", "2024-01-02")
            .await
            .unwrap();
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn company_news_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/company-news"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("token", "fh-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "headline": "Apple ships", "source": "wire" }
            ])))
            .mount(&server)
            .await;

        let news = client_for(&server).company_news("AAPL").await.unwrap();
        assert_eq!(news[0]["headline"], "Apple ships");
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let client = MarketClient::new(ProvidersConfig {
            polygon_api_key: None,
            finnhub_api_key: None,
            polygon_base_url: "http://127.0.0.1:9".into(),
            finnhub_base_url: "http://127.0.0.1:9".into(),
        })
        .unwrap();

        let err = client.company_news("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketError::MissingApiKey { provider: "Finnhub" }));
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let url = endpoint("Polygon", "https://api.polygon.io", &["v3", "tickers", "A/../B?x=1"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.polygon.io/v3/tickers/A%2F..%2FB%3Fx=1");

        let url = endpoint("Finnhub", "http://127.0.0.1:9/", &["api", "v1"]).unwrap();
        assert_eq!(url.path(), "/api/v1");
    }

    #[tokio::test]
    async fn symbol_cannot_escape_its_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/reference/tickers/BRK%2FA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": { "ticker": "BRK/A" }
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).ticker_summary("brk/a").await.unwrap();
        assert_eq!(summary["ticker"], "BRK/A");
    }
}
