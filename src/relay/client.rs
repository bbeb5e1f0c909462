//! REST client for the order relay
//!
//! Every call returns the decoded body together with the relay's rate-limit
//! headers. Transient failures (connection errors, 429, 5xx except 501) are
//! retried through the shared [`BackoffPolicy`].

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{RelayError, RelayResult};
use super::types::{
    ApiOrderbook, Orderbook, OrderbookQuery, OrdersQuery, PairsQuery, RateLimit, RelayResponse,
    TokenPair,
};
use crate::config::constants;
use crate::order::{ApiOrder, DecodeResult, Order};
use crate::shared::{retry_with_backoff, BackoffPolicy};

const MEDIA_TYPE: &str = "application/json";
const USER_AGENT_VALUE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default number of attempts per request, including the first
pub const DEFAULT_REQUEST_ATTEMPTS: u32 = 5;

/// HTTP request timeout (seconds)
const HTTP_TIMEOUT_SECS: u64 = 10;
/// HTTP connection timeout (milliseconds)
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3000;
/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 5;
/// How long idle connections stay in the pool (seconds)
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 60;

/// Build the pooled HTTP client used for relay requests
pub fn create_http_client() -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
    tracing::info!(
        phase = "init",
        timeout_s = HTTP_TIMEOUT_SECS,
        connect_timeout_ms = HTTP_CONNECT_TIMEOUT_MS,
        pool_max_idle = HTTP_POOL_MAX_IDLE,
        "Relay HTTP client configured"
    );
    client
}

/// Default retry policy for REST calls
pub fn default_request_policy() -> BackoffPolicy {
    BackoffPolicy {
        max_attempts: Some(DEFAULT_REQUEST_ATTEMPTS),
        initial_delay_ms: 500,
        max_delay_ms: 8_000,
        jitter_ms: 200,
    }
}

/// Client for the relay's `/token_pairs`, `/orders` and `/orderbook` endpoints
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    debug: bool,
    retry: BackoffPolicy,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: create_http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            debug: false,
            retry: default_request_policy(),
        }
    }

    /// Client for `RELAY_URL` (or the public relay), logging bodies when `RELAY_DEBUG` is set
    pub fn from_env() -> Self {
        Self::new(constants::relay_url()).with_debug(constants::relay_debug())
    }

    /// Log request URLs and raw response bodies
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_retry(mut self, retry: BackoffPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /token_pairs`
    pub async fn token_pairs(
        &self,
        query: &PairsQuery,
    ) -> RelayResult<RelayResponse<Vec<TokenPair>>> {
        self.get("/token_pairs", query).await
    }

    /// `GET /orders`, every order decoded and validated
    pub async fn orders(&self, query: &OrdersQuery) -> RelayResult<RelayResponse<Vec<Order>>> {
        let raw: RelayResponse<Vec<ApiOrder>> = self.get("/orders", query).await?;
        let orders = raw
            .data
            .iter()
            .map(ApiOrder::to_order)
            .collect::<DecodeResult<Vec<_>>>()
            .map_err(|e| RelayError::Decode {
                path: "/orders".to_string(),
                reason: e.to_string(),
            })?;
        Ok(RelayResponse {
            data: orders,
            rate_limit: raw.rate_limit,
        })
    }

    /// `GET /orderbook`; base and quote are both required
    pub async fn orderbook(&self, query: &OrderbookQuery) -> RelayResult<RelayResponse<Orderbook>> {
        if query.base.is_none() {
            return Err(RelayError::InvalidQuery("missing baseTokenAddress".to_string()));
        }
        if query.quote.is_none() {
            return Err(RelayError::InvalidQuery("missing quoteTokenAddress".to_string()));
        }

        let raw: RelayResponse<ApiOrderbook> = self.get("/orderbook", query).await?;
        let book = raw.data.to_orderbook().map_err(|e| RelayError::Decode {
            path: "/orderbook".to_string(),
            reason: e.to_string(),
        })?;
        Ok(RelayResponse {
            data: book,
            rate_limit: raw.rate_limit,
        })
    }

    async fn get<Q, T>(&self, path: &str, query: &Q) -> RelayResult<RelayResponse<T>>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let label = format!("GET {}", path);
        retry_with_backoff(
            &self.retry,
            &label,
            || self.get_once(path, query),
            RelayError::is_retryable,
        )
        .await
    }

    async fn get_once<Q, T>(&self, path: &str, query: &Q) -> RelayResult<RelayResponse<T>>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .http
            .get(&url)
            .query(query)
            .header(CONTENT_TYPE, MEDIA_TYPE)
            .header(ACCEPT, MEDIA_TYPE)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .build()?;

        if self.debug {
            tracing::info!(method = "GET", url = %request.url(), "Relay request");
        }

        let response = self.http.execute(request).await?;
        let status = response.status();
        let rate_limit = RateLimit::from_headers(response.headers());
        let body = response.text().await?;

        if self.debug {
            tracing::info!(status = status.as_u16(), body = %body, "Relay response");
        }
        tracing::debug!(
            path,
            status = status.as_u16(),
            rate_remaining = ?rate_limit.remaining,
            "Relay call completed"
        );

        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data = serde_json::from_str(&body).map_err(|e| RelayError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(RelayResponse { data, rate_limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::json::tests::SAMPLE_ORDER_JSON;
    use crate::order::Address;
    use mockito::Matcher;

    fn fast_retry() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: Some(3),
            initial_delay_ms: 1,
            max_delay_ms: 5,
            jitter_ms: 0,
        }
    }

    fn client(server: &mockito::ServerGuard) -> RelayClient {
        RelayClient::new(server.url()).with_retry(fast_retry())
    }

    #[tokio::test]
    async fn test_orders_decodes_and_reads_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let maker = Address::from_bytes([0x8a; 20]);

        let mock = server
            .mock("GET", "/orders")
            .match_query(Matcher::UrlEncoded("maker".into(), maker.to_hex()))
            .match_header("accept", MEDIA_TYPE)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("X-RateLimit-Limit", "60")
            .with_header("X-RateLimit-Remaining", "59")
            .with_header("X-RateLimit-Reset", "1518201120")
            .with_body(format!("[{}]", SAMPLE_ORDER_JSON))
            .create_async()
            .await;

        let query = OrdersQuery {
            maker: Some(maker),
            ..Default::default()
        };
        let response = client(&server).orders(&query).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].terms().salt.to_string().len(), 77);
        assert_eq!(response.rate_limit.limit, Some(60));
        assert_eq!(response.rate_limit.remaining, Some(59));
        assert_eq!(response.rate_limit.reset.map(|t| t.timestamp()), Some(1518201120));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_orders_with_bad_order_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let bad = SAMPLE_ORDER_JSON.replace("\"takerFee\": \"0\"", "\"takerFee\": \"-1\"");
        let _mock = server
            .mock("GET", "/orders")
            .with_status(200)
            .with_body(format!("[{}]", bad))
            .create_async()
            .await;

        match client(&server).orders(&OrdersQuery::default()).await {
            Err(RelayError::Decode { path, reason }) => {
                assert_eq!(path, "/orders");
                assert!(reason.contains("takerFee"), "{}", reason);
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_orderbook_sends_both_addresses() {
        let mut server = mockito::Server::new_async().await;
        let base = Address::from_bytes([0xe4; 20]);
        let quote = Address::from_bytes([0x29; 20]);

        let mock = server
            .mock("GET", "/orderbook")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("baseTokenAddress".into(), base.to_hex()),
                Matcher::UrlEncoded("quoteTokenAddress".into(), quote.to_hex()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"bids":[{o}],"asks":[{o},{o}]}}"#,
                o = SAMPLE_ORDER_JSON
            ))
            .create_async()
            .await;

        let book = client(&server)
            .orderbook(&OrderbookQuery::new(base, quote))
            .await
            .unwrap()
            .data;
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_orderbook_rejects_missing_addresses_without_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/orderbook")
            .expect(0)
            .create_async()
            .await;

        let only_base = OrderbookQuery {
            base: Some(Address::from_bytes([1; 20])),
            quote: None,
        };
        let err = client(&server).orderbook(&only_base).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidQuery(ref m) if m.contains("quoteTokenAddress")));

        let err = client(&server)
            .orderbook(&OrderbookQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidQuery(ref m) if m.contains("baseTokenAddress")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/token_pairs")
            .with_status(503)
            .with_body("busy")
            .expect(3)
            .create_async()
            .await;

        let err = client(&server)
            .token_pairs(&PairsQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Status { status: 503, .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/token_pairs")
            .with_status(400)
            .with_body("bad token")
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .token_pairs(&PairsQuery::default())
            .await
            .unwrap_err();
        match err {
            RelayError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad token");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_pairs_decodes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/token_pairs")
            .match_query(Matcher::UrlEncoded(
                "tokenA".into(),
                "0xe41d2489571d322189246dafa5ebde1f4699f498".into(),
            ))
            .with_status(200)
            .with_body(
                r#"[{
                    "tokenA": {"address": "0xe41d2489571d322189246dafa5ebde1f4699f498", "minAmount": "1", "maxAmount": "100", "precision": 5},
                    "tokenB": {"address": "0x2956356cd2a2bf3202f771f50d3d14a367b48070", "minAmount": "1", "maxAmount": "100", "precision": 5}
                }]"#,
            )
            .create_async()
            .await;

        let query = PairsQuery {
            token_a: Some("0xe41d2489571d322189246dafa5ebde1f4699f498".parse().unwrap()),
            token_b: None,
        };
        let pairs = client(&server).token_pairs(&query).await.unwrap().data;
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].token_b.precision, 5);
        assert_eq!(pairs[0].token_a.max_amount.to_string(), "100");
    }
}
