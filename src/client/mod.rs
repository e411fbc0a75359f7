//! Upstream HTTP client for the Oura v2 API.
//!
//! [`OuraApi`] owns the connection pool and the fixed base URL; it hands out
//! an [`OuraClient`] bound to one bearer token. Cloning either is cheap, so a
//! per-request client in token-in-path mode costs no more than the shared
//! process-wide one in env mode.
//!
//! There is no retry, no caching and no timeout beyond reqwest's defaults.
//! Any non-2xx status or transport failure comes back as an [`UpstreamError`].

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::models::{BearerToken, DateRange};

/// Base URL of the Oura v2 REST API
pub const OURA_API_BASE_URL: &str = "https://api.ouraring.com/v2";

/// Errors from the upstream API
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered with a non-success status
    #[error("Oura API returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// The response body was not JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Network(err.to_string())
    }
}

/// Factory for token-bound upstream clients
#[derive(Debug, Clone)]
pub struct OuraApi {
    http: Client,
    base_url: String,
}

impl OuraApi {
    /// Create a factory targeting the Oura API
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_base_url(OURA_API_BASE_URL)
    }

    /// Create a factory targeting another base URL (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind a client to a bearer token
    pub fn client(&self, token: BearerToken) -> OuraClient {
        OuraClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }
}

/// How handlers obtain a client for a call
#[derive(Debug, Clone)]
pub enum TokenBinding {
    /// One client bound at startup, shared by every call
    Process(OuraClient),
    /// A fresh client per call, bound to the token the caller supplied
    PerRequest(OuraApi),
}

impl TokenBinding {
    /// Client for one call. `None` when the binding needs a caller token
    /// and none was supplied.
    pub fn client(&self, token: Option<BearerToken>) -> Option<OuraClient> {
        match self {
            TokenBinding::Process(client) => Some(client.clone()),
            TokenBinding::PerRequest(api) => token.map(|t| api.client(t)),
        }
    }

    /// Whether callers must supply a token
    pub fn requires_caller_token(&self) -> bool {
        matches!(self, TokenBinding::PerRequest(_))
    }
}

/// A successful upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    body: String,
    data: Value,
}

impl UpstreamResponse {
    /// The body exactly as the upstream sent it
    pub fn into_text(self) -> String {
        self.body
    }

    /// The parsed body
    pub fn into_json(self) -> Value {
        self.data
    }
}

/// HTTP client bound to the upstream base URL and one bearer token
#[derive(Debug, Clone)]
pub struct OuraClient {
    http: Client,
    base_url: String,
    token: BearerToken,
}

impl OuraClient {
    /// Build `<base><path>?start_date=..&end_date=..`, leaving out absent dates
    pub fn request_url(&self, path: &str, dates: &DateRange) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

        if !dates.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in dates.query_pairs() {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Issue `GET <base><path>` and return the JSON body
    pub async fn get(
        &self,
        path: &str,
        dates: &DateRange,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.request_url(path, dates)?;
        tracing::debug!(%path, start_date = ?dates.start_date, end_date = ?dates.end_date, "Fetching from Oura API");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to fetch {}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response.text().await?;
        let data = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(UpstreamResponse { body, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn token() -> BearerToken {
        BearerToken::new("test-token").unwrap()
    }

    #[test]
    fn test_default_base_url() {
        let api = OuraApi::new().unwrap();
        assert_eq!(api.base_url(), "https://api.ouraring.com/v2");
    }

    #[test]
    fn test_request_url_without_dates() {
        let client = OuraApi::new().unwrap().client(token());
        let url = client
            .request_url("/usercollection/personal_info", &DateRange::unbounded())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.ouraring.com/v2/usercollection/personal_info"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn test_request_url_with_dates() {
        let client = OuraApi::new().unwrap().client(token());
        let dates = DateRange::new(Some("2024-01-01".into()), Some("2024-01-02".into()));
        let url = client.request_url("/usercollection/sleep", &dates).unwrap();
        assert_eq!(url.query(), Some("start_date=2024-01-01&end_date=2024-01-02"));
    }

    #[test]
    fn test_client_debug_hides_token() {
        let client = OuraApi::new().unwrap().client(token());
        let debug = format!("{:?}", client);
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_token_binding() {
        let api = OuraApi::new().unwrap();

        let process = TokenBinding::Process(api.client(token()));
        assert!(!process.requires_caller_token());
        assert!(process.client(None).is_some());

        let per_request = TokenBinding::PerRequest(api);
        assert!(per_request.requires_caller_token());
        assert!(per_request.client(None).is_none());
        assert!(per_request.client(Some(token())).is_some());
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_dates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/usercollection/daily_sleep")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("end_date".into(), "2024-01-02".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"score":82}],"next_token":null}"#)
            .create_async()
            .await;

        let client = OuraApi::with_base_url(server.url()).unwrap().client(token());
        let dates = DateRange::new(Some("2024-01-01".into()), Some("2024-01-02".into()));
        let response = client
            .get("/usercollection/daily_sleep", &dates)
            .await
            .unwrap();

        assert_eq!(
            response.into_text(),
            r#"{"data":[{"score":82}],"next_token":null}"#
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/usercollection/sleep")
            .with_status(401)
            .with_body(r#"{"detail":"Unauthorized"}"#)
            .create_async()
            .await;

        let client = OuraApi::with_base_url(server.url()).unwrap().client(token());
        let err = client
            .get("/usercollection/sleep", &DateRange::unbounded())
            .await
            .unwrap_err();

        match err {
            UpstreamError::Status { status, path } => {
                assert_eq!(status, 401);
                assert_eq!(path, "/usercollection/sleep");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/usercollection/tag")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = OuraApi::with_base_url(server.url()).unwrap().client(token());
        let err = client
            .get("/usercollection/tag", &DateRange::unbounded())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Parse(_)));
    }

    #[tokio::test]
    async fn test_get_network_error() {
        let client = OuraApi::with_base_url("http://127.0.0.1:1")
            .unwrap()
            .client(token());
        let err = client
            .get("/usercollection/tag", &DateRange::unbounded())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)));
    }
}
