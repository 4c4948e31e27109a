//! Marketstack API 클라이언트.
//!
//! 모든 엔드포인트는 같은 응답 envelope를 사용합니다:
//!
//! ```json
//! { "pagination": { "limit": 1000, "offset": 0, "count": 1000, "total": 2300 },
//!   "data": [ ... ] }
//! ```
//!
//! 클라이언트는 한 페이지만 가져오고, 페이지 순회는 [`PaginatedFetcher`]가 담당합니다.
//!
//! [`PaginatedFetcher`]: super::PaginatedFetcher

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DataError, Result};

/// 기본 API 주소.
pub const DEFAULT_BASE_URL: &str = "http://api.marketstack.com/v1";
/// 페이지 크기 기본값 (업스트림 최대치).
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;
/// offset 상한 기본값.
pub const DEFAULT_MAX_PAGES: u64 = 1000;
/// 요청당 심볼 수 상한 (업스트림 제한).
pub const DEFAULT_MAX_SYMBOLS: usize = 100;

/// 페이지네이션 메타데이터.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub count: Option<u64>,
    /// 서버가 보고한 전체 레코드 수
    #[serde(default)]
    pub total: u64,
}

/// 업스트림 에러 본문.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 응답 한 페이지.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl Page {
    /// 레코드 배열을 꺼냅니다.
    ///
    /// `exchanges/{mic}/eod`처럼 `data.eod` 아래에 배열이 중첩된 응답도 처리합니다.
    pub fn into_records(self) -> Vec<Value> {
        match self.data {
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut obj)) => match obj.remove("eod") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// 페이지 단위 업스트림.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// `endpoint`의 한 페이지를 가져옵니다.
    async fn get_page(
        &self,
        endpoint: &str,
        limit: u64,
        offset: u64,
        extra_params: &[(String, String)],
    ) -> Result<Page>;
}

/// Marketstack 설정.
#[derive(Debug, Clone)]
pub struct MarketstackConfig {
    pub base_url: String,
    pub api_key: SecretString,
    /// 페이지 크기
    pub page_limit: u64,
    /// offset 상한 (업스트림 페이지네이션 버그로 인한 무한 루프 방지)
    pub max_pages: u64,
    /// 요청당 심볼 수
    pub max_symbols: usize,
}

impl MarketstackConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            page_limit: DEFAULT_PAGE_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Marketstack HTTP 클라이언트.
#[derive(Clone)]
pub struct MarketstackClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl MarketstackClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: &MarketstackConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PageSource for MarketstackClient {
    async fn get_page(
        &self,
        endpoint: &str,
        limit: u64,
        offset: u64,
        extra_params: &[(String, String)],
    ) -> Result<Page> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        tracing::debug!(endpoint = endpoint, offset, limit, "Marketstack API 요청");

        let limit = limit.to_string();
        let offset = offset.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("access_key", self.api_key.expose_secret()),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];
        query.extend(extra_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = self.client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::FetchError(format!(
                "Marketstack API 오류 [{}]: {} - {}",
                endpoint, status, body
            )));
        }

        let page: Page = response.json().await?;

        if let Some(err) = &page.error {
            return Err(DataError::FetchError(format!(
                "Marketstack API 오류 [{}]: {} - {}",
                endpoint,
                err.code.as_deref().unwrap_or("unknown"),
                err.message.as_deref().unwrap_or_default()
            )));
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> MarketstackClient {
        let config = MarketstackConfig::new(SecretString::from("test-key".to_string())).with_base_url(server.url());
        MarketstackClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_page_sends_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/eod/2024-01-02")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("access_key".into(), "test-key".into()),
                Matcher::UrlEncoded("limit".into(), "1000".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("symbols".into(), "AAPL,MSFT".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"pagination":{"limit":1000,"offset":0,"count":2,"total":2},
                    "data":[{"symbol":"AAPL"},{"symbol":"MSFT"}]}"#,
            )
            .create_async()
            .await;

        let page = client_for(&server)
            .get_page(
                "eod/2024-01-02",
                1000,
                0,
                &[("symbols".to_string(), "AAPL,MSFT".to_string())],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.pagination.as_ref().map(|p| p.total), Some(2));
        assert_eq!(page.into_records().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/eod/latest")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":{"code":"invalid_access_key","message":"bad key"}}"#)
            .create_async()
            .await;

        let result = client_for(&server).get_page("eod/latest", 1000, 0, &[]).await;
        assert!(matches!(result, Err(DataError::FetchError(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_error_body_with_ok_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tickers")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":{"code":"usage_limit_reached","message":"limit"}}"#)
            .create_async()
            .await;

        let result = client_for(&server).get_page("tickers", 1000, 0, &[]).await;
        assert!(matches!(result, Err(DataError::FetchError(msg)) if msg.contains("usage_limit_reached")));
    }

    #[test]
    fn test_nested_eod_records() {
        let page: Page = serde_json::from_str(
            r#"{"data":{"name":"NASDAQ","eod":[{"symbol":"AAPL"}]},"pagination":{"total":1}}"#,
        )
        .unwrap();
        assert_eq!(page.into_records().len(), 1);
    }
}
