//! seed용 참조 데이터 조회.
//!
//! Marketstack의 `timezones`, `currencies`, `exchanges`, `tickers` 엔드포인트를 조회합니다.
//! 국가와 도시는 별도 엔드포인트가 없어 거래소 목록에서 추출합니다.

use serde::Deserialize;

use super::pagination::PaginatedFetcher;
use crate::error::Result;

/// 지수 전용 가상 거래소 이름 (seed 대상에서 제외).
pub const INDEX_EXCHANGE: &str = "INDEX";

/// 업스트림 타임존.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiTimezone {
    pub timezone: String,
    #[serde(default)]
    pub abbr: Option<String>,
    #[serde(default)]
    pub abbr_dst: Option<String>,
}

/// 업스트림 통화.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiCurrency {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// 업스트림 거래소.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiExchange {
    pub name: String,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub timezone: Option<ApiTimezone>,
}

/// 종목이 속한 거래소 요약.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiTickerExchange {
    pub name: String,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
}

/// 업스트림 종목.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiTicker {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stock_exchange: Option<ApiTickerExchange>,
}

/// 거래소 목록에서 추출한 국가.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCountry {
    pub name: String,
    pub code: Option<String>,
}

/// 거래소 목록에서 추출한 도시.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCity {
    pub name: String,
    pub country: String,
}

pub async fn fetch_timezones(fetcher: &PaginatedFetcher) -> Result<Vec<ApiTimezone>> {
    tracing::info!("Marketstack 타임존 목록 조회");
    fetcher.fetch_as("timezones", 0, &[]).await
}

pub async fn fetch_currencies(fetcher: &PaginatedFetcher) -> Result<Vec<ApiCurrency>> {
    tracing::info!("Marketstack 통화 목록 조회");
    fetcher.fetch_as("currencies", 0, &[]).await
}

/// 거래소 목록 (`INDEX` 제외).
pub async fn fetch_exchanges(fetcher: &PaginatedFetcher) -> Result<Vec<ApiExchange>> {
    tracing::info!("Marketstack 거래소 목록 조회");
    let exchanges: Vec<ApiExchange> = fetcher.fetch_as("exchanges", 0, &[]).await?;
    Ok(exchanges
        .into_iter()
        .filter(|e| e.name != INDEX_EXCHANGE)
        .collect())
}

pub async fn fetch_tickers(fetcher: &PaginatedFetcher) -> Result<Vec<ApiTicker>> {
    tracing::info!("Marketstack 종목 목록 조회");
    fetcher.fetch_as("tickers", 0, &[]).await
}

/// 거래소 목록에서 국가를 추출합니다 (이름 기준 중복 제거, 등장 순서 유지).
pub fn countries_from_exchanges(exchanges: &[ApiExchange]) -> Vec<ApiCountry> {
    let mut countries: Vec<ApiCountry> = Vec::new();
    for exchange in exchanges {
        let Some(name) = exchange.country.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        if countries.iter().any(|c| c.name == name) {
            continue;
        }
        countries.push(ApiCountry {
            name: name.to_string(),
            code: exchange.country_code.clone(),
        });
    }
    countries
}

/// 거래소 목록에서 도시를 추출합니다 (도시+국가 기준 중복 제거).
///
/// 국가가 없는 도시는 참조할 국가 행이 없으므로 제외합니다.
pub fn cities_from_exchanges(exchanges: &[ApiExchange]) -> Vec<ApiCity> {
    let mut cities: Vec<ApiCity> = Vec::new();
    for exchange in exchanges {
        let (Some(name), Some(country)) = (exchange.city.as_deref(), exchange.country.as_deref())
        else {
            continue;
        };
        if name.is_empty() || cities.iter().any(|c| c.name == name && c.country == country) {
            continue;
        }
        cities.push(ApiCity {
            name: name.to_string(),
            country: country.to_string(),
        });
    }
    cities
}
