//! 참조 데이터 seed.
//!
//! Marketstack 목록 엔드포인트를 조회해 참조 테이블을 채웁니다.
//! 단계는 설정 순서와 무관하게 항상 의존 순서(타임존 → … → 데이터스토어)로 실행됩니다.

use crate::config::DatastoreSeed;
use crate::{CollectionStats, IngestorError, Result};
use eod_data::provider::reference::{
    cities_from_exchanges, countries_from_exchanges, fetch_currencies, fetch_exchanges,
    fetch_tickers, fetch_timezones, ApiExchange,
};
use eod_data::storage::reference::{
    NewCurrency, NewDatastore, NewExchange, NewTicker, NewTimezone,
};
use eod_data::{PaginatedFetcher, ReferenceStore};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// seed 단계 (선언 순서 = 실행 순서).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeedStage {
    Timezones,
    Currencies,
    Countries,
    Cities,
    Exchanges,
    Tickers,
    Datastore,
}

impl SeedStage {
    /// 모든 단계 (실행 순서)
    pub const ALL: [SeedStage; 7] = [
        SeedStage::Timezones,
        SeedStage::Currencies,
        SeedStage::Countries,
        SeedStage::Cities,
        SeedStage::Exchanges,
        SeedStage::Tickers,
        SeedStage::Datastore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timezones => "timezones",
            Self::Currencies => "currencies",
            Self::Countries => "countries",
            Self::Cities => "cities",
            Self::Exchanges => "exchanges",
            Self::Tickers => "tickers",
            Self::Datastore => "datastore",
        }
    }

    /// 쉼표로 구분된 단계 목록을 파싱합니다.
    ///
    /// `all`은 모든 단계를 뜻합니다. 결과는 중복 없이 실행 순서로 정렬됩니다.
    pub fn parse_list(raw: &str) -> Result<Vec<SeedStage>> {
        let mut stages = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if item.eq_ignore_ascii_case("all") {
                stages.extend(Self::ALL);
            } else {
                stages.push(item.parse()?);
            }
        }
        stages.sort();
        stages.dedup();
        Ok(stages)
    }
}

impl fmt::Display for SeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedStage {
    type Err = IngestorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IngestorError::Config(format!("알 수 없는 seed 단계: {}", s)))
    }
}

/// 항목 하나의 seed 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// upsert 완료
    Inserted,
    /// 참조 대상이 없어 건너뜀
    Skipped { reason: String },
    /// 저장 실패
    Failed { error: String },
}

impl SeedOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

impl From<eod_data::Result<i64>> for SeedOutcome {
    fn from(result: eod_data::Result<i64>) -> Self {
        match result {
            Ok(_) => Self::Inserted,
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// 요청된 단계를 순서대로 실행합니다.
///
/// 단계의 업스트림 조회가 실패하면 해당 단계만 에러로 집계하고 다음 단계로 넘어갑니다.
pub async fn run_seed(
    store: &dyn ReferenceStore,
    fetcher: &PaginatedFetcher,
    stages: &[SeedStage],
    datastore: &DatastoreSeed,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let mut ordered = stages.to_vec();
    ordered.sort();
    ordered.dedup();

    if ordered.is_empty() {
        tracing::warn!("seed 단계가 지정되지 않았습니다 (SEED_STAGES 또는 --stages)");
    }

    // 국가/도시/거래소 단계가 공유하는 거래소 목록
    let mut exchanges: Option<Vec<ApiExchange>> = None;

    for stage in ordered {
        tracing::info!(stage = %stage, "seed 단계 시작");

        let outcomes = match stage {
            SeedStage::Timezones => seed_timezones(store, fetcher).await,
            SeedStage::Currencies => seed_currencies(store, fetcher).await,
            SeedStage::Countries => match cached_exchanges(&mut exchanges, fetcher).await {
                Ok(list) => Ok(seed_countries(store, list).await),
                Err(e) => Err(e),
            },
            SeedStage::Cities => match cached_exchanges(&mut exchanges, fetcher).await {
                Ok(list) => Ok(seed_cities(store, list).await),
                Err(e) => Err(e),
            },
            SeedStage::Exchanges => match cached_exchanges(&mut exchanges, fetcher).await {
                Ok(list) => Ok(seed_exchanges(store, list).await),
                Err(e) => Err(e),
            },
            SeedStage::Tickers => seed_tickers(store, fetcher).await,
            SeedStage::Datastore => Ok(vec![seed_datastore(store, datastore).await]),
        };

        match outcomes {
            Ok(outcomes) => {
                let stage_stats = tally(&outcomes);
                tracing::info!(
                    stage = %stage,
                    inserted = stage_stats.success,
                    skipped = stage_stats.skipped,
                    errors = stage_stats.errors,
                    "seed 단계 완료"
                );
                stats.merge(&stage_stats);
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(stage = %stage, error = %e, "seed 단계 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn tally(outcomes: &[SeedOutcome]) -> CollectionStats {
    let mut stats = CollectionStats::new();
    for outcome in outcomes {
        stats.total += 1;
        match outcome {
            SeedOutcome::Inserted => {
                stats.success += 1;
                stats.total_records += 1;
            }
            SeedOutcome::Skipped { reason } => {
                stats.skipped += 1;
                tracing::debug!(reason = %reason, "항목 건너뜀");
            }
            SeedOutcome::Failed { error } => {
                stats.errors += 1;
                tracing::warn!(error = %error, "항목 저장 실패");
            }
        }
    }
    stats
}

async fn cached_exchanges<'a>(
    cache: &'a mut Option<Vec<ApiExchange>>,
    fetcher: &PaginatedFetcher,
) -> Result<&'a [ApiExchange]> {
    if cache.is_none() {
        *cache = Some(fetch_exchanges(fetcher).await?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

async fn seed_timezones(
    store: &dyn ReferenceStore,
    fetcher: &PaginatedFetcher,
) -> Result<Vec<SeedOutcome>> {
    let timezones = fetch_timezones(fetcher).await?;
    let mut outcomes = Vec::with_capacity(timezones.len());
    for tz in timezones {
        let row = NewTimezone {
            name: tz.timezone,
            abbr: tz.abbr,
            dst: tz.abbr_dst,
        };
        outcomes.push(store.set_timezone(&row).await.into());
    }
    Ok(outcomes)
}

async fn seed_currencies(
    store: &dyn ReferenceStore,
    fetcher: &PaginatedFetcher,
) -> Result<Vec<SeedOutcome>> {
    let currencies = fetch_currencies(fetcher).await?;
    let mut outcomes = Vec::with_capacity(currencies.len());
    for currency in currencies {
        let row = NewCurrency {
            code: currency.code,
            name: currency.name,
            symbol: currency.symbol,
        };
        outcomes.push(store.set_currency(&row).await.into());
    }
    Ok(outcomes)
}

async fn seed_countries(store: &dyn ReferenceStore, exchanges: &[ApiExchange]) -> Vec<SeedOutcome> {
    let mut outcomes = Vec::new();
    for country in countries_from_exchanges(exchanges) {
        outcomes.push(
            store
                .set_country(&country.name, country.code.as_deref())
                .await
                .into(),
        );
    }
    outcomes
}

async fn seed_cities(store: &dyn ReferenceStore, exchanges: &[ApiExchange]) -> Vec<SeedOutcome> {
    let mut outcomes = Vec::new();
    for city in cities_from_exchanges(exchanges) {
        let outcome = match store.get_country_by_name(&city.country).await {
            Ok(Some(country)) => store.set_city(&city.name, country.id).await.into(),
            Ok(None) => SeedOutcome::skipped(format!("국가 없음: {}", city.country)),
            Err(e) => SeedOutcome::skipped(format!("국가 조회 실패: {}", e)),
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn seed_exchanges(store: &dyn ReferenceStore, exchanges: &[ApiExchange]) -> Vec<SeedOutcome> {
    let mut outcomes = Vec::with_capacity(exchanges.len());
    for exchange in exchanges {
        let outcome = match resolve_exchange(store, exchange).await {
            Ok(row) => store.set_exchange(&row).await.into(),
            Err(reason) => SeedOutcome::skipped(reason),
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// 거래소의 국가/도시/타임존 ID를 찾습니다. 없는 참조는 `None`으로 남깁니다.
async fn resolve_exchange(
    store: &dyn ReferenceStore,
    exchange: &ApiExchange,
) -> std::result::Result<NewExchange, String> {
    let mic = exchange
        .mic
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| format!("MIC 없음: {}", exchange.name))?;

    let country_id = match exchange.country.as_deref() {
        Some(name) => store
            .get_country_by_name(name)
            .await
            .map_err(|e| format!("국가 조회 실패: {}", e))?
            .map(|c| c.id),
        None => None,
    };

    let city_id = match (exchange.city.as_deref(), country_id) {
        (Some(name), Some(country_id)) => store
            .get_city(name, country_id)
            .await
            .map_err(|e| format!("도시 조회 실패: {}", e))?
            .map(|c| c.id),
        _ => None,
    };

    let timezone_id = match &exchange.timezone {
        Some(tz) => store
            .get_timezone_by_name(&tz.timezone)
            .await
            .map_err(|e| format!("타임존 조회 실패: {}", e))?
            .map(|t| t.id),
        None => None,
    };

    Ok(NewExchange {
        name: exchange.name.clone(),
        acronym: exchange.acronym.clone(),
        mic: mic.to_string(),
        country_id,
        city_id,
        timezone_id,
    })
}

async fn seed_tickers(
    store: &dyn ReferenceStore,
    fetcher: &PaginatedFetcher,
) -> Result<Vec<SeedOutcome>> {
    let tickers = fetch_tickers(fetcher).await?;
    let mut outcomes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let Some(exchange_name) = ticker.stock_exchange.as_ref().map(|e| e.name.as_str()) else {
            outcomes.push(SeedOutcome::skipped(format!("거래소 정보 없음: {}", ticker.symbol)));
            continue;
        };

        let outcome = match store.get_exchange_by_name(exchange_name).await {
            Ok(Some(exchange)) => {
                let row = NewTicker {
                    name: ticker.name.clone().unwrap_or_else(|| ticker.symbol.clone()),
                    ticker: ticker.symbol.clone(),
                    exchange_id: exchange.id,
                };
                store.set_ticker(&row).await.into()
            }
            Ok(None) => SeedOutcome::skipped(format!("거래소 없음: {}", exchange_name)),
            Err(e) => SeedOutcome::skipped(format!("거래소 조회 실패: {}", e)),
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

async fn seed_datastore(store: &dyn ReferenceStore, seed: &DatastoreSeed) -> SeedOutcome {
    let Some(name) = seed.name.as_deref().filter(|n| !n.is_empty()) else {
        return SeedOutcome::skipped("EOD_INGESTOR_DATASTORE_NAME 미설정");
    };

    let row = NewDatastore {
        name: name.to_string(),
        url: seed.url.clone(),
        container: seed.container.clone(),
        subscription_id: seed.subscription_id.clone(),
    };
    store.set_datastore(&row).await.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_orders_and_dedupes() {
        let stages = SeedStage::parse_list("tickers, timezones,Exchanges,tickers").unwrap();
        assert_eq!(
            stages,
            vec![SeedStage::Timezones, SeedStage::Exchanges, SeedStage::Tickers]
        );
    }

    #[test]
    fn test_parse_list_all() {
        assert_eq!(SeedStage::parse_list("all").unwrap(), SeedStage::ALL.to_vec());
        assert!(SeedStage::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_stage() {
        let err = SeedStage::parse_list("timezones,planets").unwrap_err();
        assert!(matches!(err, IngestorError::Config(_)));
    }

    #[test]
    fn test_tally() {
        let stats = tally(&[
            SeedOutcome::Inserted,
            SeedOutcome::Inserted,
            SeedOutcome::skipped("no country"),
            SeedOutcome::Failed {
                error: "db".to_string(),
            },
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
    }
}
