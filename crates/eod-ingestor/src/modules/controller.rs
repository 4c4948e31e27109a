//! Job 생성 (controller).
//!
//! 거래소마다 종목 목록과 현지 날짜를 담은 job을 하나씩 만들어 큐에 등록합니다.

use crate::{CollectionStats, IngestorError, Result};
use chrono::{DateTime, Utc};
use eod_core::{EodDatastore, Exchange, JobDescriptor, JobType};
use eod_data::{JobQueue, ReferenceStore};
use std::fmt;
use std::time::Instant;

/// 거래소를 건너뛴 이유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 추적 종목이 없음
    NoTickers,
    /// 타임존 행이 없음
    TimezoneNotFound,
    /// IANA 이름으로 해석할 수 없는 타임존
    InvalidTimezone(String),
    /// 참조 데이터 조회 실패
    LookupFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTickers => write!(f, "종목 없음"),
            Self::TimezoneNotFound => write!(f, "타임존 없음"),
            Self::InvalidTimezone(name) => write!(f, "알 수 없는 타임존: {}", name),
            Self::LookupFailed(msg) => write!(f, "조회 실패: {}", msg),
        }
    }
}

/// 거래소 하나의 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// job 등록 완료
    Enqueued { message_id: String, tickers: usize },
    /// 건너뜀
    Skipped(SkipReason),
}

/// controller 실행 결과.
#[derive(Debug, Clone, Default)]
pub struct ComposeReport {
    /// (거래소 MIC, 결과)
    pub outcomes: Vec<(String, ComposeOutcome)>,
}

impl ComposeReport {
    /// 등록된 job 수
    pub fn enqueued(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ComposeOutcome::Enqueued { .. }))
            .count()
    }

    /// 건너뛴 거래소 수
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.enqueued()
    }

    /// 실행 통계로 변환
    pub fn to_stats(&self) -> CollectionStats {
        let mut stats = CollectionStats::new();
        for (_, outcome) in &self.outcomes {
            stats.total += 1;
            match outcome {
                ComposeOutcome::Enqueued { tickers, .. } => {
                    stats.success += 1;
                    stats.total_records += tickers;
                }
                ComposeOutcome::Skipped(SkipReason::NoTickers) => stats.empty += 1,
                ComposeOutcome::Skipped(SkipReason::LookupFailed(_)) => stats.errors += 1,
                ComposeOutcome::Skipped(_) => stats.skipped += 1,
            }
        }
        stats
    }
}

/// 참조 데이터의 모든 거래소에 대해 job을 등록합니다.
pub async fn run_controller(
    store: &dyn ReferenceStore,
    queue: &dyn JobQueue,
    datastore_id: i64,
) -> Result<CollectionStats> {
    let start = Instant::now();
    tracing::info!(datastore_id, "EOD job 생성 시작");

    let exchanges = store.get_exchanges().await?;
    tracing::info!(count = exchanges.len(), "거래소 목록 조회");

    let report = compose_jobs(store, queue, datastore_id, &exchanges).await?;

    let mut stats = report.to_stats();
    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 현재 시각 기준으로 job을 생성합니다.
pub async fn compose_jobs(
    store: &dyn ReferenceStore,
    queue: &dyn JobQueue,
    datastore_id: i64,
    exchanges: &[Exchange],
) -> Result<ComposeReport> {
    compose_jobs_at(store, queue, datastore_id, exchanges, Utc::now()).await
}

/// `now`를 각 거래소 현지 날짜로 변환해 job을 생성합니다.
///
/// 데이터스토어가 없으면 아무것도 등록하지 않고 실패합니다.
/// 거래소 단위 조회 실패는 해당 거래소만 건너뛰고, 큐 등록 실패는 즉시 반환합니다.
pub async fn compose_jobs_at(
    store: &dyn ReferenceStore,
    queue: &dyn JobQueue,
    datastore_id: i64,
    exchanges: &[Exchange],
    now: DateTime<Utc>,
) -> Result<ComposeReport> {
    let datastore = store.get_datastore(datastore_id).await?.ok_or_else(|| {
        IngestorError::Lookup(format!("데이터스토어를 찾을 수 없습니다: id={}", datastore_id))
    })?;

    let mut report = ComposeReport::default();

    for exchange in exchanges {
        let job = match build_job(store, &datastore, exchange, now).await {
            Ok(job) => job,
            Err(reason) => {
                tracing::warn!(
                    exchange = %exchange.name,
                    mic = %exchange.mic,
                    reason = %reason,
                    "거래소 건너뜀"
                );
                report
                    .outcomes
                    .push((exchange.mic.clone(), ComposeOutcome::Skipped(reason)));
                continue;
            }
        };

        let envelope = job.to_envelope()?;
        let message_id = queue.send_message(&envelope).await?;
        let tickers = job.ticker_symbols().len();

        tracing::info!(
            exchange = %job.exchange,
            mic = %job.exchange_mic,
            date = %job.date_label(),
            tickers,
            "job 등록"
        );
        report.outcomes.push((
            exchange.mic.clone(),
            ComposeOutcome::Enqueued {
                message_id,
                tickers,
            },
        ));
    }

    tracing::info!(
        enqueued = report.enqueued(),
        skipped = report.skipped(),
        "EOD job 생성 완료"
    );
    Ok(report)
}

async fn build_job(
    store: &dyn ReferenceStore,
    datastore: &EodDatastore,
    exchange: &Exchange,
    now: DateTime<Utc>,
) -> std::result::Result<JobDescriptor, SkipReason> {
    let tickers = store
        .get_tickers_by_exchange(exchange.id)
        .await
        .map_err(|e| SkipReason::LookupFailed(e.to_string()))?;
    if tickers.is_empty() {
        return Err(SkipReason::NoTickers);
    }

    let timezone_id = exchange.timezone_id.ok_or(SkipReason::TimezoneNotFound)?;
    let timezone = store
        .get_timezone(timezone_id)
        .await
        .map_err(|e| SkipReason::LookupFailed(e.to_string()))?
        .ok_or(SkipReason::TimezoneNotFound)?;
    let date = timezone
        .local_date(now)
        .map_err(|_| SkipReason::InvalidTimezone(timezone.name.clone()))?;

    Ok(JobDescriptor {
        exchange: exchange.name.clone(),
        exchange_mic: exchange.mic.clone(),
        date: Some(date),
        job_type: JobType::Eod,
        eod_datastore_id: datastore.id.to_string(),
        eod_datastore_name: datastore.name.clone(),
        eod_datastore_container: datastore.container.clone(),
        eod_datastore_subscription_id: datastore.subscription_id.clone(),
        partition_by_date: true,
        tickers: tickers
            .iter()
            .map(|t| t.ticker.as_str())
            .collect::<Vec<_>>()
            .join(","),
    })
}
