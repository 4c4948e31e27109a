//! EOD ingestor CLI.

use clap::{Parser, Subcommand};
use eod_core::{init_logging, LogConfig, LogFormat};
use eod_data::{
    Database, JobQueue, LocalDataLakeProvider, MarketstackClient, PaginatedFetcher,
    PgReferenceStore, RedisJobQueue,
};
use eod_ingestor::modules::{self, SeedStage, Worker, WorkerOptions};
use eod_ingestor::{CollectionStats, IngestorConfig, IngestorError};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "eod-ingestor")]
#[command(about = "Marketstack EOD ingestion pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// 로그 형식 (pretty, json, compact). 미지정 시 LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 거래소별 EOD job을 큐에 등록
    Controller,

    /// 큐의 job을 처리해 데이터 레이크에 저장
    Worker,

    /// 참조 데이터 seed
    Seed {
        /// 실행할 단계 (쉼표로 구분, 예: "timezones,exchanges" 또는 "all").
        /// 미지정 시 SEED_STAGES
        #[arg(long)]
        stages: Option<String>,
    },

    /// 데몬 모드: 주기적으로 controller → worker 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    let mut log_config = LogConfig::from_env();
    if std::env::var("RUST_LOG").is_err() {
        log_config.level = format!(
            "eod_ingestor={lvl},eod_data={lvl},eod_core={lvl}",
            lvl = cli.log_level
        );
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(log_config)?;

    tracing::info!("EOD Ingestor 시작");

    // 설정 로드
    let config = IngestorConfig::from_env()?;
    tracing::debug!(
        queue = %config.queue.queue_name,
        data_lake_root = %config.worker.data_lake_root.display(),
        "설정 로드 완료"
    );

    match cli.command {
        Commands::Controller => {
            let stats = run_controller(&config).await?;
            stats.log_summary("job 생성");
        }
        Commands::Worker => {
            let stats = run_worker(&config).await?;
            stats.log_summary("job 처리");
        }
        Commands::Seed { stages } => {
            let stages = match stages {
                Some(raw) => SeedStage::parse_list(&raw)?,
                None => config.seed.stages.clone(),
            };
            let stats = run_seed(&config, &stages).await?;
            stats.log_summary("참조 데이터 seed");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 실행 주기 시작 ===");

                        // 1. job 생성
                        match run_controller(&config).await {
                            Ok(stats) => stats.log_summary("job 생성"),
                            Err(e) => tracing::error!("job 생성 실패: {}", e),
                        }

                        // 2. job 처리
                        match run_worker(&config).await {
                            Ok(stats) => stats.log_summary("job 처리"),
                            Err(e) => tracing::error!("job 처리 실패: {}", e),
                        }

                        tracing::info!(
                            "=== 실행 주기 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    tracing::info!("EOD Ingestor 종료");
    Ok(())
}

async fn run_controller(config: &IngestorConfig) -> eod_ingestor::Result<CollectionStats> {
    let datastore_id = config.controller.datastore_id.ok_or_else(|| {
        IngestorError::Config("EOD_DATASTORE_ID 환경변수가 설정되지 않았습니다".to_string())
    })?;

    let db = Database::connect(&config.database_config()?).await?;
    let store = PgReferenceStore::new(db.clone());
    let queue = RedisJobQueue::connect(&config.queue_config()).await?;

    let result = modules::run_controller(&store, &queue, datastore_id).await;
    db.close().await;
    result
}

async fn run_worker(config: &IngestorConfig) -> eod_ingestor::Result<CollectionStats> {
    let fetcher = build_fetcher(config)?;
    let queue: Arc<dyn JobQueue> = Arc::new(RedisJobQueue::connect(&config.queue_config()).await?);
    let stores = Arc::new(LocalDataLakeProvider::new(&config.worker.data_lake_root));

    let options = WorkerOptions {
        visibility_timeout: config.worker.visibility_timeout(),
        max_messages: config.worker.max_messages,
        skip_completed: config.worker.skip_completed,
        max_symbols: config.marketstack.max_symbols,
    };

    let mut worker = Worker::new(queue, fetcher, stores, options);
    worker.process_messages().await
}

async fn run_seed(
    config: &IngestorConfig,
    stages: &[SeedStage],
) -> eod_ingestor::Result<CollectionStats> {
    let fetcher = build_fetcher(config)?;
    let db = Database::connect(&config.database_config()?).await?;
    db.ensure_schema().await?;
    let store = PgReferenceStore::new(db.clone());

    let result = modules::run_seed(&store, &fetcher, stages, &config.seed.datastore).await;
    db.close().await;
    result
}

fn build_fetcher(config: &IngestorConfig) -> eod_ingestor::Result<PaginatedFetcher> {
    let marketstack = config.marketstack_config()?;
    let client = MarketstackClient::new(&marketstack)?;

    Ok(PaginatedFetcher::new(Arc::new(client))
        .with_page_limit(marketstack.page_limit)
        .with_max_pages(marketstack.max_pages))
}
