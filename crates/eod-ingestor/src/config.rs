//! 환경변수 기반 설정 모듈.
//!
//! 프로세스 시작 시 한 번 읽어 각 단계에 명시적으로 전달합니다.

use crate::error::IngestorError;
use crate::modules::seed::SeedStage;
use crate::Result;
use eod_data::provider::marketstack::{
    DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_MAX_SYMBOLS, DEFAULT_PAGE_LIMIT,
};
use eod_data::{DatabaseConfig, MarketstackConfig, RedisQueueConfig};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Ingestor 전체 설정
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// 데이터베이스 URL (controller/seed에서 필수)
    pub database_url: Option<String>,
    /// Marketstack 설정
    pub marketstack: MarketstackSettings,
    /// 큐 설정
    pub queue: QueueSettings,
    /// controller 설정
    pub controller: ControllerConfig,
    /// worker 설정
    pub worker: WorkerConfig,
    /// seed 설정
    pub seed: SeedConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// Marketstack API 설정
#[derive(Debug, Clone)]
pub struct MarketstackSettings {
    /// API 키 (worker/seed에서 필수)
    pub api_key: Option<SecretString>,
    pub base_url: String,
    /// 페이지 크기
    pub page_limit: u64,
    /// offset 상한
    pub max_pages: u64,
    /// 요청당 심볼 수
    pub max_symbols: usize,
}

/// 큐 설정
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub redis_url: String,
    pub queue_name: String,
}

/// controller 설정
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// 결과를 기록할 데이터스토어 ID
    pub datastore_id: Option<i64>,
}

/// worker 설정
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 로컬 데이터 레이크 루트
    pub data_lake_root: PathBuf,
    /// 메시지 임대 시간 (초). job 하나의 조회+저장 최악 시간보다 길어야 함
    pub visibility_timeout_secs: u64,
    /// 실행당 최대 처리 메시지 수 (0 = 제한 없음)
    pub max_messages: usize,
    /// prefix에 success 상태가 있으면 조회 없이 ack
    pub skip_completed: bool,
}

/// seed 설정
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// 실행할 단계
    pub stages: Vec<SeedStage>,
    /// 데이터스토어 seed 값
    pub datastore: DatastoreSeed,
}

/// 데이터스토어 seed 값
#[derive(Debug, Clone)]
pub struct DatastoreSeed {
    pub name: Option<String>,
    pub url: Option<String>,
    pub container: String,
    pub subscription_id: Option<String>,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl IngestorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let datastore_id = match std::env::var("EOD_DATASTORE_ID").ok() {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                IngestorError::Config(format!("EOD_DATASTORE_ID가 정수가 아닙니다: {}", raw))
            })?),
            None => None,
        };

        let stages = match std::env::var("SEED_STAGES").ok() {
            Some(raw) => SeedStage::parse_list(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            marketstack: MarketstackSettings {
                api_key: std::env::var("MARKETSTACK_API_KEY")
                    .ok()
                    .filter(|k| !k.is_empty())
                    .map(SecretString::from),
                base_url: std::env::var("MARKETSTACK_API_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                page_limit: env_var_parse("MARKETSTACK_PAGE_LIMIT", DEFAULT_PAGE_LIMIT),
                max_pages: env_var_parse("MARKETSTACK_MAX_PAGES", DEFAULT_MAX_PAGES),
                max_symbols: env_var_parse("MARKETSTACK_MAX_SYMBOLS", DEFAULT_MAX_SYMBOLS),
            },
            queue: QueueSettings {
                redis_url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string()),
                queue_name: std::env::var("EOD_INGESTOR_STORAGE_QUEUE")
                    .unwrap_or_else(|_| "eod-jobs".to_string()),
            },
            controller: ControllerConfig { datastore_id },
            worker: WorkerConfig {
                data_lake_root: std::env::var("DATA_LAKE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./datalake")),
                visibility_timeout_secs: env_var_parse("EOD_WORKER_VISIBILITY_TIMEOUT_SECS", 300),
                max_messages: env_var_parse("EOD_WORKER_MAX_MESSAGES", 0),
                skip_completed: env_var_bool("EOD_WORKER_SKIP_COMPLETED", false),
            },
            seed: SeedConfig {
                stages,
                datastore: DatastoreSeed {
                    name: std::env::var("EOD_INGESTOR_DATASTORE_NAME").ok(),
                    url: std::env::var("EOD_INGESTOR_DATASTORE_URL").ok(),
                    container: std::env::var("EOD_INGESTOR_DATASTORE_CONTAINER")
                        .unwrap_or_else(|_| "eod".to_string()),
                    subscription_id: std::env::var("EOD_INGESTOR_DATASTORE_SUBSCRIPTION_ID").ok(),
                },
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }

    /// 데이터베이스 설정 (DATABASE_URL 필수)
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        self.database_url
            .as_deref()
            .map(DatabaseConfig::new)
            .ok_or_else(|| {
                IngestorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
            })
    }

    /// Marketstack 클라이언트 설정 (MARKETSTACK_API_KEY 필수)
    pub fn marketstack_config(&self) -> Result<MarketstackConfig> {
        let api_key = self.marketstack.api_key.clone().ok_or_else(|| {
            IngestorError::Config("MARKETSTACK_API_KEY 환경변수가 설정되지 않았습니다".to_string())
        })?;

        Ok(MarketstackConfig {
            base_url: self.marketstack.base_url.clone(),
            api_key,
            page_limit: self.marketstack.page_limit,
            max_pages: self.marketstack.max_pages,
            max_symbols: self.marketstack.max_symbols,
        })
    }

    /// Redis 큐 설정
    pub fn queue_config(&self) -> RedisQueueConfig {
        RedisQueueConfig {
            url: self.queue.redis_url.clone(),
            queue_name: self.queue.queue_name.clone(),
        }
    }
}

impl WorkerConfig {
    /// 임대 시간을 Duration으로 반환
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            data_lake_root: PathBuf::from("./datalake"),
            visibility_timeout_secs: 300,
            max_messages: 0,
            skip_completed: false,
        }
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
