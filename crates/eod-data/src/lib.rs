//! EOD 수집 파이프라인의 외부 협력자.
//!
//! 이 crate는 다음을 제공합니다:
//! - Marketstack API 클라이언트, 페이지네이션 fetcher, 심볼 배치 분할
//! - PostgreSQL 참조 데이터 저장소
//! - Redis 기반 job 큐 (visibility timeout 지원)
//! - 파일 기반 데이터 레이크와 EOD 결과 writer

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

pub use provider::{
    chunk, fetch_eod, MarketstackClient, MarketstackConfig, Page, PageSource, PaginatedFetcher,
    Pagination,
};
pub use storage::lake::{FileStore, FileStoreProvider, LocalDataLake, LocalDataLakeProvider};
pub use storage::queue::{JobQueue, QueueMessage, RedisJobQueue, RedisQueueConfig};
pub use storage::reference::{Database, DatabaseConfig, PgReferenceStore, ReferenceStore};
pub use storage::writer::EodWriter;
