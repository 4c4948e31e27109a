//! EOD 수집 파이프라인의 controller/worker.
//!
//! 이 crate는 다음 작업을 제공합니다:
//! - Job 생성 (controller): 거래소별 EOD 수집 job을 큐에 등록
//! - Job 처리 (worker): 큐에서 job을 꺼내 시세를 수집하고 데이터 레이크에 저장
//! - 참조 데이터 seed: 타임존/통화/국가/도시/거래소/종목/데이터스토어 적재

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::IngestorConfig;
pub use error::{IngestorError, Result};
pub use stats::CollectionStats;
