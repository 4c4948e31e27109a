//! # EOD Core
//!
//! EOD 수집 파이프라인의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 controller와 worker가 공유하는 타입을 정의합니다:
//! - 거래소/종목/타임존 등 참조 데이터
//! - 큐로 전달되는 Job 디스크립터와 메시지 envelope
//! - 일별 시세(EOD) 레코드와 상태 레코드
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::{CoreError, Result};
pub use logging::*;
