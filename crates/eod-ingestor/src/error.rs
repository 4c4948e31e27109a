//! 에러 타입 정의.

use std::fmt;

/// Ingestor 에러 타입
#[derive(Debug)]
pub enum IngestorError {
    /// 설정 에러
    Config(String),
    /// 외부 협력자 에러 (API, DB, 큐, 파일 스토어)
    Data(eod_data::DataError),
    /// 도메인 타입 변환 에러 (envelope, 타임존)
    Core(eod_core::CoreError),
    /// 참조 데이터 누락
    Lookup(String),
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for IngestorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::Core(e) => write!(f, "Domain error: {}", e),
            Self::Lookup(msg) => write!(f, "Lookup error: {}", msg),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for IngestorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            Self::Core(e) => Some(e),
            Self::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<eod_data::DataError> for IngestorError {
    fn from(err: eod_data::DataError) -> Self {
        Self::Data(err)
    }
}

impl From<eod_core::CoreError> for IngestorError {
    fn from(err: eod_core::CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<std::env::VarError> for IngestorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for IngestorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, IngestorError>;
