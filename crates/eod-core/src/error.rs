//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 타입 변환/검증 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 큐 메시지 envelope의 base64 디코딩 실패
    #[error("envelope 디코딩 에러: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// envelope 본문이 UTF-8이 아님
    #[error("envelope 인코딩 에러: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// 알 수 없는 IANA 타임존
    #[error("알 수 없는 타임존: {0}")]
    InvalidTimezone(String),

    /// Job 필드 검증 실패
    #[error("잘못된 job: {0}")]
    InvalidJob(String),

    /// 업스트림 EOD 레코드 검증 실패
    #[error("잘못된 EOD 레코드: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
