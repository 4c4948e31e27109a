//! job 완료 상태 레코드 (`EODSTATUS.json`).
//!
//! prefix 아래 `success` 상태가 있으면 해당 job이 이미 완료된 것으로 간주합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 상태 파일 이름.
pub const STATUS_FILE_NAME: &str = "EODSTATUS.json";

/// 실행 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// job 하나의 실행 결과 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: RunStatus,
    pub message: String,
    /// 기록 시각 (`%Y-%m-%d %H:%M:%S`, UTC)
    pub date: String,
    #[serde(alias = "file_name_preffix")]
    pub file_name_prefix: String,
}

impl StatusRecord {
    pub fn success(file_name_prefix: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: RunStatus::Success,
            message: "EOD data ingested successfully".to_string(),
            date: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            file_name_prefix: file_name_prefix.into(),
        }
    }

    pub fn failure(
        file_name_prefix: impl Into<String>,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: RunStatus::Failure,
            message: message.into(),
            date: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            file_name_prefix: file_name_prefix.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
