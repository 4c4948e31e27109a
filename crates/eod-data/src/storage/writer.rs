//! EOD 결과 writer.
//!
//! 레코드 하나당 객체 하나(`{prefix}/{symbol}.json`)와 상태 객체(`{prefix}/EODSTATUS.json`)를 기록합니다.

use eod_core::{EodRecord, StatusRecord, STATUS_FILE_NAME};
use std::sync::Arc;

use super::lake::FileStore;
use crate::error::Result;

/// 파일 스토어 위의 EOD 결과 writer.
#[derive(Clone)]
pub struct EodWriter {
    store: Arc<dyn FileStore>,
}

impl EodWriter {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    /// 레코드 하나를 기록하고 경로를 반환합니다.
    pub async fn write_record(&self, prefix: &str, record: &EodRecord) -> Result<String> {
        let path = format!("{}/{}", prefix, record.file_name());
        let content = serde_json::to_vec(record)?;
        self.store.write(&path, &content).await?;
        Ok(path)
    }

    /// 레코드를 순서대로 기록합니다. 첫 실패에서 중단합니다.
    pub async fn write_records(&self, prefix: &str, records: &[EodRecord]) -> Result<usize> {
        tracing::info!(prefix = prefix, count = records.len(), "EOD 레코드 저장");
        for record in records {
            self.write_record(prefix, record).await?;
        }
        Ok(records.len())
    }

    /// 상태 레코드를 기록합니다.
    pub async fn write_status(&self, prefix: &str, status: &StatusRecord) -> Result<()> {
        let path = format!("{}/{}", prefix, STATUS_FILE_NAME);
        let content = serde_json::to_vec_pretty(status)?;
        self.store.write(&path, &content).await?;
        tracing::info!(path = %path, status = ?status.status, "상태 파일 기록");
        Ok(())
    }

    /// 기존 상태 레코드를 읽습니다.
    pub async fn read_status(&self, prefix: &str) -> Result<Option<StatusRecord>> {
        let path = format!("{}/{}", prefix, STATUS_FILE_NAME);
        match self.store.read(&path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
