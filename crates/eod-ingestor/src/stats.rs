//! 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// controller/worker/seed 실행 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 처리 대상 수
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 건너뛴 횟수
    pub skipped: usize,
    /// 빈 데이터 (조회 성공, 레코드 없음)
    pub empty: usize,
    /// 저장된 총 레코드 수
    pub total_records: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 다른 통계를 합산
    pub fn merge(&mut self, other: &CollectionStats) {
        self.total += other.total;
        self.success += other.success;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.empty += other.empty;
        self.total_records += other.total_records;
        self.elapsed += other.elapsed;
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            total_records = self.total_records,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "작업 완료"
        );
    }
}
