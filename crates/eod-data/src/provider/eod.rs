//! 심볼 목록의 EOD 시세 수집.

use eod_core::EodRecord;

use super::batch::chunk;
use super::pagination::PaginatedFetcher;
use crate::error::Result;

/// `symbols`를 `max_symbols`개씩 나누어 `endpoint`(`eod/{date}` 또는 `eod/latest`)를 조회하고
/// 모든 배치 결과를 이어 붙여 반환합니다.
///
/// 레코드는 업스트림 JSON 그대로 보관합니다. `symbol`이 없는 레코드가 하나라도 있으면
/// 파일 이름을 정할 수 없으므로 전체가 실패합니다. 배치 하나라도 실패하면 부분 결과는 버립니다.
pub async fn fetch_eod(
    fetcher: &PaginatedFetcher,
    endpoint: &str,
    symbols: &[&str],
    max_symbols: usize,
) -> Result<Vec<EodRecord>> {
    let mut eod_data = Vec::new();

    for (idx, batch) in chunk(symbols, max_symbols).enumerate() {
        tracing::debug!(
            endpoint = endpoint,
            batch = idx + 1,
            symbols = batch.len(),
            "EOD 배치 조회"
        );

        let params = [("symbols".to_string(), batch.join(","))];
        for record in fetcher.fetch(endpoint, 0, &params).await? {
            eod_data.push(EodRecord::from_value(record)?);
        }
    }

    Ok(eod_data)
}
