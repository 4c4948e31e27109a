//! offset 기반 페이지네이션 fetcher.
//!
//! # 종료 조건
//!
//! - offset이 상한(`max_pages`)에 도달
//! - 응답에 `pagination`이 없음 (업스트림이 마지막 페이지에서 종종 생략함)
//! - offset이 `ceil(total / limit)`에 도달
//!
//! 실패한 요청은 재시도하지 않고 그대로 반환합니다.

use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::marketstack::{PageSource, DEFAULT_MAX_PAGES, DEFAULT_PAGE_LIMIT};
use crate::error::Result;

/// 페이지를 끝까지 순회하며 레코드를 모으는 fetcher.
#[derive(Clone)]
pub struct PaginatedFetcher {
    source: Arc<dyn PageSource>,
    page_limit: u64,
    max_pages: u64,
}

impl PaginatedFetcher {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            page_limit: DEFAULT_PAGE_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// 페이지 크기를 설정합니다 (0은 1로 취급).
    pub fn with_page_limit(mut self, page_limit: u64) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// offset 상한을 설정합니다.
    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn page_limit(&self) -> u64 {
        self.page_limit
    }

    /// `endpoint`의 모든 페이지를 가져와 중복 제거한 레코드를 반환합니다.
    pub async fn fetch(
        &self,
        endpoint: &str,
        initial_offset: u64,
        extra_params: &[(String, String)],
    ) -> Result<Vec<Value>> {
        tracing::info!(endpoint = endpoint, "Marketstack 데이터 조회");

        let mut offset = initial_offset;
        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .source
                .get_page(endpoint, self.page_limit, offset, extra_params)
                .await?;
            pages += 1;

            let pagination = page.pagination.clone();
            records.extend(page.into_records());

            let Some(pagination) = pagination else {
                tracing::debug!(endpoint = endpoint, offset, "pagination 없음, 조회 종료");
                break;
            };

            let last_offset = pagination.total.div_ceil(self.page_limit);
            if offset >= self.max_pages || offset >= last_offset {
                break;
            }

            offset += 1;
        }

        let fetched = records.len();
        let records = dedupe(records);

        tracing::debug!(
            endpoint = endpoint,
            pages,
            fetched,
            unique = records.len(),
            "페이지 조회 완료"
        );

        Ok(records)
    }

    /// [`fetch`](Self::fetch) 후 레코드를 `T`로 변환합니다.
    ///
    /// 변환에 실패한 레코드는 경고 로그를 남기고 건너뜁니다.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        initial_offset: u64,
        extra_params: &[(String, String)],
    ) -> Result<Vec<T>> {
        let records = self.fetch(endpoint, initial_offset, extra_params).await?;

        let mut parsed = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<T>(record) {
                Ok(item) => parsed.push(item),
                Err(e) => {
                    tracing::warn!(endpoint = endpoint, error = %e, "레코드 변환 실패, 건너뜀");
                }
            }
        }

        Ok(parsed)
    }
}

/// 완전히 동일한 레코드를 제거합니다 (처음 등장한 순서 유지).
pub fn dedupe(records: Vec<Value>) -> Vec<Value> {
    // serde_json::Map은 키 정렬 상태라 직렬화 문자열이 동일성 키로 쓰일 수 있음
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.to_string()))
        .collect()
}
