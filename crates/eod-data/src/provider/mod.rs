//! 업스트림 데이터 Provider 모듈.
//!
//! ## Marketstack
//! - `MarketstackClient`: `GET {base}/{endpoint}` 페이지 단위 클라이언트
//! - `PaginatedFetcher`: offset 페이지네이션 + 중복 제거
//! - `chunk`: 요청당 심볼 수 제한을 위한 배치 분할
//! - `fetch_eod`: 심볼 목록의 EOD 시세 수집
//! - `reference`: seed용 타임존/통화/거래소/종목 목록

pub mod batch;
pub mod eod;
pub mod marketstack;
pub mod pagination;
pub mod reference;

pub use batch::chunk;
pub use eod::fetch_eod;
pub use marketstack::{MarketstackClient, MarketstackConfig, Page, PageSource, Pagination};
pub use pagination::PaginatedFetcher;
