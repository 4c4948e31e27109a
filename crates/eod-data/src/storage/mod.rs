//! 저장소 구현.
//!
//! - `reference`: PostgreSQL 참조 데이터 저장소
//! - `queue`: Redis 기반 job 큐
//! - `lake`: 파일 기반 데이터 레이크
//! - `writer`: EOD 레코드/상태 파일 writer

pub mod lake;
pub mod queue;
pub mod reference;
pub mod writer;
