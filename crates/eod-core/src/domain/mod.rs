//! 도메인 모델.

pub mod eod;
pub mod job;
pub mod reference;
pub mod status;

pub use eod::EodRecord;
pub use job::{JobDescriptor, JobType, LATEST};
pub use reference::{City, Country, Currency, EodDatastore, Exchange, Ticker, Timezone};
pub use status::{RunStatus, StatusRecord, STATUS_FILE_NAME};
