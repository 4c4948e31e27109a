//! 파이프라인 단계 모듈.

pub mod controller;
pub mod seed;
pub mod worker;

pub use controller::{
    compose_jobs, compose_jobs_at, run_controller, ComposeOutcome, ComposeReport, SkipReason,
};
pub use seed::{run_seed, SeedOutcome, SeedStage};
pub use worker::{Worker, WorkerOptions, WorkerState};
