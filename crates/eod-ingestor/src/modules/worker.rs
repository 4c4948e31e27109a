//! Job 처리 (worker).
//!
//! 큐에서 job을 하나씩 꺼내 시세를 조회하고 데이터 레이크에 저장한 뒤 메시지를 삭제합니다.
//! 저장이 끝나기 전에 실패한 메시지는 삭제하지 않으므로 임대가 만료되면 다시 전달됩니다.

use crate::{CollectionStats, Result};
use chrono::Utc;
use eod_core::{JobDescriptor, StatusRecord};
use eod_data::provider::marketstack::DEFAULT_MAX_SYMBOLS;
use eod_data::{
    fetch_eod, EodWriter, FileStoreProvider, JobQueue, PaginatedFetcher, QueueMessage,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// worker 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    #[default]
    Idle,
    /// 대기 메시지 수 확인
    Checking,
    /// 큐가 비어 있어 실행 생략
    Skipped,
    /// 업스트림 조회
    Fetching,
    /// 레코드/상태 파일 기록
    Writing,
    /// 메시지 삭제
    Acknowledging,
}

/// worker 실행 옵션.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// 메시지 임대 시간
    pub visibility_timeout: Duration,
    /// 실행당 최대 처리 메시지 수 (0 = 제한 없음)
    pub max_messages: usize,
    /// 이미 성공한 prefix는 조회 없이 ack
    pub skip_completed: bool,
    /// 요청당 심볼 수
    pub max_symbols: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(300),
            max_messages: 0,
            skip_completed: false,
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }
}

/// 메시지 하나의 처리 결과.
enum MessageOutcome {
    /// 저장 후 ack (저장한 레코드 수)
    Written(usize),
    /// 이미 완료된 prefix라 바로 ack
    AlreadyCompleted,
}

/// 큐 worker.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    fetcher: PaginatedFetcher,
    stores: Arc<dyn FileStoreProvider>,
    options: WorkerOptions,
    state: WorkerState,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        fetcher: PaginatedFetcher,
        stores: Arc<dyn FileStoreProvider>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            queue,
            fetcher,
            stores,
            options,
            state: WorkerState::Idle,
        }
    }

    /// 현재 상태
    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn set_state(&mut self, state: WorkerState) {
        tracing::trace!(from = ?self.state, to = ?state, "worker 상태 전이");
        self.state = state;
    }

    /// 보이는 메시지를 모두 (또는 `max_messages`개까지) 처리합니다.
    ///
    /// 메시지 단위 실패는 통계에만 반영하고 다음 메시지로 넘어갑니다.
    /// 큐 자체의 조회 실패만 에러로 반환합니다.
    pub async fn process_messages(&mut self) -> Result<CollectionStats> {
        let start = Instant::now();
        let mut stats = CollectionStats::new();

        self.set_state(WorkerState::Checking);
        let pending = self.queue.approximate_message_count().await?;
        if pending == 0 {
            tracing::info!("대기 중인 job 없음, 실행 건너뛰기");
            self.set_state(WorkerState::Skipped);
            stats.skipped = 1;
            stats.elapsed = start.elapsed();
            return Ok(stats);
        }

        tracing::info!(pending, "job 처리 시작");

        loop {
            if self.options.max_messages > 0 && stats.total >= self.options.max_messages {
                tracing::info!(max = self.options.max_messages, "최대 처리 수 도달");
                break;
            }

            let messages = self
                .queue
                .receive_messages(1, self.options.visibility_timeout)
                .await?;
            let Some(message) = messages.into_iter().next() else {
                break;
            };

            stats.total += 1;
            match self.process_message(&message).await {
                Ok(MessageOutcome::Written(count)) => {
                    stats.success += 1;
                    stats.total_records += count;
                    if count == 0 {
                        stats.empty += 1;
                    }
                }
                Ok(MessageOutcome::AlreadyCompleted) => {
                    stats.skipped += 1;
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::error!(
                        message_id = %message.id,
                        dequeue_count = message.dequeue_count,
                        error = %e,
                        "job 처리 실패, 메시지 유지"
                    );
                }
            }
            self.set_state(WorkerState::Idle);
        }

        self.set_state(WorkerState::Idle);
        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    async fn process_message(&mut self, message: &QueueMessage) -> Result<MessageOutcome> {
        let job = JobDescriptor::from_envelope(&message.content)?;
        let span = eod_core::job_span!("eod_job", job.exchange_mic, message.id);

        self.handle_job(&job, message).instrument(span).await
    }

    async fn handle_job(
        &mut self,
        job: &JobDescriptor,
        message: &QueueMessage,
    ) -> Result<MessageOutcome> {
        let store = self
            .stores
            .file_store(&job.eod_datastore_name, &job.eod_datastore_container)?;
        let writer = EodWriter::new(store);
        let prefix = job.file_prefix();

        if self.options.skip_completed {
            let completed = writer
                .read_status(&prefix)
                .await?
                .is_some_and(|s| s.is_success());
            if completed {
                tracing::info!(prefix = %prefix, "이미 완료된 job, 바로 ack");
                self.acknowledge(message).await?;
                return Ok(MessageOutcome::AlreadyCompleted);
            }
        }

        self.set_state(WorkerState::Fetching);
        let symbols = job.ticker_symbols();
        tracing::info!(
            exchange = %job.exchange,
            date = %job.date_label(),
            symbols = symbols.len(),
            "EOD 조회"
        );

        let records = match fetch_eod(
            &self.fetcher,
            &job.eod_endpoint(),
            &symbols,
            self.options.max_symbols,
        )
        .await
        {
            Ok(records) => records,
            Err(e) => {
                let status = StatusRecord::failure(&prefix, e.to_string(), Utc::now());
                if let Err(write_err) = writer.write_status(&prefix, &status).await {
                    tracing::warn!(error = %write_err, "실패 상태 기록 실패");
                }
                return Err(e.into());
            }
        };

        self.set_state(WorkerState::Writing);
        let written = writer.write_records(&prefix, &records).await?;
        writer
            .write_status(&prefix, &StatusRecord::success(&prefix, Utc::now()))
            .await?;

        self.acknowledge(message).await?;
        Ok(MessageOutcome::Written(written))
    }

    async fn acknowledge(&mut self, message: &QueueMessage) -> Result<()> {
        self.set_state(WorkerState::Acknowledging);
        self.queue.delete_message(message).await?;
        tracing::debug!(message_id = %message.id, "메시지 삭제");
        Ok(())
    }
}
