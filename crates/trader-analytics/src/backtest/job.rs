//! 비동기 백테스트 작업.
//!
//! 동기식 엔진을 tokio 블로킹 스레드 풀에서 실행하고
//! `Pending → Succeeded | Failed` 상태를 watch 채널로 노출합니다.

use super::engine::{BacktestEngine, BacktestRequest};
use super::error::{BacktestError, Result};
use super::result::BacktestResult;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// 작업 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// 실행 중
    Pending,
    /// 결과 생성 완료
    Succeeded,
    /// 실패 (취소 포함)
    Failed(String),
}

impl JobStatus {
    /// 더 이상 바뀌지 않는 상태인지 확인합니다.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// 백그라운드에서 실행 중인 백테스트.
pub struct BacktestJob {
    id: Uuid,
    status: watch::Receiver<JobStatus>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<Arc<BacktestResult>>>,
}

impl BacktestJob {
    /// 블로킹 스레드 풀에서 백테스트를 시작합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn spawn(engine: BacktestEngine, request: BacktestRequest) -> Self {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(JobStatus::Pending);
        let engine = engine.with_cancellation(cancel.clone()).with_job_id(id);

        info!(job_id = %id, strategy = %request.strategy.name, "백테스트 작업 등록");

        let handle = tokio::task::spawn_blocking(move || {
            let outcome = engine.run(&request).map(Arc::new);
            let status = match &outcome {
                Ok(_) => JobStatus::Succeeded,
                Err(e) => {
                    error!(job_id = %id, error = %e, "백테스트 작업 실패");
                    JobStatus::Failed(e.to_string())
                }
            };
            status_tx.send_replace(status);
            outcome
        });

        Self {
            id,
            status: status_rx,
            cancel,
            handle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 현재 상태.
    pub fn status(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// 상태 변화를 구독합니다.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status.clone()
    }

    /// 실행 중인 시뮬레이션에 취소 신호를 보냅니다.
    ///
    /// 다음 거래일 처리 전에 확인되며, 작업은 `Cancelled` 오류로 끝납니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 작업 완료를 기다립니다.
    pub async fn wait(self) -> Result<Arc<BacktestResult>> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(BacktestError::Execution(format!("백테스트 작업 중단: {}", e))),
        }
    }
}
