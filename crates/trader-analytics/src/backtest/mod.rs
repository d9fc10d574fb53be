//! 백테스팅 모듈
//!
//! 과거 일별 가격으로 전략을 시뮬레이션하고 평가액 이력, 거래 원장, 성과 지표를 생성합니다.
//!
//! # 주요 구성요소
//!
//! - [`BacktestConfig`]: 거래 비용, 자산 메타데이터, 예약 현금 흐름
//! - [`OrderExecutor`]: 목표 배분을 최소 거래 단위 주문으로 변환 및 체결
//! - [`BacktestEngine`]: 일별 시뮬레이션 루프
//! - [`ResultAssembler`] / [`BacktestResult`]: 불변 결과 스냅샷
//! - [`BacktestJob`]: 비동기 작업 래퍼

pub mod benchmark;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod job;
pub mod portfolio;
pub mod result;

pub use benchmark::{collect_benchmarks, normalize_to_capital, CollectedBenchmarks};
pub use config::{BacktestConfig, CashFlowKind, ScheduledCashFlow};
pub use engine::{run_backtest, BacktestEngine, BacktestRequest, SimulationPhase};
pub use error::{BacktestError, Result, ShortfallSource, SimulationWarning};
pub use executor::{OrderExecutor, PlannedOrder, TransactionLedger, CASH_ACCOUNT};
pub use job::{BacktestJob, JobStatus};
pub use portfolio::{Holding, PortfolioState};
pub use result::{BacktestResult, ResultAssembler, ValuePoint};
