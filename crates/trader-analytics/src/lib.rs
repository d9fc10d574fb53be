//! 백테스팅 엔진 및 성과 분석.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 포트폴리오 상태와 주문 실행기 (최소 거래 단위, 수수료, 세금, 슬리피지)
//! - 일별 시뮬레이션 루프 (`BacktestEngine`)
//! - 평가액 시계열 기반 성과 지표 계산
//! - 결과 조립 및 벤치마크 비교
//! - 비동기 작업 래퍼 (`BacktestJob`)
//!
//! # 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trader_analytics::{BacktestConfig, BacktestEngine, BacktestRequest};
//!
//! let engine = BacktestEngine::new(BacktestConfig::korean_market(), Arc::new(provider));
//! let result = engine.run(&BacktestRequest::new(strategy, start, end, dec!(10_000_000)))?;
//! println!("{}", result.summary());
//! ```

pub mod backtest;
pub mod performance;

pub use backtest::{
    run_backtest, BacktestConfig, BacktestEngine, BacktestError, BacktestJob, BacktestRequest,
    BacktestResult, CashFlowKind, Holding, JobStatus, OrderExecutor, PortfolioState,
    ResultAssembler, ScheduledCashFlow, ShortfallSource, SimulationPhase, SimulationWarning,
    TransactionLedger, ValuePoint,
};
pub use performance::{MetricsCalculator, PerformanceMetrics, ReturnSeries, TRADING_DAYS_PER_YEAR};
