//! 백테스트 전략 설정 및 신호 엔진.
//!
//! 이 크레이트가 제공하는 기능:
//! - 전략 유형별 파라미터를 가지는 `StrategyConfig` 태그드 유니온과 검증
//! - 리밸런싱/재평가 주기 계산
//! - 펀더멘털 필터 조건 파서
//! - 유형별 `SignalEngine` 구현
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_strategy::{build_signal_engine, StrategyConfig};
//!
//! let config = StrategyConfig::from_toml_str(&std::fs::read_to_string("strategy.toml")?)?;
//! let mut engine = build_signal_engine(&config);
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod schedule;
pub mod signal;
pub mod strategies;

pub use condition::{ComparisonOperator, ComparisonTarget, FundamentalCondition, MetricView};
pub use config::{
    normalize_weights, AssetAllocationParams, BuyAndHoldParams, FundamentalRankingParams,
    MomentumParams, MovingAverageCrossoverParams, RankingOrder, StrategyConfig, StrategyParams,
    StrategyType, WeightMap,
};
pub use error::{ConfigResult, ConfigurationError, SignalError};
pub use schedule::{ReEvaluationFrequency, RebalanceFrequency};
pub use signal::{MarketView, Signal, SignalContext, SignalEngine, TargetAllocation};
pub use strategies::build_signal_engine;
