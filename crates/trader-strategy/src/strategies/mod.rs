//! 전략 유형별 신호 엔진.
//!
//! - `BuyAndHoldSignal`: 매수 후 보유
//! - `MovingAverageCrossoverSignal`: 이동평균 교차
//! - `AssetAllocationSignal`: 고정 비중 리밸런싱
//! - `MomentumSignal`: 모멘텀 상위 N개
//! - `FundamentalRankingSignal`: 펀더멘털 필터 + 순위

pub mod asset_allocation;
pub mod buy_and_hold;
pub mod fundamental_ranking;
pub mod ma_crossover;
pub mod momentum;

pub use asset_allocation::AssetAllocationSignal;
pub use buy_and_hold::BuyAndHoldSignal;
pub use fundamental_ranking::FundamentalRankingSignal;
pub use ma_crossover::MovingAverageCrossoverSignal;
pub use momentum::MomentumSignal;

use crate::config::{StrategyConfig, StrategyParams};
use crate::signal::SignalEngine;

/// 전략 설정에 맞는 신호 엔진을 생성합니다.
pub fn build_signal_engine(config: &StrategyConfig) -> Box<dyn SignalEngine> {
    match config.params() {
        StrategyParams::BuyAndHold(p) => Box::new(BuyAndHoldSignal::new(p)),
        StrategyParams::MovingAverageCrossover(p) => Box::new(MovingAverageCrossoverSignal::new(p)),
        StrategyParams::AssetAllocation(p) => Box::new(AssetAllocationSignal::new(p)),
        StrategyParams::Momentum(p) => Box::new(MomentumSignal::new(p)),
        StrategyParams::FundamentalRanking(p) => Box::new(FundamentalRankingSignal::new(p)),
    }
}
