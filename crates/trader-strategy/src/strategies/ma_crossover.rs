//! 이동평균 교차.
//!
//! 자산별로 단기/장기 단순이동평균을 비교합니다.
//! - 단기 > 장기: 투자 (자산 슬롯 비중만큼 보유)
//! - 단기 < 장기: 청산 (현금 보유)
//! - 동일: 직전 상태 유지
//!
//! 데이터가 장기 기간보다 짧으면 직전 상태를 유지합니다 (초기 상태는 미투자).
//! 어느 자산이든 상태가 바뀐 날과 첫날에만 신호를 냅니다.

use crate::config::{MovingAverageCrossoverParams, WeightMap};
use crate::error::SignalError;
use crate::signal::{Signal, SignalContext, SignalEngine, TargetAllocation};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;
use trader_core::PricePoint;

/// 최근 `window`개 종가의 단순이동평균.
pub fn simple_moving_average(history: &[PricePoint], window: usize) -> Option<Decimal> {
    if window == 0 || history.len() < window {
        return None;
    }
    let sum: Decimal = history[history.len() - window..]
        .iter()
        .map(|p| p.close)
        .sum();
    Some(sum / Decimal::from(window))
}

/// 이동평균 교차 신호 엔진.
#[derive(Debug, Clone)]
pub struct MovingAverageCrossoverSignal {
    slot_weights: WeightMap,
    short_window: usize,
    long_window: usize,
    invested: BTreeMap<String, bool>,
    started: bool,
}

impl MovingAverageCrossoverSignal {
    /// 파라미터로 생성합니다.
    pub fn new(params: &MovingAverageCrossoverParams) -> Self {
        Self {
            slot_weights: params.slot_weights(),
            short_window: params.short_window,
            long_window: params.long_window,
            invested: params.assets.iter().map(|a| (a.clone(), false)).collect(),
            started: false,
        }
    }

    fn target(&self) -> TargetAllocation {
        let weights = self
            .invested
            .iter()
            .filter(|(_, invested)| **invested)
            .filter_map(|(asset, _)| {
                self.slot_weights
                    .get(asset)
                    .map(|weight| (asset.clone(), *weight))
            })
            .collect();
        TargetAllocation::Weights(weights)
    }
}

impl SignalEngine for MovingAverageCrossoverSignal {
    fn name(&self) -> &str {
        "moving_average_crossover"
    }

    fn evaluate(&mut self, ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError> {
        let mut changes = Vec::new();

        for (asset, invested) in self.invested.iter_mut() {
            let history = ctx.market.history(asset);
            let (Some(short), Some(long)) = (
                simple_moving_average(history, self.short_window),
                simple_moving_average(history, self.long_window),
            ) else {
                continue;
            };

            let next = match short.cmp(&long) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => *invested,
            };

            if next != *invested {
                debug!(
                    asset = %asset,
                    short_ma = %short,
                    long_ma = %long,
                    invested = next,
                    "이동평균 교차"
                );
                changes.push(format!(
                    "{} {} (단기 {:.4} / 장기 {:.4})",
                    asset,
                    if next { "골든크로스" } else { "데드크로스" },
                    short,
                    long
                ));
                *invested = next;
            }
        }

        if self.started && changes.is_empty() {
            return Ok(None);
        }

        let reason = if self.started {
            changes.join(", ")
        } else if changes.is_empty() {
            "초기 상태: 교차 신호 없음".to_string()
        } else {
            format!("초기 상태: {}", changes.join(", "))
        };
        self.started = true;

        Ok(Some(Signal::new(self.target(), reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::Fixture;
    use rust_decimal_macros::dec;

    fn params(short: usize, long: usize) -> MovingAverageCrossoverParams {
        MovingAverageCrossoverParams {
            assets: vec!["SPY".to_string()],
            weights: None,
            short_window: short,
            long_window: long,
        }
    }

    fn weight_of(signal: &Signal, asset: &str) -> Decimal {
        match &signal.target {
            TargetAllocation::Weights(w) => w.get(asset).copied().unwrap_or_default(),
            other => panic!("unexpected target: {:?}", other),
        }
    }

    #[test]
    fn test_simple_moving_average() {
        let fixture = Fixture::new().with_closes("A", &[1.0, 2.0, 3.0, 4.0]);
        let history = fixture.history("A");
        assert_eq!(simple_moving_average(history, 2), Some(dec!(3.5)));
        assert_eq!(simple_moving_average(history, 4), Some(dec!(2.5)));
        assert_eq!(simple_moving_average(history, 5), None);
    }

    #[test]
    fn test_golden_and_dead_cross() {
        // 하락 후 상승 후 다시 하락
        let closes = [10.0, 9.0, 8.0, 7.0, 8.0, 10.0, 12.0, 9.0, 6.0, 4.0];
        let fixture = Fixture::new().with_closes("SPY", &closes);
        let mut engine = MovingAverageCrossoverSignal::new(&params(2, 4));

        let mut decisions = Vec::new();
        for day in 0..closes.len() {
            if let Some(signal) = engine.evaluate(&fixture.ctx(day)).unwrap() {
                decisions.push((day, weight_of(&signal, "SPY")));
            }
        }

        // 첫날 미투자, 5일차 골든크로스 (9 > 8.25), 8일차 데드크로스 (7.5 < 9.25)
        assert_eq!(
            decisions,
            vec![(0, dec!(0)), (5, dec!(1)), (8, dec!(0))]
        );
    }

    #[test]
    fn test_equal_averages_retain_state() {
        let closes = [5.0, 5.0, 5.0, 5.0, 5.0, 5.0];
        let fixture = Fixture::new().with_closes("SPY", &closes);
        let mut engine = MovingAverageCrossoverSignal::new(&params(2, 3));

        assert!(engine.evaluate(&fixture.ctx(0)).unwrap().is_some());
        for day in 1..closes.len() {
            assert!(engine.evaluate(&fixture.ctx(day)).unwrap().is_none());
        }
    }
}
