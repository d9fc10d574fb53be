//! 매수 후 보유.
//!
//! 첫 시뮬레이션일에만 목표 비중으로 매수하고 이후에는 신호를 내지 않습니다.

use crate::config::{normalize_weights, BuyAndHoldParams, WeightMap};
use crate::error::SignalError;
use crate::signal::{Signal, SignalContext, SignalEngine, TargetAllocation};

/// 매수 후 보유 신호 엔진.
#[derive(Debug, Clone)]
pub struct BuyAndHoldSignal {
    weights: WeightMap,
    issued: bool,
}

impl BuyAndHoldSignal {
    /// 파라미터로 생성합니다.
    pub fn new(params: &BuyAndHoldParams) -> Self {
        Self {
            weights: normalize_weights(&params.weights),
            issued: false,
        }
    }
}

impl SignalEngine for BuyAndHoldSignal {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn evaluate(&mut self, _ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError> {
        if self.issued {
            return Ok(None);
        }
        self.issued = true;
        Ok(Some(Signal::new(
            TargetAllocation::Weights(self.weights.clone()),
            "초기 매수",
        )))
    }
}
