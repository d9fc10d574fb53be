//! 고정 비중 자산 배분 (리밸런싱).
//!
//! 다음 중 하나라도 해당하면 목표 비중으로 되돌립니다:
//! 1. 첫 시뮬레이션일 (초기 매수)
//! 2. 리밸런싱 주기 경계를 넘은 날
//! 3. 어느 자산이든 목표 비중 대비 이탈이 임계값을 초과한 날 (임계값 설정 시)

use crate::config::{normalize_weights, AssetAllocationParams, WeightMap};
use crate::error::SignalError;
use crate::schedule::RebalanceFrequency;
use crate::signal::{Signal, SignalContext, SignalEngine, TargetAllocation};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// 목표 비중 대비 최대 이탈 (자산, 이탈폭).
///
/// 목표에 없는 보유 자산은 목표 0으로 간주합니다.
pub fn max_weight_deviation(
    targets: &WeightMap,
    current: &BTreeMap<String, Decimal>,
) -> Option<(String, Decimal)> {
    let target_devs = targets.iter().map(|(asset, target)| {
        let held = current.get(asset).copied().unwrap_or_default();
        (asset.clone(), (held - *target).abs())
    });
    let stray_devs = current
        .iter()
        .filter(|(asset, _)| !targets.contains_key(*asset))
        .map(|(asset, held)| (asset.clone(), held.abs()));

    target_devs
        .chain(stray_devs)
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
}

/// 자산 배분 신호 엔진.
#[derive(Debug, Clone)]
pub struct AssetAllocationSignal {
    weights: WeightMap,
    frequency: RebalanceFrequency,
    threshold: Option<Decimal>,
    last_date: Option<NaiveDate>,
}

impl AssetAllocationSignal {
    /// 파라미터로 생성합니다.
    pub fn new(params: &AssetAllocationParams) -> Self {
        Self {
            weights: normalize_weights(&params.weights),
            frequency: params.rebalancing_frequency,
            threshold: params.rebalancing_threshold,
            last_date: None,
        }
    }

    fn trigger_reason(&self, ctx: &SignalContext<'_>) -> Option<String> {
        let Some(prev) = self.last_date else {
            return Some("초기 매수".to_string());
        };

        if self.frequency.crosses_boundary(prev, ctx.date) {
            return Some(format!("{} 리밸런싱", self.frequency));
        }

        let threshold = self.threshold?;
        let (asset, deviation) = max_weight_deviation(&self.weights, ctx.current_weights)?;
        if deviation > threshold {
            Some(format!(
                "{} 비중 이탈 {:.4} > 임계값 {}",
                asset, deviation, threshold
            ))
        } else {
            None
        }
    }
}

impl SignalEngine for AssetAllocationSignal {
    fn name(&self) -> &str {
        "asset_allocation"
    }

    fn evaluate(&mut self, ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError> {
        let reason = self.trigger_reason(ctx);
        self.last_date = Some(ctx.date);

        Ok(reason.map(|reason| {
            debug!(date = %ctx.date, reason = %reason, "리밸런싱 신호");
            Signal::new(TargetAllocation::Weights(self.weights.clone()), reason)
        }))
    }
}
