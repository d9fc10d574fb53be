//! 모멘텀 순위.
//!
//! 매월 첫 시뮬레이션일(재평가 경계)에 후보 자산의 룩백 기간 총수익률을 계산하고,
//! 상위 N개 자산을 동일 비중으로 보유합니다.
//!
//! # 계산 공식
//!
//! ```text
//! 수익률 = 기준일 종가 / 룩백 시작일 이후 첫 종가 - 1
//! ```
//!
//! 수익률이 같으면 자산 ID 오름차순으로 순위를 정합니다.
//! 선택 결과가 직전과 같으면 거래하지 않습니다.

use crate::config::MomentumParams;
use crate::error::SignalError;
use crate::schedule::month_key;
use crate::signal::{MarketView, Signal, SignalContext, SignalEngine, TargetAllocation};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use trader_core::{DecimalExt, PriceSeries};

/// 룩백 기간 총수익률.
///
/// 룩백 구간 안에 두 개 이상의 서로 다른 날짜 가격이 없으면 `None`.
pub fn trailing_return(series: &PriceSeries, as_of: NaiveDate, months: u32) -> Option<Decimal> {
    let window_start = as_of.checked_sub_months(Months::new(months))?;
    let end = series.last_on_or_before(as_of)?;
    let start = series.first_on_or_after(window_start)?;
    if start.date >= end.date || start.close <= Decimal::ZERO {
        return None;
    }
    Some(end.close / start.close - Decimal::ONE)
}

/// 모멘텀 점수 (자산, 수익률). 점수 내림차순, 동률은 자산 ID 오름차순.
pub fn rank_by_momentum(
    market: &MarketView<'_>,
    pool: &[String],
    months: u32,
    series_of: impl Fn(&str) -> Option<PriceSeries>,
) -> Vec<(String, Decimal)> {
    let mut scores: Vec<(String, Decimal)> = pool
        .iter()
        .filter_map(|asset| {
            let series = series_of(asset)?;
            trailing_return(&series, market.date(), months).map(|r| (asset.clone(), r))
        })
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scores
}

/// 모멘텀 신호 엔진.
#[derive(Debug, Clone)]
pub struct MomentumSignal {
    params: MomentumParams,
    last_period: Option<(i32, u32)>,
    selection: Option<Vec<String>>,
    notes: Vec<String>,
}

impl MomentumSignal {
    /// 파라미터로 생성합니다.
    pub fn new(params: &MomentumParams) -> Self {
        Self {
            params: params.clone(),
            last_period: None,
            selection: None,
            notes: Vec::new(),
        }
    }
}

impl SignalEngine for MomentumSignal {
    fn name(&self) -> &str {
        "momentum"
    }

    fn evaluate(&mut self, ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError> {
        let period = month_key(ctx.date);
        if self.last_period == Some(period) {
            return Ok(None);
        }
        self.last_period = Some(period);

        let history = |asset: &str| {
            let points = ctx.market.history(asset);
            (!points.is_empty()).then(|| PriceSeries::new(points.to_vec()))
        };
        let scores = rank_by_momentum(
            &ctx.market,
            &self.params.asset_pool,
            self.params.lookback_months,
            history,
        );

        if scores.is_empty() {
            warn!(date = %ctx.date, "모멘텀 계산 가능한 자산이 없어 재평가를 건너뜀");
            self.notes.push(format!(
                "[{}] 모멘텀 재평가 건너뜀: 계산 가능한 자산 없음",
                ctx.date
            ));
            return Ok(None);
        }

        let mut selected: Vec<String> = scores
            .iter()
            .take(self.params.top_n)
            .map(|(asset, _)| asset.clone())
            .collect();
        selected.sort();

        let ranking = scores
            .iter()
            .map(|(asset, r)| format!("{} {}", asset, r.to_percentage_string()))
            .collect::<Vec<_>>()
            .join(", ");
        debug!(date = %ctx.date, ranking = %ranking, selected = ?selected, "모멘텀 재평가");

        if self.selection.as_ref() == Some(&selected) {
            return Ok(None);
        }

        let target = TargetAllocation::equal_weight(&selected);
        self.selection = Some(selected);
        Ok(Some(Signal::new(
            target,
            format!("모멘텀 순위 [{}]", ranking),
        )))
    }

    fn drain_notes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::Fixture;
    use rust_decimal_macros::dec;

    fn params(pool: &[&str], top_n: usize) -> MomentumParams {
        MomentumParams {
            asset_pool: pool.iter().map(|s| s.to_string()).collect(),
            lookback_months: 3,
            top_n,
            risk_free_asset: None,
        }
    }

    /// 2024-01-01부터 2024-04-01(index 91)까지 선형 경로.
    fn linear(from: f64, to: f64) -> Vec<f64> {
        (0..=91)
            .map(|i| from + (to - from) * i as f64 / 91.0)
            .collect()
    }

    #[test]
    fn test_trailing_return() {
        let fixture = Fixture::new().with_closes("A", &[100.0, 105.0, 110.0]);
        let series = PriceSeries::new(fixture.history("A").to_vec());
        let as_of = fixture.date(2);
        assert_eq!(trailing_return(&series, as_of, 1), Some(dec!(0.1)));
        // 룩백 구간 내 한 점뿐이면 계산 불가
        assert_eq!(trailing_return(&series, fixture.date(0), 1), None);
    }

    #[test]
    fn test_selects_best_performer() {
        // 3개월 수익률: A +5%, B +10%, C -2% (동일한 선형 경로)
        let fixture = Fixture::new()
            .with_closes("A", &linear(100.0, 105.0))
            .with_closes("B", &linear(100.0, 110.0))
            .with_closes("C", &linear(100.0, 98.0));
        let mut engine = MomentumSignal::new(&params(&["A", "B", "C"], 1));

        // 2024-04-01 (index 91): 재평가 경계
        let day = 91;
        let signal = engine.evaluate(&fixture.ctx(day)).unwrap().unwrap();
        assert_eq!(
            signal.target,
            TargetAllocation::Weights([("B".to_string(), dec!(1))].into_iter().collect())
        );

        // 같은 달에는 재평가하지 않음
        assert!(engine.evaluate(&fixture.ctx(day + 1)).unwrap().is_none());
    }

    #[test]
    fn test_unchanged_selection_is_silent() {
        let fixture = Fixture::new()
            .with_closes("A", &linear(100.0, 130.0))
            .with_closes("B", &linear(100.0, 90.0));
        let mut engine = MomentumSignal::new(&params(&["A", "B"], 1));

        // 2월 1일 (index 31), 3월 1일 (index 60)
        assert!(engine.evaluate(&fixture.ctx(31)).unwrap().is_some());
        assert!(engine.evaluate(&fixture.ctx(60)).unwrap().is_none());
    }

    #[test]
    fn test_top_n_equal_split_and_tie_break() {
        let fixture = Fixture::new()
            .with_closes("B", &linear(100.0, 110.0))
            .with_closes("A", &linear(100.0, 110.0))
            .with_closes("C", &linear(100.0, 120.0));
        let scores = rank_by_momentum(
            &fixture.view(91),
            &["B".to_string(), "A".to_string(), "C".to_string()],
            3,
            |asset| Some(PriceSeries::new(fixture.history(asset).to_vec())),
        );
        let order: Vec<&str> = scores.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);

        let mut engine = MomentumSignal::new(&params(&["A", "B", "C"], 2));
        let signal = engine.evaluate(&fixture.ctx(91)).unwrap().unwrap();
        assert_eq!(
            signal.target,
            TargetAllocation::Weights(
                [("A".to_string(), dec!(0.5)), ("C".to_string(), dec!(0.5))]
                    .into_iter()
                    .collect()
            )
        );
    }

    #[test]
    fn test_skipped_reevaluation_leaves_note() {
        // 룩백 시작 이후 가격이 한 점뿐이라 수익률 계산 불가
        let fixture = Fixture::new().with_closes("A", &[100.0]);
        let mut engine = MomentumSignal::new(&params(&["A", "B"], 1));

        assert!(engine.evaluate(&fixture.ctx(0)).unwrap().is_none());
        assert_eq!(
            engine.drain_notes(),
            vec!["[2024-01-01] 모멘텀 재평가 건너뜀: 계산 가능한 자산 없음".to_string()]
        );
        assert!(engine.drain_notes().is_empty());

        // 같은 달 재평가 없음은 기록하지 않음
        assert!(engine.evaluate(&fixture.ctx(1)).unwrap().is_none());
        assert!(engine.drain_notes().is_empty());
    }
}
