//! 펀더멘털 지표 순위.
//!
//! 재평가 경계(연/분기 변경)마다:
//! 1. 후보 자산별로 기준일 시점의 펀더멘털 스냅샷을 조회
//! 2. 모든 조건을 만족하는 자산만 남김 (필요 지표가 없으면 탈락)
//! 3. 순위 지표로 정렬 (동률은 자산 ID 오름차순)
//! 4. 상위 N개를 동일 비중으로 보유, 나머지는 매도
//!
//! 기준일 종가가 없는 자산은 거래할 수 없으므로 제외합니다.

use crate::condition::MetricView;
use crate::config::{FundamentalRankingParams, RankingOrder};
use crate::error::SignalError;
use crate::signal::{Signal, SignalContext, SignalEngine, TargetAllocation};
use rust_decimal::Decimal;
use tracing::debug;

/// 펀더멘털 순위 신호 엔진.
#[derive(Debug, Clone)]
pub struct FundamentalRankingSignal {
    params: FundamentalRankingParams,
    last_period: Option<(i32, u32)>,
}

impl FundamentalRankingSignal {
    /// 파라미터로 생성합니다.
    pub fn new(params: &FundamentalRankingParams) -> Self {
        Self {
            params: params.clone(),
            last_period: None,
        }
    }

    /// 조건을 통과한 자산의 (자산, 순위 지표 값)을 순위대로 반환합니다.
    pub fn rank(&self, ctx: &SignalContext<'_>) -> Result<Vec<(String, Decimal)>, SignalError> {
        let provider = ctx
            .fundamentals
            .ok_or(SignalError::MissingFundamentalProvider)?;

        let mut ranked = Vec::new();
        for asset in &self.params.universe {
            let Some(price) = ctx.market.latest_price(asset) else {
                debug!(asset = %asset, "가격 없음, 순위에서 제외");
                continue;
            };

            let snapshot = provider.get_fundamentals(asset, ctx.date)?;
            let view = MetricView::new(&snapshot, Some(price));

            let passed = self
                .params
                .conditions
                .iter()
                .all(|cond| cond.evaluate(&view).unwrap_or(false));
            if !passed {
                continue;
            }

            if let Some(value) = view.get(&self.params.ranking_metric.to_lowercase()) {
                ranked.push((asset.clone(), value));
            }
        }

        ranked.sort_by(|a, b| {
            let by_value = match self.params.ranking_order {
                RankingOrder::Asc => a.1.cmp(&b.1),
                RankingOrder::Desc => b.1.cmp(&a.1),
            };
            by_value.then_with(|| a.0.cmp(&b.0))
        });
        Ok(ranked)
    }
}

impl SignalEngine for FundamentalRankingSignal {
    fn name(&self) -> &str {
        "fundamental_ranking"
    }

    fn evaluate(&mut self, ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError> {
        let period = self.params.re_evaluation_frequency.period_key(ctx.date);
        if self.last_period == Some(period) {
            return Ok(None);
        }
        self.last_period = Some(period);

        let ranked = self.rank(ctx)?;
        let selected: Vec<String> = ranked
            .iter()
            .take(self.params.top_n)
            .map(|(asset, _)| asset.clone())
            .collect();

        debug!(
            date = %ctx.date,
            survivors = ranked.len(),
            selected = ?selected,
            "펀더멘털 재평가"
        );

        let reason = format!(
            "{} 기준 {}개 통과, 선택 [{}]",
            self.params.ranking_metric,
            ranked.len(),
            selected.join(", ")
        );
        Ok(Some(Signal::new(TargetAllocation::equal_weight(&selected), reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ReEvaluationFrequency;
    use crate::strategies::test_support::Fixture;
    use rust_decimal_macros::dec;
    use trader_data::InMemoryFundamentalProvider;

    fn params(order: RankingOrder, top_n: usize, conditions: &[&str]) -> FundamentalRankingParams {
        FundamentalRankingParams {
            universe: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
            conditions: conditions.iter().map(|c| c.parse().unwrap()).collect(),
            ranking_metric: "roe".to_string(),
            ranking_order: order,
            top_n,
            re_evaluation_frequency: ReEvaluationFrequency::Quarterly,
        }
    }

    fn provider(fixture: &Fixture) -> InMemoryFundamentalProvider {
        let date = fixture.date(0);
        InMemoryFundamentalProvider::new()
            .with_snapshot("A", date, [("per", dec!(8)), ("roe", dec!(0.10))])
            .with_snapshot("B", date, [("per", dec!(12)), ("roe", dec!(0.25))])
            .with_snapshot("C", date, [("per", dec!(6)), ("roe", dec!(0.18))])
            .with_snapshot("D", date, [("roe", dec!(0.30))])
    }

    fn fixture() -> Fixture {
        Fixture::new()
            .with_closes("A", &[10.0; 100])
            .with_closes("B", &[10.0; 100])
            .with_closes("C", &[10.0; 100])
            .with_closes("D", &[10.0; 100])
    }

    #[test]
    fn test_filter_then_rank_desc() {
        let fixture = fixture();
        let provider = provider(&fixture);
        let mut engine =
            FundamentalRankingSignal::new(&params(RankingOrder::Desc, 1, &["per < 10"]));

        let signal = engine
            .evaluate(&fixture.ctx_with_fundamentals(0, &provider))
            .unwrap()
            .unwrap();
        // B는 PER 탈락, D는 PER 없음 → A, C 중 ROE 높은 C
        assert_eq!(
            signal.target,
            TargetAllocation::Weights([("C".to_string(), dec!(1))].into_iter().collect())
        );
    }

    #[test]
    fn test_rank_ascending_without_conditions() {
        let fixture = fixture();
        let provider = provider(&fixture);
        let engine = FundamentalRankingSignal::new(&params(RankingOrder::Asc, 2, &[]));

        let ranked = engine
            .rank(&fixture.ctx_with_fundamentals(0, &provider))
            .unwrap();
        let order: Vec<&str> = ranked.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_re_evaluates_once_per_quarter() {
        let fixture = fixture();
        let provider = provider(&fixture);
        let mut engine = FundamentalRankingSignal::new(&params(RankingOrder::Desc, 2, &[]));

        let decisions: Vec<usize> = (0..100)
            .filter(|day| {
                engine
                    .evaluate(&fixture.ctx_with_fundamentals(*day, &provider))
                    .unwrap()
                    .is_some()
            })
            .collect();
        // 2024-01-01, 2024-04-01
        assert_eq!(decisions, vec![0, 91]);
    }

    #[test]
    fn test_missing_provider_is_error() {
        let fixture = fixture();
        let mut engine = FundamentalRankingSignal::new(&params(RankingOrder::Desc, 1, &[]));
        let err = engine.evaluate(&fixture.ctx(0)).unwrap_err();
        assert!(matches!(err, SignalError::MissingFundamentalProvider));
    }
}
