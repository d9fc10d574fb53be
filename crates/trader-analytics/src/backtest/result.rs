//! 백테스트 결과 조립.
//!
//! `ResultAssembler`가 평가액 이력, 거래 원장, 성과 지표를 하나의 불변 스냅샷으로 묶습니다.

use crate::performance::{MetricsCalculator, PerformanceMetrics};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trader_core::{DecimalExt, SimulatedTransaction, TransactionType};

/// 특정 날짜의 포트폴리오 평가액.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl ValuePoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// 백테스트 결과.
///
/// 조립 이후 변경되지 않습니다. JSON으로 직렬화해 저장할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    strategy_id: String,
    strategy_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    initial_capital: Decimal,
    final_capital: Decimal,
    total_return: f64,
    value_history: Vec<ValuePoint>,
    transactions: Vec<SimulatedTransaction>,
    metrics: PerformanceMetrics,
    daily_returns: BTreeMap<NaiveDate, f64>,
    cumulative_returns: BTreeMap<NaiveDate, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    benchmarks: BTreeMap<String, Vec<ValuePoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    debug_log: Option<Vec<String>>,
}

impl BacktestResult {
    pub fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    /// 마지막 거래일 평가액.
    pub fn final_capital(&self) -> Decimal {
        self.final_capital
    }

    /// 초기 자본 대비 총 수익률 (비율).
    pub fn total_return(&self) -> f64 {
        self.total_return
    }

    pub fn value_history(&self) -> &[ValuePoint] {
        &self.value_history
    }

    pub fn transactions(&self) -> &[SimulatedTransaction] {
        &self.transactions
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn daily_returns(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.daily_returns
    }

    pub fn cumulative_returns(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.cumulative_returns
    }

    /// 초기 자본으로 정규화된 벤치마크 시계열.
    pub fn benchmarks(&self) -> &BTreeMap<String, Vec<ValuePoint>> {
        &self.benchmarks
    }

    /// 디버그 모드에서 기록된 로그.
    pub fn debug_log(&self) -> Option<&[String]> {
        self.debug_log.as_deref()
    }

    /// 누적 수수료.
    pub fn total_fees(&self) -> Decimal {
        self.transactions.iter().map(|t| t.fee).sum()
    }

    /// 누적 세금.
    pub fn total_taxes(&self) -> Decimal {
        self.transactions.iter().map(|t| t.tax).sum()
    }

    /// 매수/매도 거래 수.
    pub fn trade_count(&self) -> usize {
        self.transactions
            .iter()
            .filter(|t| t.transaction_type.changes_quantity())
            .count()
    }

    /// 요약 문자열 반환
    pub fn summary(&self) -> String {
        let duration_days = (self.end_date - self.start_date).num_days();
        let dividends: Decimal = self
            .transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Dividend)
            .map(|t| t.quantity)
            .sum();

        let mut summary = format!(
            "백테스트 결과 요약: {}\n\
             ═══════════════════════════════════════\n\
             기간: {} → {} ({} 일)\n\
             거래일 수: {}\n\
             ───────────────────────────────────────\n\
             초기 자본: {:.2}\n\
             최종 자산: {:.2}\n\
             총 수익률: {:.2}%\n\
             연율화 수익률: {:.2}%\n\
             ───────────────────────────────────────\n\
             변동성: {:.2}%\n\
             최대 낙폭: {:.2}%\n\
             샤프 비율: {:.2}\n\
             ───────────────────────────────────────\n\
             총 거래: {}\n\
             총 수수료: {:.2}\n\
             총 세금: {:.2}\n\
             배당 수령: {:.2}\n",
            self.strategy_name,
            self.start_date,
            self.end_date,
            duration_days,
            self.value_history.len(),
            self.initial_capital,
            self.final_capital,
            self.total_return * 100.0,
            self.metrics.annualized_return * 100.0,
            self.metrics.volatility * 100.0,
            self.metrics.max_drawdown * 100.0,
            self.metrics.sharpe_ratio,
            self.trade_count(),
            self.total_fees(),
            self.total_taxes(),
            dividends,
        );

        if !self.benchmarks.is_empty() {
            summary.push_str("───────────────────────────────────────\n");
            for (id, series) in &self.benchmarks {
                if let Some(last) = series.last() {
                    let ret = if self.initial_capital.is_zero() {
                        Decimal::ZERO
                    } else {
                        last.value / self.initial_capital - Decimal::ONE
                    };
                    summary.push_str(&format!(
                        "벤치마크 {}: {}\n",
                        id,
                        ret.to_percentage_string()
                    ));
                }
            }
        }
        summary.push_str("═══════════════════════════════════════");
        summary
    }
}

/// 시뮬레이션 산출물을 `BacktestResult`로 조립합니다.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    strategy_id: String,
    strategy_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    initial_capital: Decimal,
    calculator: MetricsCalculator,
    benchmarks: BTreeMap<String, Vec<ValuePoint>>,
    debug_log: Option<Vec<String>>,
}

impl ResultAssembler {
    pub fn new(
        strategy_id: impl Into<String>,
        strategy_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: Decimal,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            strategy_name: strategy_name.into(),
            start_date,
            end_date,
            initial_capital,
            calculator: MetricsCalculator::new(),
            benchmarks: BTreeMap::new(),
            debug_log: None,
        }
    }

    pub fn with_calculator(mut self, calculator: MetricsCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_benchmarks(mut self, benchmarks: BTreeMap<String, Vec<ValuePoint>>) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    pub fn with_debug_log(mut self, debug_log: Option<Vec<String>>) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// 최종 결과를 조립합니다. 최종 자산은 마지막 평가액입니다.
    pub fn assemble(
        self,
        value_history: Vec<ValuePoint>,
        transactions: Vec<SimulatedTransaction>,
    ) -> BacktestResult {
        let metrics = self.calculator.calculate(&value_history);
        let returns = self.calculator.return_series(&value_history);
        let final_capital = value_history
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_capital);
        let total_return = if self.initial_capital.is_zero() {
            0.0
        } else {
            (final_capital / self.initial_capital - Decimal::ONE).to_f64_lossy()
        };

        BacktestResult {
            strategy_id: self.strategy_id,
            strategy_name: self.strategy_name,
            start_date: self.start_date,
            end_date: self.end_date,
            initial_capital: self.initial_capital,
            final_capital,
            total_return,
            value_history,
            transactions,
            metrics,
            daily_returns: returns.daily,
            cumulative_returns: returns.cumulative,
            benchmarks: self.benchmarks,
            debug_log: self.debug_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> BacktestResult {
        let history = vec![
            ValuePoint::new(d(2), dec!(1000)),
            ValuePoint::new(d(3), dec!(1100)),
            ValuePoint::new(d(4), dec!(1050)),
        ];
        ResultAssembler::new("s-1", "테스트 전략", d(2), d(4), dec!(1000))
            .with_debug_log(Some(vec!["[2024-01-02] 리밸런싱".to_string()]))
            .assemble(history, Vec::new())
    }

    #[test]
    fn test_assemble_derives_final_capital() {
        let result = sample();
        assert_eq!(result.final_capital(), dec!(1050));
        assert!((result.total_return() - 0.05).abs() < 1e-12);
        assert_eq!(result.daily_returns().len(), 2);
        assert_eq!(result.cumulative_returns().len(), 3);
        assert!(result.metrics().max_drawdown < 0.0);
        assert_eq!(result.debug_log().map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_result_json_roundtrip() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        let restored: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value_history(), result.value_history());
        assert_eq!(restored.final_capital(), result.final_capital());
    }

    #[test]
    fn test_summary_mentions_strategy() {
        let summary = sample().summary();
        assert!(summary.contains("테스트 전략"));
        assert!(summary.contains("최종 자산: 1050.00"));
    }
}
