//! 성과 지표 계산 모듈
//!
//! 일별 평가액 시계열 V[0..n]에서 다음 지표를 계산합니다:
//! - 일별 수익률: r[i] = V[i]/V[i-1] - 1
//! - 누적 수익률: c[i] = V[i]/V[0] - 1
//! - 연율화 수익률 (Annualized Return)
//! - 변동성 (Volatility): 표본 표준편차 × √252
//! - 최대 낙폭 (Maximum Drawdown): 0 이하의 비율
//! - 샤프 비율 (Sharpe Ratio): 무위험 이자율 0 가정
//!
//! 모든 지표는 평가액 시계열의 순수 함수이므로 같은 입력에 대해 항상 같은 값을 반환합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use trader_analytics::performance::MetricsCalculator;
//!
//! let calculator = MetricsCalculator::new();
//! let metrics = calculator.calculate(result.value_history());
//! println!("샤프 비율: {:.2}", metrics.sharpe_ratio);
//! ```

use crate::backtest::ValuePoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trader_core::DecimalExt;

/// 연간 거래일 수 (연율화 계산에 사용)
///
/// 일반적으로 주식 시장은 연간 약 252일 거래됩니다.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// 백테스트 성과 지표
///
/// # 해석
///
/// - `sharpe_ratio` 1.0 이상: 양호, 2.0 이상: 우수
/// - `max_drawdown` -0.1 = 고점 대비 최대 10% 하락
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 연율화 수익률 (비율)
    pub annualized_return: f64,

    /// 연율화 변동성 (비율)
    pub volatility: f64,

    /// 최대 낙폭 (0 이하의 비율)
    pub max_drawdown: f64,

    /// 샤프 비율
    ///
    /// 공식: 연율화 수익률 / 변동성. 변동성이 0이면 0.
    pub sharpe_ratio: f64,
}

impl PerformanceMetrics {
    /// 성과 요약을 문자열로 반환합니다.
    pub fn summary(&self) -> String {
        format!(
            "연수익률: {:.2}% | 변동성: {:.2}% | MDD: {:.2}% | 샤프: {:.2}",
            self.annualized_return * 100.0,
            self.volatility * 100.0,
            self.max_drawdown * 100.0,
            self.sharpe_ratio
        )
    }
}

/// 날짜별 수익률 시계열.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    /// 일별 수익률 (첫 날 제외)
    pub daily: BTreeMap<NaiveDate, f64>,
    /// 시작일 대비 누적 수익률
    pub cumulative: BTreeMap<NaiveDate, f64>,
}

/// 평가액 시계열 기반 성과 지표 계산기.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCalculator {
    periods_per_year: u32,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCalculator {
    /// 연 252 거래일 기준 계산기를 생성합니다.
    pub fn new() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }

    /// 연간 기간 수를 변경합니다 (예: 365일 시장).
    pub fn with_periods_per_year(mut self, periods: u32) -> Self {
        self.periods_per_year = periods.max(1);
        self
    }

    /// 평가액 시계열에서 네 가지 지표를 계산합니다.
    pub fn calculate(&self, history: &[ValuePoint]) -> PerformanceMetrics {
        let values = to_f64(history);
        let returns = Self::daily_returns(&values);

        let annualized_return = self.annualized_return(&values);
        let volatility = self.volatility(&returns);

        PerformanceMetrics {
            annualized_return,
            volatility,
            max_drawdown: Self::max_drawdown(&values),
            sharpe_ratio: Self::sharpe_ratio(annualized_return, volatility),
        }
    }

    /// 날짜별 일별/누적 수익률을 계산합니다.
    pub fn return_series(&self, history: &[ValuePoint]) -> ReturnSeries {
        let values = to_f64(history);
        let daily = history
            .iter()
            .skip(1)
            .zip(Self::daily_returns(&values))
            .map(|(point, r)| (point.date, r))
            .collect();
        let cumulative = history
            .iter()
            .zip(Self::cumulative_returns(&values))
            .map(|(point, c)| (point.date, c))
            .collect();
        ReturnSeries { daily, cumulative }
    }

    /// r[i] = V[i]/V[i-1] - 1 (i = 1..n). 직전 값이 0이면 0.
    pub fn daily_returns(values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .map(|w| finite_or_zero(if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 }))
            .collect()
    }

    /// c[i] = V[i]/V[0] - 1. V[0]이 0이면 모두 0.
    pub fn cumulative_returns(values: &[f64]) -> Vec<f64> {
        let Some(&first) = values.first() else {
            return Vec::new();
        };
        values
            .iter()
            .map(|v| finite_or_zero(if first == 0.0 { 0.0 } else { v / first - 1.0 }))
            .collect()
    }

    /// (V[n]/V[0])^(252/n) - 1. 수익률 관측치가 없으면 0.
    pub fn annualized_return(&self, values: &[f64]) -> f64 {
        let n = values.len().saturating_sub(1);
        if n == 0 {
            return 0.0;
        }
        let (first, last) = (values[0], values[n]);
        if first <= 0.0 {
            return 0.0;
        }
        let growth = (last / first).max(0.0);
        finite_or_zero(growth.powf(self.periods_per_year as f64 / n as f64) - 1.0)
    }

    /// 표본 표준편차 × √252. 관측치가 2개 미만이면 0.
    pub fn volatility(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        finite_or_zero(variance.sqrt() * (self.periods_per_year as f64).sqrt())
    }

    /// min((V[i] - 고점) / 고점). 고점은 누적 최대값이며 결과는 항상 0 이하입니다.
    ///
    /// # 예시
    ///
    /// 1000 → 1200(고점) → 1080(저점) → 1300: MDD = (1080 - 1200) / 1200 = -0.1
    pub fn max_drawdown(values: &[f64]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_drawdown = 0.0_f64;

        for &value in values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                max_drawdown = max_drawdown.min((value - peak) / peak);
            }
        }

        finite_or_zero(max_drawdown).min(0.0)
    }

    /// 연율화 수익률 / 변동성. 변동성이 0이면 0을 반환합니다.
    pub fn sharpe_ratio(annualized_return: f64, volatility: f64) -> f64 {
        if volatility <= 0.0 || !volatility.is_finite() {
            return 0.0;
        }
        finite_or_zero(annualized_return / volatility)
    }
}

fn to_f64(history: &[ValuePoint]) -> Vec<f64> {
    history.iter().map(|p| p.value.to_f64_lossy()).collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
