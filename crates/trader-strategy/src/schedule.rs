//! 리밸런싱/재평가 주기.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 리밸런싱 주기.
///
/// `Daily`와 `Always`는 동일하게 매 시뮬레이션일마다 재확인합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceFrequency {
    /// 매일
    Daily,
    /// 주 단위 (ISO 주차 변경 시)
    Weekly,
    /// 월 단위
    Monthly,
    /// 분기 단위
    Quarterly,
    /// 연 단위
    #[serde(alias = "annually", alias = "yearly")]
    Annual,
    /// 최초 매수 이후 주기 리밸런싱 없음 (임계값 트리거만)
    Never,
    /// 매 시뮬레이션일
    Always,
}

impl Default for RebalanceFrequency {
    fn default() -> Self {
        Self::Monthly
    }
}

impl RebalanceFrequency {
    /// 직전 시뮬레이션일(`prev`)에서 `current`로 넘어오며 주기 경계를 넘었는지 확인합니다.
    pub fn crosses_boundary(&self, prev: NaiveDate, current: NaiveDate) -> bool {
        match self {
            RebalanceFrequency::Daily | RebalanceFrequency::Always => true,
            RebalanceFrequency::Never => false,
            RebalanceFrequency::Weekly => prev.iso_week() != current.iso_week(),
            RebalanceFrequency::Monthly => month_key(prev) != month_key(current),
            RebalanceFrequency::Quarterly => quarter_key(prev) != quarter_key(current),
            RebalanceFrequency::Annual => prev.year() != current.year(),
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RebalanceFrequency::Daily => "daily",
            RebalanceFrequency::Weekly => "weekly",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Annual => "annual",
            RebalanceFrequency::Never => "never",
            RebalanceFrequency::Always => "always",
        };
        write!(f, "{}", s)
    }
}

/// 펀더멘털 전략 재평가 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReEvaluationFrequency {
    /// 분기 단위
    Quarterly,
    /// 연 단위
    #[default]
    #[serde(alias = "annually", alias = "yearly")]
    Annual,
}

impl ReEvaluationFrequency {
    /// 날짜가 속한 재평가 기간 키.
    pub fn period_key(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            ReEvaluationFrequency::Quarterly => quarter_key(date),
            ReEvaluationFrequency::Annual => (date.year(), 0),
        }
    }
}

/// (연도, 월) 키.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// (연도, 분기) 키. 분기는 0..=3.
pub fn quarter_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month0() / 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_boundary() {
        let freq = RebalanceFrequency::Monthly;
        assert!(!freq.crosses_boundary(d(2024, 1, 30), d(2024, 1, 31)));
        assert!(freq.crosses_boundary(d(2024, 1, 31), d(2024, 2, 1)));
        assert!(freq.crosses_boundary(d(2023, 1, 31), d(2024, 1, 2)));
    }

    #[test]
    fn test_quarterly_and_annual_boundary() {
        assert!(!RebalanceFrequency::Quarterly.crosses_boundary(d(2024, 1, 31), d(2024, 3, 29)));
        assert!(RebalanceFrequency::Quarterly.crosses_boundary(d(2024, 3, 29), d(2024, 4, 1)));
        assert!(!RebalanceFrequency::Annual.crosses_boundary(d(2024, 1, 2), d(2024, 12, 31)));
        assert!(RebalanceFrequency::Annual.crosses_boundary(d(2024, 12, 31), d(2025, 1, 2)));
    }

    #[test]
    fn test_weekly_boundary() {
        // 2024-01-05 금요일 → 2024-01-08 월요일
        assert!(RebalanceFrequency::Weekly.crosses_boundary(d(2024, 1, 5), d(2024, 1, 8)));
        assert!(!RebalanceFrequency::Weekly.crosses_boundary(d(2024, 1, 8), d(2024, 1, 9)));
    }

    #[test]
    fn test_daily_always_never() {
        assert!(RebalanceFrequency::Daily.crosses_boundary(d(2024, 1, 8), d(2024, 1, 9)));
        assert!(RebalanceFrequency::Always.crosses_boundary(d(2024, 1, 8), d(2024, 1, 9)));
        assert!(!RebalanceFrequency::Never.crosses_boundary(d(2023, 1, 8), d(2024, 1, 9)));
    }

    #[test]
    fn test_frequency_serde_aliases() {
        let freq: RebalanceFrequency = serde_json::from_str("\"annually\"").unwrap();
        assert_eq!(freq, RebalanceFrequency::Annual);
        let freq: ReEvaluationFrequency = serde_json::from_str("\"quarterly\"").unwrap();
        assert_eq!(freq.period_key(d(2024, 5, 1)), (2024, 1));
    }
}
