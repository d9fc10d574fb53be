//! 메모리 상주 데이터 Provider.

use super::{BenchmarkProvider, FundamentalProvider, FundamentalSnapshot, PriceSeriesProvider};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use trader_core::{PricePoint, PriceSeries};

/// 메모리 상주 가격 Provider.
///
/// 등록되지 않은 자산은 `DataError::NotFound`를 반환합니다.
/// 벤치마크 Provider로도 사용할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceProvider {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceProvider {
    /// 빈 Provider를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 자산 시계열을 추가합니다.
    pub fn with_series(mut self, asset_id: impl Into<String>, points: Vec<PricePoint>) -> Self {
        self.insert(asset_id, points);
        self
    }

    /// 자산 시계열을 추가하거나 교체합니다.
    pub fn insert(&mut self, asset_id: impl Into<String>, points: Vec<PricePoint>) {
        self.series.insert(asset_id.into(), PriceSeries::new(points));
    }

    /// 등록된 자산 목록 (정렬됨).
    pub fn asset_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.series.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl PriceSeriesProvider for InMemoryPriceProvider {
    fn get_prices(&self, asset_id: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let series = self
            .series
            .get(asset_id)
            .ok_or_else(|| DataError::NotFound(asset_id.to_string()))?;
        Ok(PriceSeries::new(series.between(start, end).to_vec()))
    }
}

impl BenchmarkProvider for InMemoryPriceProvider {
    fn get_benchmark(
        &self,
        benchmark_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        self.get_prices(benchmark_id, start, end)
    }
}

/// 메모리 상주 펀더멘털 Provider.
///
/// 자산별로 공시일 → 지표 스냅샷을 보관하고,
/// 조회 시점 이전(포함) 가장 최근 스냅샷을 반환합니다.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFundamentalProvider {
    snapshots: HashMap<String, BTreeMap<NaiveDate, FundamentalSnapshot>>,
}

impl InMemoryFundamentalProvider {
    /// 빈 Provider를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스냅샷을 추가합니다 (빌더).
    pub fn with_snapshot<I, K>(mut self, asset_id: &str, date: NaiveDate, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        for (name, value) in metrics {
            self.insert_metric(asset_id, date, name, value);
        }
        self
    }

    /// 단일 지표 값을 추가합니다.
    pub fn insert_metric(
        &mut self,
        asset_id: &str,
        date: NaiveDate,
        metric: impl Into<String>,
        value: Decimal,
    ) {
        self.snapshots
            .entry(asset_id.to_string())
            .or_default()
            .entry(date)
            .or_default()
            .insert(metric.into(), value);
    }

    /// 스냅샷이 하나라도 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FundamentalProvider for InMemoryFundamentalProvider {
    fn get_fundamentals(&self, asset_id: &str, as_of: NaiveDate) -> Result<FundamentalSnapshot> {
        let snapshot = self
            .snapshots
            .get(asset_id)
            .and_then(|by_date| by_date.range(..=as_of).next_back())
            .map(|(_, snapshot)| snapshot.clone())
            .unwrap_or_default();
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, month, day).unwrap()
    }

    #[test]
    fn test_price_provider_range_filter() {
        let provider = InMemoryPriceProvider::new().with_series(
            "SPY",
            vec![
                PricePoint::new(d(1, 2), dec!(100)),
                PricePoint::new(d(1, 3), dec!(101)),
                PricePoint::new(d(1, 4), dec!(102)),
            ],
        );

        let series = provider.get_prices("SPY", d(1, 3), d(1, 10)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, dec!(101));
    }

    #[test]
    fn test_price_provider_unknown_asset() {
        let provider = InMemoryPriceProvider::new();
        let err = provider.get_prices("QQQ", d(1, 1), d(2, 1)).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_fundamentals_are_point_in_time() {
        let provider = InMemoryFundamentalProvider::new()
            .with_snapshot("005930", d(3, 31), [("per", dec!(12))])
            .with_snapshot("005930", d(6, 30), [("per", dec!(9))]);

        // 1분기 공시 이전에는 데이터 없음
        assert!(provider.get_fundamentals("005930", d(3, 1)).unwrap().is_empty());
        // 2분기 공시 전에는 직전 분기 데이터
        let snapshot = provider.get_fundamentals("005930", d(5, 15)).unwrap();
        assert_eq!(snapshot.get("per"), Some(&dec!(12)));
        let snapshot = provider.get_fundamentals("005930", d(7, 1)).unwrap();
        assert_eq!(snapshot.get("per"), Some(&dec!(9)));
    }
}
