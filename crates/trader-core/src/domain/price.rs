//! 일별 종가 시계열.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 단일 자산의 (날짜, 종가) 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 거래일
    pub date: NaiveDate,
    /// 종가
    pub close: Decimal,
}

impl PricePoint {
    /// 새 가격 데이터를 생성합니다.
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// 날짜순으로 정렬되고 중복 날짜가 없는 가격 시계열.
///
/// 휴장일 등으로 날짜가 비어 있을 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// 가격 데이터로 시계열을 생성합니다.
    ///
    /// 날짜순으로 정렬하며, 같은 날짜가 여러 번 있으면 마지막 값만 남깁니다.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    /// 데이터 포인트 수.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 전체 데이터 포인트.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// 첫 데이터 포인트.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// 마지막 데이터 포인트.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// 정확히 해당 날짜의 종가.
    pub fn price_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].close)
    }

    /// 해당 날짜 이전(포함) 가장 최근 가격.
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<&PricePoint> {
        let end = self.points.partition_point(|p| p.date <= date);
        end.checked_sub(1).map(|idx| &self.points[idx])
    }

    /// 해당 날짜 이후(포함) 가장 이른 가격.
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<&PricePoint> {
        let start = self.points.partition_point(|p| p.date < date);
        self.points.get(start)
    }

    /// 해당 날짜까지(포함)의 데이터 슬라이스.
    pub fn up_to(&self, date: NaiveDate) -> &[PricePoint] {
        let end = self.points.partition_point(|p| p.date <= date);
        &self.points[..end]
    }

    /// [start, end] 구간의 데이터 슬라이스.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[PricePoint] {
        let from = self.points.partition_point(|p| p.date < start);
        let to = self.points.partition_point(|p| p.date <= end);
        if from >= to {
            return &[];
        }
        &self.points[from..to]
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> PriceSeries {
        PriceSeries::new(vec![
            PricePoint::new(d(5), dec!(105)),
            PricePoint::new(d(2), dec!(100)),
            PricePoint::new(d(3), dec!(101)),
            PricePoint::new(d(3), dec!(102)),
        ])
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = sample();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first().unwrap().date, d(2));
        assert_eq!(series.price_on(d(3)), Some(dec!(102)));
    }

    #[test]
    fn test_last_on_or_before_carries_over_gaps() {
        let series = sample();
        assert_eq!(series.last_on_or_before(d(4)).unwrap().close, dec!(102));
        assert_eq!(series.last_on_or_before(d(5)).unwrap().close, dec!(105));
        assert!(series.last_on_or_before(d(1)).is_none());
    }

    #[test]
    fn test_slices() {
        let series = sample();
        assert_eq!(series.up_to(d(3)).len(), 2);
        assert_eq!(series.between(d(3), d(5)).len(), 2);
        assert!(series.between(d(6), d(9)).is_empty());
        assert_eq!(series.first_on_or_after(d(4)).unwrap().date, d(5));
    }
}
