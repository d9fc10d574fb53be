//! 벤치마크 비교 시계열.
//!
//! 벤치마크는 결과 주석 용도로만 쓰이며 시뮬레이션에 영향을 주지 않습니다.
//! 조회에 실패해도 경고만 남기고 실행은 계속됩니다.

use super::error::SimulationWarning;
use super::result::ValuePoint;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use trader_core::PriceSeries;
use trader_data::BenchmarkProvider;

/// 첫 가격이 초기 자본과 같아지도록 [start, end] 구간 시계열을 정규화합니다.
///
/// 구간에 유효한 가격이 없으면 `None`.
pub fn normalize_to_capital(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    initial_capital: Decimal,
) -> Option<Vec<ValuePoint>> {
    let points = series.between(start, end);
    let base = points.first()?.close;
    if base <= Decimal::ZERO {
        return None;
    }
    Some(
        points
            .iter()
            .map(|p| ValuePoint::new(p.date, p.close / base * initial_capital))
            .collect(),
    )
}

/// 수집된 벤치마크 시계열과 제외된 항목의 경고.
pub type CollectedBenchmarks = (BTreeMap<String, Vec<ValuePoint>>, Vec<SimulationWarning>);

/// 요청된 벤치마크를 모두 조회해 정규화합니다.
///
/// 실패한 항목은 건너뛰고 [`SimulationWarning::BenchmarkUnavailable`]로 돌려줍니다.
pub fn collect_benchmarks(
    provider: &dyn BenchmarkProvider,
    benchmark_ids: &[String],
    start: NaiveDate,
    end: NaiveDate,
    initial_capital: Decimal,
) -> CollectedBenchmarks {
    let mut benchmarks = BTreeMap::new();
    let mut warnings = Vec::new();

    for id in benchmark_ids {
        if benchmarks.contains_key(id)
            || warnings.iter().any(|w| {
                matches!(w, SimulationWarning::BenchmarkUnavailable { benchmark_id, .. } if benchmark_id == id)
            })
        {
            continue;
        }
        let reason = match provider.get_benchmark(id, start, end) {
            Ok(series) => match normalize_to_capital(&series, start, end, initial_capital) {
                Some(values) => {
                    benchmarks.insert(id.clone(), values);
                    continue;
                }
                None => "구간 데이터 없음".to_string(),
            },
            Err(e) => format!("조회 실패: {}", e),
        };
        warnings.push(SimulationWarning::BenchmarkUnavailable {
            benchmark_id: id.clone(),
            reason,
        });
    }

    (benchmarks, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trader_core::PricePoint;
    use trader_data::InMemoryPriceProvider;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_normalize_to_capital() {
        let series = PriceSeries::new(vec![
            PricePoint::new(d(1), dec!(40)),
            PricePoint::new(d(2), dec!(50)),
            PricePoint::new(d(3), dec!(55)),
        ]);
        let values = normalize_to_capital(&series, d(2), d(3), dec!(1000)).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, dec!(1000));
        assert_eq!(values[1].value, dec!(1100));
    }

    #[test]
    fn test_missing_benchmark_is_skipped() {
        let provider = InMemoryPriceProvider::new()
            .with_series("SPY", vec![PricePoint::new(d(2), dec!(10)), PricePoint::new(d(3), dec!(12))]);
        let ids = vec!["SPY".to_string(), "QQQ".to_string()];

        let (benchmarks, warnings) = collect_benchmarks(&provider, &ids, d(1), d(5), dec!(100));
        assert_eq!(benchmarks.len(), 1);
        assert_eq!(benchmarks["SPY"][1].value, dec!(120));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            SimulationWarning::BenchmarkUnavailable { benchmark_id, .. } if benchmark_id == "QQQ"
        ));
    }

    #[test]
    fn test_benchmark_outside_window_is_reported_once() {
        let provider = InMemoryPriceProvider::new()
            .with_series("OLD", vec![PricePoint::new(d(1), dec!(10))]);
        let ids = vec!["OLD".to_string(), "OLD".to_string()];

        let (benchmarks, warnings) = collect_benchmarks(&provider, &ids, d(2), d(5), dec!(100));
        assert!(benchmarks.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "벤치마크 제외: OLD (구간 데이터 없음)");
    }
}
