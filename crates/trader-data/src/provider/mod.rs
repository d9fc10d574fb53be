//! 데이터 Provider 모듈.
//!
//! 백테스트 엔진이 소비하는 외부 데이터 소스 인터페이스입니다.
//! 엔진은 시뮬레이션 전에 필요한 시계열을 모두 가져오므로 트레이트는 동기식입니다.
//!
//! - `PriceSeriesProvider`: 자산별 일별 종가
//! - `FundamentalProvider`: 특정 시점 기준 펀더멘털 지표
//! - `BenchmarkProvider`: 결과 비교용 벤치마크 시계열
//!
//! ## 구현체
//! - `InMemoryPriceProvider`, `InMemoryFundamentalProvider`: 메모리 상주 데이터
//! - `CsvPriceProvider`: `<dir>/<ASSET>.csv` 파일 (date,close)
//! - `load_fundamentals_dir`: `<dir>/<ASSET>.csv` 파일 (date,metric,value)

pub mod csv;
pub mod memory;

pub use self::csv::{load_fundamentals_dir, parse_fundamental_csv, parse_price_csv, CsvPriceProvider};
pub use memory::{InMemoryFundamentalProvider, InMemoryPriceProvider};

use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use trader_core::PriceSeries;

/// 지표 이름 → 값.
pub type FundamentalSnapshot = BTreeMap<String, Decimal>;

/// 일별 종가 시계열 제공자.
pub trait PriceSeriesProvider: Send + Sync {
    /// [start, end] 구간의 종가 시계열을 반환합니다.
    ///
    /// 휴장일은 빠져 있을 수 있습니다.
    fn get_prices(&self, asset_id: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

/// 펀더멘털 지표 제공자.
pub trait FundamentalProvider: Send + Sync {
    /// `as_of` 시점에 공개되어 있던 가장 최근 지표를 반환합니다.
    ///
    /// 데이터가 없으면 빈 맵을 반환합니다.
    fn get_fundamentals(&self, asset_id: &str, as_of: NaiveDate) -> Result<FundamentalSnapshot>;
}

/// 벤치마크 시계열 제공자.
///
/// 결과 비교용 주석에만 사용되며 시뮬레이션에는 영향을 주지 않습니다.
pub trait BenchmarkProvider: Send + Sync {
    /// [start, end] 구간의 벤치마크 시계열을 반환합니다.
    fn get_benchmark(
        &self,
        benchmark_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}

impl<T: PriceSeriesProvider + ?Sized> PriceSeriesProvider for Arc<T> {
    fn get_prices(&self, asset_id: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        (**self).get_prices(asset_id, start, end)
    }
}

impl<T: FundamentalProvider + ?Sized> FundamentalProvider for Arc<T> {
    fn get_fundamentals(&self, asset_id: &str, as_of: NaiveDate) -> Result<FundamentalSnapshot> {
        (**self).get_fundamentals(asset_id, as_of)
    }
}

impl<T: BenchmarkProvider + ?Sized> BenchmarkProvider for Arc<T> {
    fn get_benchmark(
        &self,
        benchmark_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        (**self).get_benchmark(benchmark_id, start, end)
    }
}
