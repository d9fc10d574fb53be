//! 백테스트 데이터 소스.
//!
//! 이 crate는 다음을 제공합니다:
//! - 가격/펀더멘털/벤치마크 Provider 트레이트
//! - 메모리 상주 Provider (테스트 및 임베딩용)
//! - CSV 파일 로더

pub mod error;
pub mod provider;

pub use error::{DataError, Result};
pub use provider::{
    load_fundamentals_dir, BenchmarkProvider, CsvPriceProvider, FundamentalProvider,
    FundamentalSnapshot, InMemoryFundamentalProvider, InMemoryPriceProvider,
    PriceSeriesProvider,
};
