//! 성과 분석 모듈
//!
//! - [`metrics`]: 평가액 시계열 기반 성과 지표 계산 (연수익률, 변동성, 최대낙폭, 샤프비율)

pub mod metrics;

pub use metrics::*;
