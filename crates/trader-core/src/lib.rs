//! # Trader Core
//!
//! 전략 백테스트 엔진의 공통 도메인 타입을 제공합니다:
//! - 자산 및 자산 분류, 최소 거래 단위
//! - 일별 가격 시계열
//! - 시뮬레이션 거래 원장 항목
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
