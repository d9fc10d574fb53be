//! 백테스트 시뮬레이션을 위한 도메인 모델.

mod price;
mod transaction;

pub use price::*;
pub use transaction::*;
