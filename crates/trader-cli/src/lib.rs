//! 백테스트 CLI 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 전략 파일 로드 및 백테스트 실행
//! - 사용 가능한 전략 목록 출력

pub mod commands;

pub use commands::*;
