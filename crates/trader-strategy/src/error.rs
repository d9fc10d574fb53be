//! 전략 설정 및 신호 계산 에러.

use thiserror::Error;
use trader_data::DataError;

/// 전략 설정 오류.
///
/// 시뮬레이션 시작 전에 거부되며, 어떤 거래도 실행되지 않습니다.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// 파라미터 값이 유효 범위를 벗어남
    #[error("잘못된 파라미터 {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    /// 자산 목록이 비어 있음
    #[error("자산 목록이 비어 있습니다: {0}")]
    EmptyAssets(String),

    /// 펀더멘털 조건 파싱 실패
    #[error("펀더멘털 조건을 해석할 수 없습니다: {0}")]
    InvalidCondition(String),

    /// 설정 파일/구조 파싱 실패
    #[error("전략 설정 파싱 실패: {0}")]
    Parse(String),
}

impl ConfigurationError {
    /// 파라미터 오류를 생성합니다.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 신호 계산 중 발생한 오류.
#[derive(Debug, Error)]
pub enum SignalError {
    /// 펀더멘털 Provider 없이 펀더멘털 전략을 실행
    #[error("펀더멘털 데이터 Provider가 필요합니다")]
    MissingFundamentalProvider,

    /// 데이터 조회 실패
    #[error("데이터 조회 실패: {0}")]
    Data(#[from] DataError),
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
