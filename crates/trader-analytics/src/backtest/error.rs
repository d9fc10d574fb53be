//! 백테스트 오류 및 경고.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use trader_data::DataError;
use trader_strategy::{ConfigurationError, SignalError};

/// 백테스트 오류.
///
/// 설정 오류와 치명적 시뮬레이션 오류는 호출자에게 그대로 전달되며,
/// 어떤 경우에도 부분 결과는 만들어지지 않습니다.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 실행 파라미터 오류 (자본금, 기간, 비용 설정 등)
    #[error("백테스트 설정 오류: {0}")]
    Configuration(String),

    /// 전략 설정 오류
    #[error("전략 설정 오류: {0}")]
    Strategy(#[from] ConfigurationError),

    /// 데이터 조회 오류
    #[error("데이터 오류: {0}")]
    Data(#[from] DataError),

    /// 시뮬레이션을 계속할 수 없는 오류
    #[error("시뮬레이션 중단: {0}")]
    FatalSimulation(String),

    /// 취소 신호 수신
    #[error("백테스트가 취소되었습니다")]
    Cancelled,

    /// 실행 환경 오류 (작업 패닉 등)
    #[error("실행 오류: {0}")]
    Execution(String),
}

impl BacktestError {
    /// 시뮬레이션 시작 전에 거부된 설정 오류인지 확인합니다.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BacktestError::Configuration(_) | BacktestError::Strategy(_))
    }
}

impl From<SignalError> for BacktestError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::MissingFundamentalProvider => BacktestError::Configuration(err.to_string()),
            SignalError::Data(e) => BacktestError::Data(e),
        }
    }
}

/// 백테스트 Result 타입.
pub type Result<T> = std::result::Result<T, BacktestError>;

/// 시뮬레이션을 중단하지 않는 경고.
///
/// 디버그 모드에서는 디버그 로그에 기록됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationWarning {
    /// 해당 날짜 가격 없음, 직전 가격 사용
    DataGap {
        date: NaiveDate,
        asset_id: String,
        carried_price: Decimal,
    },
    /// 가격이 한 번도 관측되지 않아 0으로 평가
    NoPriceYet { date: NaiveDate, asset_id: String },
    /// 요청 구간에 가격 데이터가 전혀 없음
    MissingSeries { asset_id: String },
    /// 자금 부족. 매수는 비례 축소, 출금은 가용 현금만 인출
    InsufficientFunds {
        date: NaiveDate,
        source: ShortfallSource,
        required: Decimal,
        available: Decimal,
    },
    /// 벤치마크 시계열을 만들 수 없어 결과에서 제외
    BenchmarkUnavailable { benchmark_id: String, reason: String },
}

/// 자금 부족이 발생한 지점.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallSource {
    /// 당일 매수 주문 합계
    Buys,
    /// 예약 출금
    Withdrawal,
}

impl fmt::Display for SimulationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationWarning::DataGap {
                date,
                asset_id,
                carried_price,
            } => write!(
                f,
                "[{}] 데이터 누락: {} 가격 없음, 직전 가격 {} 사용",
                date, asset_id, carried_price
            ),
            SimulationWarning::NoPriceYet { date, asset_id } => write!(
                f,
                "[{}] 데이터 누락: {} 관측된 가격 없음, 평가액 0",
                date, asset_id
            ),
            SimulationWarning::MissingSeries { asset_id } => {
                write!(f, "데이터 누락: {} 요청 구간 가격 데이터 없음", asset_id)
            }
            SimulationWarning::InsufficientFunds {
                date,
                source,
                required,
                available,
            } => {
                let action = match source {
                    ShortfallSource::Buys => "매수 수량 비례 축소",
                    ShortfallSource::Withdrawal => "가용 현금만 출금",
                };
                write!(
                    f,
                    "[{}] 자금 부족: 필요={:.2}, 가용={:.2}, {}",
                    date, required, available, action
                )
            }
            SimulationWarning::BenchmarkUnavailable {
                benchmark_id,
                reason,
            } => write!(f, "벤치마크 제외: {} ({})", benchmark_id, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signal_error_mapping() {
        let err: BacktestError = SignalError::MissingFundamentalProvider.into();
        assert!(err.is_configuration());

        let err: BacktestError = SignalError::Data(DataError::InvalidData("x".into())).into();
        assert!(matches!(err, BacktestError::Data(_)));
    }

    #[test]
    fn test_warning_display() {
        let warning = SimulationWarning::DataGap {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            asset_id: "SPY".to_string(),
            carried_price: dec!(470.5),
        };
        assert_eq!(
            warning.to_string(),
            "[2024-01-02] 데이터 누락: SPY 가격 없음, 직전 가격 470.5 사용"
        );
    }

    #[test]
    fn test_insufficient_funds_display_names_source() {
        let shortfall = |source| SimulationWarning::InsufficientFunds {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            source,
            required: dec!(500),
            available: dec!(159),
        };
        assert_eq!(
            shortfall(ShortfallSource::Buys).to_string(),
            "[2024-01-02] 자금 부족: 필요=500.00, 가용=159.00, 매수 수량 비례 축소"
        );
        assert_eq!(
            shortfall(ShortfallSource::Withdrawal).to_string(),
            "[2024-01-02] 자금 부족: 필요=500.00, 가용=159.00, 가용 현금만 출금"
        );
    }
}
