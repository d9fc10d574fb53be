//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 요청한 자산의 데이터가 없음
    #[error("Data not found: {0}")]
    NotFound(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// 데이터 부재로 인한 오류인지 확인합니다.
    ///
    /// 이 경우 호출자는 빈 시계열로 취급할 수 있습니다.
    pub fn is_missing(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
