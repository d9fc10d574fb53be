//! 설정 관리.
//!
//! 기본값 → 설정 파일 → `TRADER__` 환경 변수 순으로 덮어씁니다.
//! 예: `TRADER__BACKTEST__FEE_RATE=0.001`

use crate::error::{TraderError, TraderResult};
use crate::logging::{LogConfig, LogFormat};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 백테스트 기본값
    #[serde(default)]
    pub backtest: BacktestDefaults,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환합니다.
    ///
    /// 알 수 없는 형식은 pretty로 처리합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

/// 백테스트 기본값.
///
/// CLI 인자로 지정하지 않은 값에 사용됩니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktestDefaults {
    /// 초기 자본금
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    /// 매수/매도 수수료율
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// 매도/배당 세율
    #[serde(default)]
    pub tax_rate: Decimal,
    /// 슬리피지율
    #[serde(default)]
    pub slippage_rate: Decimal,
    /// 가격 CSV 디렉토리
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_initial_capital() -> Decimal {
    dec!(10_000_000)
}

fn default_fee_rate() -> Decimal {
    dec!(0.00015)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            fee_rate: default_fee_rate(),
            tax_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
            data_dir: default_data_dir(),
        }
    }
}

impl BacktestDefaults {
    /// 값의 유효성을 검사합니다.
    pub fn validate(&self) -> TraderResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(TraderError::Config(
                "초기 자본금은 0보다 커야 합니다".to_string(),
            ));
        }
        for (name, rate) in [
            ("fee_rate", self.fee_rate),
            ("tax_rate", self.tax_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(TraderError::Config(format!(
                    "{}는 0 이상 1 미만이어야 합니다: {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> TraderResult<Self> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.backtest.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> TraderResult<Self> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.backtest.fee_rate, dec!(0.00015));
        assert_eq!(config.backtest.initial_capital, dec!(10_000_000));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[logging]\nlevel = \"debug\"\nformat = \"json\"\n\n[backtest]\ninitial_capital = 5000\ntax_rate = 0.0023"
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.to_log_config().format, LogFormat::Json);
        assert_eq!(config.backtest.initial_capital, dec!(5000));
        assert_eq!(config.backtest.tax_rate, dec!(0.0023));
    }

    #[test]
    fn test_validate_rejects_bad_rates() {
        let defaults = BacktestDefaults {
            fee_rate: dec!(1.5),
            ..Default::default()
        };
        assert!(defaults.validate().is_err());

        let defaults = BacktestDefaults {
            initial_capital: Decimal::ZERO,
            ..Default::default()
        };
        assert!(defaults.validate().is_err());
    }
}
