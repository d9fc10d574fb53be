//! 백테스트 실행 설정.

use super::error::{BacktestError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trader_core::Asset;

/// 예약된 현금 흐름 유형.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CashFlowKind {
    /// 현금 입금
    Deposit,
    /// 현금 출금
    Withdrawal,
    /// 배당 수령 (보유 수량은 변하지 않음)
    Dividend { asset_id: String },
}

/// 예약된 현금 흐름.
///
/// 해당 날짜가 거래일이 아니면 다음 시뮬레이션일에 반영됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCashFlow {
    /// 반영일
    pub date: NaiveDate,
    /// 유형
    #[serde(flatten)]
    pub kind: CashFlowKind,
    /// 금액 (양수)
    pub amount: Decimal,
}

impl ScheduledCashFlow {
    /// 입금을 생성합니다.
    pub fn deposit(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            date,
            kind: CashFlowKind::Deposit,
            amount,
        }
    }

    /// 출금을 생성합니다.
    pub fn withdrawal(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            date,
            kind: CashFlowKind::Withdrawal,
            amount,
        }
    }

    /// 배당을 생성합니다.
    pub fn dividend(date: NaiveDate, asset_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            kind: CashFlowKind::Dividend {
                asset_id: asset_id.into(),
            },
            amount,
        }
    }
}

/// 백테스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 매수/매도 수수료율 (예: 0.00015 = 0.015%)
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// 매도/배당 세율 (예: 0.0023 = 0.23%)
    #[serde(default)]
    pub tax_rate: Decimal,

    /// 슬리피지율. 매수는 높은 가격, 매도는 낮은 가격으로 체결
    #[serde(default)]
    pub slippage_rate: Decimal,

    /// 최소 거래 금액. 미만인 주문은 건너뜀
    #[serde(default)]
    pub min_trade_value: Decimal,

    /// 자산 메타데이터 (최소 거래 단위, 분류)
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    /// 예약된 현금 흐름
    #[serde(default)]
    pub cash_flows: Vec<ScheduledCashFlow>,

    /// 결과에 첨부할 벤치마크 ID
    #[serde(default)]
    pub benchmarks: Vec<String>,
}

fn default_fee_rate() -> Decimal {
    dec!(0.00015)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            tax_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
            min_trade_value: Decimal::ZERO,
            assets: BTreeMap::new(),
            cash_flows: Vec::new(),
            benchmarks: Vec::new(),
        }
    }
}

impl BacktestConfig {
    /// 거래 비용이 없는 설정.
    pub fn frictionless() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            ..Default::default()
        }
    }

    /// 한국 주식 시장 설정 (수수료 0.015%, 매도 거래세 0.23%).
    pub fn korean_market() -> Self {
        Self {
            fee_rate: dec!(0.00015),
            tax_rate: dec!(0.0023),
            min_trade_value: dec!(10000),
            ..Default::default()
        }
    }

    /// 미국 주식 시장 설정 (수수료/거래세 없음).
    pub fn us_market() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            min_trade_value: dec!(10),
            ..Default::default()
        }
    }

    /// 수수료율 설정
    pub fn with_fee_rate(mut self, rate: Decimal) -> Self {
        self.fee_rate = rate;
        self
    }

    /// 세율 설정
    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    /// 슬리피지율 설정
    pub fn with_slippage_rate(mut self, rate: Decimal) -> Self {
        self.slippage_rate = rate;
        self
    }

    /// 자산 메타데이터 추가
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.insert(asset.id.clone(), asset);
        self
    }

    /// 현금 흐름 추가
    pub fn with_cash_flow(mut self, flow: ScheduledCashFlow) -> Self {
        self.cash_flows.push(flow);
        self
    }

    /// 벤치마크 추가
    pub fn with_benchmark(mut self, benchmark_id: impl Into<String>) -> Self {
        self.benchmarks.push(benchmark_id.into());
        self
    }

    /// 자산 메타데이터. 등록되지 않은 자산은 기본 주식(최소 단위 1)으로 간주합니다.
    pub fn asset(&self, asset_id: &str) -> Asset {
        self.assets
            .get(asset_id)
            .cloned()
            .unwrap_or_else(|| Asset::us_equity(asset_id))
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("수수료율", self.fee_rate),
            ("세율", self.tax_rate),
            ("슬리피지율", self.slippage_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(BacktestError::Configuration(format!(
                    "{}은 0 이상 1 미만이어야 합니다: {}",
                    name, rate
                )));
            }
        }
        if self.min_trade_value < Decimal::ZERO {
            return Err(BacktestError::Configuration(
                "최소 거래 금액은 0 이상이어야 합니다".to_string(),
            ));
        }
        if let Some(asset) = self.assets.values().find(|a| a.min_quantity() < Decimal::ZERO) {
            return Err(BacktestError::Configuration(format!(
                "{}의 최소 거래 단위가 음수입니다",
                asset.id
            )));
        }
        if let Some(flow) = self.cash_flows.iter().find(|f| f.amount <= Decimal::ZERO) {
            return Err(BacktestError::Configuration(format!(
                "{} 현금 흐름 금액은 0보다 커야 합니다: {}",
                flow.date, flow.amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());
        assert!(BacktestConfig::korean_market().validate().is_ok());

        let config = BacktestConfig::default().with_fee_rate(dec!(-0.001));
        assert!(config.validate().is_err());

        let config = BacktestConfig::default().with_tax_rate(dec!(1));
        assert!(config.validate().is_err());

        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let config = BacktestConfig::default()
            .with_cash_flow(ScheduledCashFlow::deposit(date, Decimal::ZERO));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unregistered_asset_defaults_to_unit_lot() {
        let config = BacktestConfig::default().with_asset(Asset::cash("BIL"));
        assert_eq!(config.asset("SPY").min_quantity(), Decimal::ONE);
        assert_eq!(config.asset("BIL").min_quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_cash_flow_serde() {
        let json = r#"{"date": "2024-03-15", "type": "dividend", "asset_id": "SPY", "amount": "12.5"}"#;
        let flow: ScheduledCashFlow = serde_json::from_str(json).unwrap();
        assert_eq!(flow.kind, CashFlowKind::Dividend { asset_id: "SPY".to_string() });
        assert_eq!(flow.amount, dec!(12.5));
    }
}
