//! 시뮬레이션 거래 기록.
//!
//! - `TransactionType` - 매수/매도/배당/입금/출금
//! - `SimulatedTransaction` - 추가 전용 원장 항목

use crate::types::{Price, Quantity};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 배당 수령
    Dividend,
    /// 현금 입금
    Deposit,
    /// 현금 출금
    Withdrawal,
}

impl TransactionType {
    /// 보유 수량을 바꾸는 거래인지 확인합니다.
    pub fn changes_quantity(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Dividend => write!(f, "DIVIDEND"),
            TransactionType::Deposit => write!(f, "DEPOSIT"),
            TransactionType::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

/// 백테스트 원장 항목.
///
/// 생성 후 변경되지 않습니다. `cash_balance`와 `portfolio_value`는
/// 이 거래가 반영된 직후의 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedTransaction {
    /// 원장 내 순번 (0부터)
    pub seq: u64,
    /// 거래일
    pub date: NaiveDate,
    /// 자산 식별자 (입출금은 현금 계정 식별자)
    pub asset_id: String,
    /// 거래 유형
    pub transaction_type: TransactionType,
    /// 수량 (배당/입출금은 현금 금액)
    pub quantity: Quantity,
    /// 체결 가격 (배당/입출금은 현금 단가 1)
    pub price: Price,
    /// 수수료
    pub fee: Decimal,
    /// 세금
    pub tax: Decimal,
    /// 거래 후 현금 잔고
    pub cash_balance: Decimal,
    /// 거래 후 포트폴리오 평가액
    pub portfolio_value: Decimal,
}

impl SimulatedTransaction {
    /// 거래 금액 (수량 × 가격).
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }

    /// 현금 변화량 (비용 차감 후).
    pub fn net_cash_flow(&self) -> Decimal {
        let costs = self.fee + self.tax;
        match self.transaction_type {
            TransactionType::Buy => -(self.notional() + costs),
            TransactionType::Sell | TransactionType::Dividend | TransactionType::Deposit => {
                self.notional() - costs
            }
            TransactionType::Withdrawal => -self.notional(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(transaction_type: TransactionType) -> SimulatedTransaction {
        SimulatedTransaction {
            seq: 0,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            asset_id: "SPY".to_string(),
            transaction_type,
            quantity: dec!(10),
            price: dec!(50),
            fee: dec!(1),
            tax: dec!(2),
            cash_balance: Decimal::ZERO,
            portfolio_value: Decimal::ZERO,
        }
    }

    #[test]
    fn test_net_cash_flow() {
        assert_eq!(tx(TransactionType::Buy).net_cash_flow(), dec!(-503));
        assert_eq!(tx(TransactionType::Sell).net_cash_flow(), dec!(497));
        assert_eq!(tx(TransactionType::Dividend).net_cash_flow(), dec!(497));
    }

    #[test]
    fn test_transaction_type_serde() {
        let json = serde_json::to_string(&TransactionType::Withdrawal).unwrap();
        assert_eq!(json, "\"withdrawal\"");
        assert!(TransactionType::Sell.changes_quantity());
        assert!(!TransactionType::Dividend.changes_quantity());
    }
}
