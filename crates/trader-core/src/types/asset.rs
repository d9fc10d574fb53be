//! 자산 및 자산 분류 정의.
//!
//! - `AssetClass` - 자산 분류 (미국 주식, 코스피, 코스닥, 현금)
//! - `Asset` - 백테스트에서 거래 가능한 단일 자산

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 자산 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// 미국 주식
    #[default]
    UsEquity,
    /// 한국 코스피 주식
    KospiEquity,
    /// 한국 코스닥 주식
    KosdaqEquity,
    /// 현금 및 현금성 자산
    Cash,
}

impl AssetClass {
    /// 현금성 자산 여부.
    pub fn is_cash(&self) -> bool {
        matches!(self, AssetClass::Cash)
    }

    /// 분류별 기본 최소 거래 단위.
    ///
    /// 현금은 임의의 소수 단위로 거래되므로 0을 반환합니다.
    pub fn default_min_quantity(&self) -> Decimal {
        if self.is_cash() {
            Decimal::ZERO
        } else {
            Decimal::ONE
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::UsEquity => write!(f, "us_equity"),
            AssetClass::KospiEquity => write!(f, "kospi_equity"),
            AssetClass::KosdaqEquity => write!(f, "kosdaq_equity"),
            AssetClass::Cash => write!(f, "cash"),
        }
    }
}

/// 거래 가능한 자산.
///
/// 한 번 거래 내역에서 참조된 자산은 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// 자산 식별자 (티커)
    pub id: String,
    /// 표시 이름
    #[serde(default)]
    pub name: String,
    /// 자산 분류
    #[serde(default)]
    pub class: AssetClass,
    /// 최소 거래 단위 (미지정 시 분류 기본값)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_quantity: Option<Decimal>,
}

impl Asset {
    /// 새 자산을 생성합니다.
    pub fn new(id: impl Into<String>, class: AssetClass) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            class,
            min_quantity: None,
        }
    }

    /// 미국 주식 자산을 생성합니다.
    pub fn us_equity(id: impl Into<String>) -> Self {
        Self::new(id, AssetClass::UsEquity)
    }

    /// 코스피 주식 자산을 생성합니다.
    pub fn kospi(id: impl Into<String>) -> Self {
        Self::new(id, AssetClass::KospiEquity)
    }

    /// 현금 자산을 생성합니다.
    pub fn cash(id: impl Into<String>) -> Self {
        Self::new(id, AssetClass::Cash)
    }

    /// 표시 이름을 설정합니다.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 최소 거래 단위를 설정합니다.
    pub fn with_min_quantity(mut self, min_quantity: Decimal) -> Self {
        self.min_quantity = Some(min_quantity);
        self
    }

    /// 최소 거래 단위.
    pub fn min_quantity(&self) -> Decimal {
        self.min_quantity
            .unwrap_or_else(|| self.class.default_min_quantity())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_min_quantity() {
        assert_eq!(Asset::us_equity("SPY").min_quantity(), dec!(1));
        assert_eq!(Asset::cash("KRW").min_quantity(), Decimal::ZERO);
        assert_eq!(
            Asset::kospi("005930").with_min_quantity(dec!(10)).min_quantity(),
            dec!(10)
        );
    }

    #[test]
    fn test_asset_deserialize_defaults() {
        let asset: Asset = serde_json::from_str(r#"{"id": "BIL", "class": "cash"}"#).unwrap();
        assert_eq!(asset.class, AssetClass::Cash);
        assert_eq!(asset.min_quantity(), Decimal::ZERO);
        assert!(asset.name.is_empty());
    }
}
