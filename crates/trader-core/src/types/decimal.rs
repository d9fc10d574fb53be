//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 가격, 수량, 현금은 모두 `Decimal`로 다루며, 통계 지표 계산에만 `f64`를 사용합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 보유/주문 수량 타입.
pub type Quantity = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 최소 거래 단위의 배수로 내림합니다.
    ///
    /// 단위가 0 이하이면 (현금성 자산) 값을 그대로 반환합니다.
    fn floor_to_lot(&self, lot: Decimal) -> Decimal;

    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 통계 계산용 f64로 변환합니다. 변환 불가 시 0.
    fn to_f64_lossy(&self) -> f64;
}

impl DecimalExt for Decimal {
    fn floor_to_lot(&self, lot: Decimal) -> Decimal {
        if lot <= Decimal::ZERO {
            return *self;
        }
        (*self / lot).floor() * lot
    }

    fn to_percentage_string(&self) -> String {
        let pct = *self * Decimal::from(100);
        format!("{:.2}%", pct)
    }

    fn to_f64_lossy(&self) -> f64 {
        self.to_f64().unwrap_or(0.0)
    }
}

/// f64 값을 Decimal로 변환합니다. NaN/무한대는 0으로 처리합니다.
pub fn decimal_from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor_to_lot() {
        assert_eq!(dec!(15.7).floor_to_lot(dec!(1)), dec!(15));
        assert_eq!(dec!(15.7).floor_to_lot(dec!(10)), dec!(10));
        assert_eq!(dec!(0.37).floor_to_lot(dec!(0.1)), dec!(0.3));
        assert_eq!(dec!(9.99).floor_to_lot(dec!(10)), dec!(0));
    }

    #[test]
    fn test_floor_to_lot_fractional_asset() {
        // 최소 단위가 없는 현금성 자산은 그대로
        assert_eq!(dec!(12.3456).floor_to_lot(Decimal::ZERO), dec!(12.3456));
    }

    #[test]
    fn test_percentage_string() {
        assert_eq!(dec!(0.0525).to_percentage_string(), "5.25%");
        assert_eq!(dec!(-0.1).to_percentage_string(), "-10.00%");
    }

    #[test]
    fn test_decimal_from_f64_non_finite() {
        assert_eq!(decimal_from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(decimal_from_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(decimal_from_f64(0.5), dec!(0.5));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn floor_to_lot_never_exceeds_and_is_lot_multiple(
                cents in 0i64..10_000_000,
                lot in prop::sample::select(vec![1i64, 5, 10, 100]),
            ) {
                let value = Decimal::new(cents, 2);
                let lot = Decimal::from(lot);
                let floored = value.floor_to_lot(lot);

                prop_assert!(floored <= value);
                prop_assert!(value - floored < lot);
                prop_assert_eq!(floored % lot, Decimal::ZERO);
            }
        }
    }
}
