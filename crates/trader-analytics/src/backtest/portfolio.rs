//! 시뮬레이션 포트폴리오 상태.
//!
//! `PortfolioState`는 한 번의 백테스트 실행이 단독으로 소유하며,
//! 보유 자산은 자산 ID로 색인된 `Holding` 항목으로 관리됩니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 단일 자산 보유 내역.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// 자산 ID
    pub asset_id: String,
    /// 보유 수량 (항상 0 이상)
    pub quantity: Decimal,
    /// 평균 매입 단가
    pub avg_cost: Decimal,
}

impl Holding {
    fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            quantity: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
        }
    }

    /// 매입 원가 합계.
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.avg_cost
    }
}

/// 현금, 보유 자산, 평가 기준 가격.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    cash: Decimal,
    holdings: BTreeMap<String, Holding>,
    /// 자산별 마지막 평가 가격
    marks: BTreeMap<String, Decimal>,
    date: NaiveDate,
}

impl PortfolioState {
    /// 초기 현금으로 포트폴리오를 생성합니다.
    pub fn new(initial_cash: Decimal, date: NaiveDate) -> Self {
        Self {
            cash: initial_cash,
            holdings: BTreeMap::new(),
            marks: BTreeMap::new(),
            date,
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn holdings(&self) -> &BTreeMap<String, Holding> {
        &self.holdings
    }

    pub fn holding(&self, asset_id: &str) -> Option<&Holding> {
        self.holdings.get(asset_id)
    }

    /// 보유 수량. 미보유 시 0.
    pub fn quantity(&self, asset_id: &str) -> Decimal {
        self.holdings
            .get(asset_id)
            .map(|h| h.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// 평가 가격을 갱신합니다.
    pub fn mark(&mut self, asset_id: &str, price: Decimal) {
        self.marks.insert(asset_id.to_string(), price);
    }

    /// 마지막 평가 가격.
    pub fn mark_price(&self, asset_id: &str) -> Option<Decimal> {
        self.marks.get(asset_id).copied()
    }

    /// 보유 자산 평가액. 가격이 관측되지 않은 자산은 0으로 평가합니다.
    pub fn market_value(&self, asset_id: &str) -> Decimal {
        let quantity = self.quantity(asset_id);
        self.mark_price(asset_id)
            .map(|price| quantity * price)
            .unwrap_or(Decimal::ZERO)
    }

    /// 총 평가액 = 현금 + Σ(수량 × 평가 가격).
    pub fn total_value(&self) -> Decimal {
        self.cash
            + self
                .holdings
                .keys()
                .map(|id| self.market_value(id))
                .sum::<Decimal>()
    }

    /// 자산별 현재 비중. 총 평가액이 0 이하이면 빈 맵을 반환합니다.
    pub fn current_weights(&self) -> BTreeMap<String, Decimal> {
        let total = self.total_value();
        if total <= Decimal::ZERO {
            return BTreeMap::new();
        }
        self.holdings
            .keys()
            .map(|id| (id.clone(), self.market_value(id) / total))
            .collect()
    }

    /// 매수를 반영합니다. 현금은 `quantity × price + fee`만큼 감소합니다.
    pub(crate) fn apply_buy(&mut self, asset_id: &str, quantity: Decimal, price: Decimal, fee: Decimal) {
        let holding = self
            .holdings
            .entry(asset_id.to_string())
            .or_insert_with(|| Holding::new(asset_id));

        let new_quantity = holding.quantity + quantity;
        if new_quantity > Decimal::ZERO {
            holding.avg_cost = (holding.cost_basis() + quantity * price) / new_quantity;
        }
        holding.quantity = new_quantity;
        self.cash -= quantity * price + fee;
    }

    /// 매도를 반영합니다. 보유 수량을 초과하는 매도는 보유 수량으로 제한됩니다.
    ///
    /// 실제 매도 수량을 반환합니다.
    pub(crate) fn apply_sell(
        &mut self,
        asset_id: &str,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
        tax: Decimal,
    ) -> Decimal {
        let Some(holding) = self.holdings.get_mut(asset_id) else {
            return Decimal::ZERO;
        };
        let sold = quantity.min(holding.quantity);
        holding.quantity -= sold;
        if holding.quantity.is_zero() {
            self.holdings.remove(asset_id);
        }
        self.cash += sold * price - fee - tax;
        sold
    }

    pub(crate) fn credit(&mut self, amount: Decimal) {
        self.cash += amount;
    }

    /// 현금을 출금합니다. 잔고를 초과하면 잔고만큼만 출금하고 실제 금액을 반환합니다.
    pub(crate) fn debit(&mut self, amount: Decimal) -> Decimal {
        let withdrawn = amount.min(self.cash.max(Decimal::ZERO));
        self.cash -= withdrawn;
        withdrawn
    }
}
