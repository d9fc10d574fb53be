//! 주문 실행기.
//!
//! 목표 배분과 현재 보유 수량의 차이를 최소 거래 단위로 내림한 주문으로 변환하고
//! 수수료, 세금, 슬리피지를 반영해 체결합니다. 같은 날에는 매도가 매수보다 먼저
//! 체결되며, 매수 자금이 부족하면 매수 수량을 비례 축소합니다.

use super::config::{BacktestConfig, CashFlowKind, ScheduledCashFlow};
use super::error::{ShortfallSource, SimulationWarning};
use super::portfolio::PortfolioState;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use trader_core::{DecimalExt, SimulatedTransaction, TransactionType};
use trader_strategy::TargetAllocation;

/// 입출금 거래에 사용하는 현금 계정 ID.
pub const CASH_ACCOUNT: &str = "CASH";

/// 소수 단위 자산의 수량 정밀도.
const FRACTIONAL_DP: u32 = 8;

/// 추가 전용 거래 원장.
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    entries: Vec<SimulatedTransaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SimulatedTransaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<SimulatedTransaction> {
        self.entries
    }

    /// 체결 직후 포트폴리오 상태로 원장 항목을 추가합니다.
    fn record(&mut self, state: &PortfolioState, fill: Fill) {
        self.entries.push(SimulatedTransaction {
            seq: self.entries.len() as u64,
            date: state.date(),
            asset_id: fill.asset_id,
            transaction_type: fill.transaction_type,
            quantity: fill.quantity,
            price: fill.price,
            fee: fill.fee,
            tax: fill.tax,
            cash_balance: state.cash(),
            portfolio_value: state.total_value(),
        });
    }
}

struct Fill {
    asset_id: String,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    fee: Decimal,
    tax: Decimal,
}

/// 계획된 주문. `price`는 슬리피지 반영 전 평가 가격입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOrder {
    pub asset_id: String,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl PlannedOrder {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// 주문 실행기.
#[derive(Debug, Clone, Copy)]
pub struct OrderExecutor<'a> {
    config: &'a BacktestConfig,
}

impl<'a> OrderExecutor<'a> {
    pub fn new(config: &'a BacktestConfig) -> Self {
        Self { config }
    }

    /// 목표 배분까지의 주문을 계산합니다. 매도 주문이 먼저 오고, 각 그룹은 자산 ID 순입니다.
    pub fn plan(&self, state: &PortfolioState, target: &TargetAllocation) -> Vec<PlannedOrder> {
        let mut sells = Vec::new();
        let mut buys = Vec::new();

        for (asset_id, desired) in self.desired_quantities(state, target) {
            let Some(price) = state.mark_price(&asset_id).filter(|p| *p > Decimal::ZERO) else {
                continue;
            };
            let current = state.quantity(&asset_id);
            let lot = self.config.asset(&asset_id).min_quantity();

            let (transaction_type, quantity) = if desired < current {
                // 전량 청산은 단위와 관계없이 보유 수량 전체
                let quantity = if desired.is_zero() {
                    current
                } else {
                    floor_quantity(current - desired, lot).min(current)
                };
                (TransactionType::Sell, quantity)
            } else if desired > current {
                (TransactionType::Buy, floor_quantity(desired - current, lot))
            } else {
                continue;
            };

            if quantity <= Decimal::ZERO || quantity * price < self.config.min_trade_value {
                continue;
            }

            let order = PlannedOrder {
                asset_id,
                transaction_type,
                quantity,
                price,
            };
            match transaction_type {
                TransactionType::Sell => sells.push(order),
                _ => buys.push(order),
            }
        }

        sells.extend(buys);
        sells
    }

    /// 목표 배분을 체결합니다. 발생한 경고를 반환합니다.
    pub fn execute(
        &self,
        state: &mut PortfolioState,
        target: &TargetAllocation,
        ledger: &mut TransactionLedger,
    ) -> Vec<SimulationWarning> {
        let (sells, buys): (Vec<_>, Vec<_>) = self
            .plan(state, target)
            .into_iter()
            .partition(|o| o.transaction_type == TransactionType::Sell);

        for order in &sells {
            self.fill_sell(state, order, ledger);
        }

        let mut warnings = Vec::new();
        let buys = self.fund_buys(state, buys, &mut warnings);
        for order in &buys {
            self.fill_buy(state, order, ledger);
        }

        warnings
    }

    /// 예약된 현금 흐름을 반영합니다.
    pub fn apply_cash_flow(
        &self,
        state: &mut PortfolioState,
        flow: &ScheduledCashFlow,
        ledger: &mut TransactionLedger,
    ) -> Option<SimulationWarning> {
        match &flow.kind {
            CashFlowKind::Deposit => {
                state.credit(flow.amount);
                ledger.record(state, cash_fill(CASH_ACCOUNT, TransactionType::Deposit, flow.amount, Decimal::ZERO));
                None
            }
            CashFlowKind::Withdrawal => {
                let available = state.cash();
                let withdrawn = state.debit(flow.amount);
                if withdrawn > Decimal::ZERO {
                    ledger.record(state, cash_fill(CASH_ACCOUNT, TransactionType::Withdrawal, withdrawn, Decimal::ZERO));
                }
                (withdrawn < flow.amount).then(|| SimulationWarning::InsufficientFunds {
                    date: state.date(),
                    source: ShortfallSource::Withdrawal,
                    required: flow.amount,
                    available,
                })
            }
            CashFlowKind::Dividend { asset_id } => {
                let tax = flow.amount * self.config.tax_rate;
                state.credit(flow.amount - tax);
                ledger.record(state, cash_fill(asset_id, TransactionType::Dividend, flow.amount, tax));
                None
            }
        }
    }

    fn desired_quantities(
        &self,
        state: &PortfolioState,
        target: &TargetAllocation,
    ) -> BTreeMap<String, Decimal> {
        match target {
            TargetAllocation::Weights(weights) => {
                let total = state.total_value().max(Decimal::ZERO);
                let mut desired: BTreeMap<String, Decimal> = state
                    .holdings()
                    .keys()
                    .map(|id| (id.clone(), Decimal::ZERO))
                    .collect();
                for (asset_id, weight) in weights {
                    let quantity = match state.mark_price(asset_id) {
                        Some(price) if price > Decimal::ZERO => {
                            total * (*weight).max(Decimal::ZERO) / price
                        }
                        _ => Decimal::ZERO,
                    };
                    desired.insert(asset_id.clone(), quantity);
                }
                desired
            }
            TargetAllocation::Quantities(quantities) => quantities
                .iter()
                .map(|(id, q)| (id.clone(), (*q).max(Decimal::ZERO)))
                .collect(),
        }
    }

    fn buy_price(&self, price: Decimal) -> Decimal {
        price * (Decimal::ONE + self.config.slippage_rate)
    }

    fn sell_price(&self, price: Decimal) -> Decimal {
        price * (Decimal::ONE - self.config.slippage_rate)
    }

    /// 매수 총액이 현금을 초과하면 모든 매수 수량을 같은 비율로 축소합니다.
    fn fund_buys(
        &self,
        state: &PortfolioState,
        buys: Vec<PlannedOrder>,
        warnings: &mut Vec<SimulationWarning>,
    ) -> Vec<PlannedOrder> {
        let required: Decimal = buys
            .iter()
            .map(|o| o.quantity * self.buy_price(o.price) * (Decimal::ONE + self.config.fee_rate))
            .sum();
        let available = state.cash().max(Decimal::ZERO);

        if required <= available || required.is_zero() {
            return buys;
        }

        warnings.push(SimulationWarning::InsufficientFunds {
            date: state.date(),
            source: ShortfallSource::Buys,
            required,
            available,
        });

        let ratio = available / required;
        buys.into_iter()
            .filter_map(|mut order| {
                let lot = self.config.asset(&order.asset_id).min_quantity();
                order.quantity = floor_quantity(order.quantity * ratio, lot);
                (order.quantity > Decimal::ZERO
                    && order.notional() >= self.config.min_trade_value)
                    .then_some(order)
            })
            .collect()
    }

    fn fill_sell(&self, state: &mut PortfolioState, order: &PlannedOrder, ledger: &mut TransactionLedger) {
        let price = self.sell_price(order.price);
        let notional = order.quantity * price;
        let fee = notional * self.config.fee_rate;
        let tax = notional * self.config.tax_rate;

        let sold = state.apply_sell(&order.asset_id, order.quantity, price, fee, tax);
        if sold.is_zero() {
            return;
        }
        ledger.record(
            state,
            Fill {
                asset_id: order.asset_id.clone(),
                transaction_type: TransactionType::Sell,
                quantity: sold,
                price,
                fee,
                tax,
            },
        );
    }

    fn fill_buy(&self, state: &mut PortfolioState, order: &PlannedOrder, ledger: &mut TransactionLedger) {
        let price = self.buy_price(order.price);
        let lot = self.config.asset(&order.asset_id).min_quantity();

        // 단위 내림 오차로 현금이 음수가 되지 않도록 체결 직전 재확인
        let mut quantity = order.quantity;
        let cost = |q: Decimal| q * price + q * price * self.config.fee_rate;
        if cost(quantity) > state.cash() {
            let unit_cost = price * (Decimal::ONE + self.config.fee_rate);
            quantity = floor_quantity(state.cash().max(Decimal::ZERO) / unit_cost, lot);
            while quantity > Decimal::ZERO && cost(quantity) > state.cash() {
                quantity -= if lot > Decimal::ZERO { lot } else { Decimal::new(1, FRACTIONAL_DP) };
            }
        }
        if quantity <= Decimal::ZERO {
            return;
        }

        let notional = quantity * price;
        let fee = notional * self.config.fee_rate;
        state.apply_buy(&order.asset_id, quantity, price, fee);
        ledger.record(
            state,
            Fill {
                asset_id: order.asset_id.clone(),
                transaction_type: TransactionType::Buy,
                quantity,
                price,
                fee,
                tax: Decimal::ZERO,
            },
        );
    }
}

fn cash_fill(asset_id: &str, transaction_type: TransactionType, amount: Decimal, tax: Decimal) -> Fill {
    Fill {
        asset_id: asset_id.to_string(),
        transaction_type,
        quantity: amount,
        price: Decimal::ONE,
        fee: Decimal::ZERO,
        tax,
    }
}

/// 최소 거래 단위로 내림합니다. 단위가 없는 자산은 소수 8자리에서 버림합니다.
fn floor_quantity(quantity: Decimal, lot: Decimal) -> Decimal {
    if lot > Decimal::ZERO {
        quantity.floor_to_lot(lot)
    } else {
        quantity.round_dp_with_strategy(FRACTIONAL_DP, RoundingStrategy::ToZero)
    }
}
