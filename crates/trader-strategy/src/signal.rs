//! 신호 엔진 인터페이스.
//!
//! 시뮬레이션 루프는 매 거래일마다 `SignalEngine::evaluate`를 호출하고,
//! 엔진은 오늘이 의사결정일이면 목표 배분을 반환합니다.
//! 컨텍스트는 해당 날짜까지의 데이터만 노출하므로 미래 데이터를 참조할 수 없습니다.

use crate::error::SignalError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trader_core::{PricePoint, PriceSeries};
use trader_data::FundamentalProvider;

/// 목표 배분.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAllocation {
    /// 자산 → 포트폴리오 비중. 목록에 없는 보유 자산의 목표는 0입니다.
    Weights(BTreeMap<String, Decimal>),
    /// 자산 → 목표 수량. 목록에 없는 보유 자산은 그대로 둡니다.
    Quantities(BTreeMap<String, Decimal>),
}

impl TargetAllocation {
    /// 전액 현금 보유.
    pub fn all_cash() -> Self {
        TargetAllocation::Weights(BTreeMap::new())
    }

    /// 동일 비중 배분.
    pub fn equal_weight<'a, I>(assets: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let assets: Vec<&String> = assets.into_iter().collect();
        if assets.is_empty() {
            return Self::all_cash();
        }
        let weight = Decimal::ONE / Decimal::from(assets.len());
        TargetAllocation::Weights(assets.into_iter().map(|a| (a.clone(), weight)).collect())
    }

    /// 배분 대상 자산 목록.
    pub fn assets(&self) -> Vec<&str> {
        match self {
            TargetAllocation::Weights(map) | TargetAllocation::Quantities(map) => {
                map.keys().map(String::as_str).collect()
            }
        }
    }
}

/// 신호 엔진이 내린 결정.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// 목표 배분
    pub target: TargetAllocation,
    /// 결정 사유 (디버그 로그용)
    pub reason: String,
}

impl Signal {
    /// 새 신호를 생성합니다.
    pub fn new(target: TargetAllocation, reason: impl Into<String>) -> Self {
        Self {
            target,
            reason: reason.into(),
        }
    }
}

/// 특정 날짜 기준 가격 조회 뷰.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    date: NaiveDate,
    series: &'a BTreeMap<String, PriceSeries>,
}

impl<'a> MarketView<'a> {
    /// 날짜와 자산별 전체 시계열로 뷰를 생성합니다.
    pub fn new(date: NaiveDate, series: &'a BTreeMap<String, PriceSeries>) -> Self {
        Self { date, series }
    }

    /// 기준일.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// 기준일 이전(포함) 가장 최근 종가.
    pub fn latest_price(&self, asset_id: &str) -> Option<Decimal> {
        self.series
            .get(asset_id)
            .and_then(|s| s.last_on_or_before(self.date))
            .map(|p| p.close)
    }

    /// 기준일까지(포함)의 가격 이력.
    pub fn history(&self, asset_id: &str) -> &'a [PricePoint] {
        self.series
            .get(asset_id)
            .map(|s| s.up_to(self.date))
            .unwrap_or(&[])
    }
}

/// 신호 계산 컨텍스트.
pub struct SignalContext<'a> {
    /// 시뮬레이션 날짜
    pub date: NaiveDate,
    /// 가격 조회 뷰
    pub market: MarketView<'a>,
    /// 오늘 종가 기준 현재 보유 비중
    pub current_weights: &'a BTreeMap<String, Decimal>,
    /// 펀더멘털 Provider (펀더멘털 전략에만 필요)
    pub fundamentals: Option<&'a dyn FundamentalProvider>,
}

/// 전략 유형별 목표 배분 계산기.
pub trait SignalEngine: Send {
    /// 엔진 이름.
    fn name(&self) -> &str;

    /// 오늘이 의사결정일이면 목표 배분을 반환합니다.
    fn evaluate(&mut self, ctx: &SignalContext<'_>) -> Result<Option<Signal>, SignalError>;

    /// 직전 `evaluate` 이후 쌓인 진단 메시지를 꺼냅니다.
    ///
    /// 재평가를 건너뛴 사유처럼 신호 없이 끝난 판단을 디버그 로그에 남길 때 씁니다.
    fn drain_notes(&mut self) -> Vec<String> {
        Vec::new()
    }
}
