//! 전략 설정.
//!
//! 전략 유형별로 명시적인 파라미터 구조체를 가지는 태그드 유니온입니다.
//! 생성(역직렬화 포함) 시점에 검증되며, 잘못된 조합은 `ConfigurationError`로 거부됩니다.
//!
//! ```toml
//! name = "60/40 포트폴리오"
//! strategy_type = "asset_allocation"
//!
//! [parameters]
//! rebalancing_frequency = "quarterly"
//! rebalancing_threshold = 0.05
//!
//! [parameters.weights]
//! SPY = 0.6
//! TLT = 0.4
//! ```

use crate::condition::FundamentalCondition;
use crate::error::{ConfigResult, ConfigurationError};
use crate::schedule::{RebalanceFrequency, ReEvaluationFrequency};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// 자산 → 목표 비중.
pub type WeightMap = BTreeMap<String, Decimal>;

/// 전략 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// 매수 후 보유
    BuyAndHold,
    /// 이동평균 교차
    #[serde(alias = "ma_crossover")]
    MovingAverageCrossover,
    /// 자산 배분 / 리밸런싱
    #[serde(alias = "rebalancing")]
    AssetAllocation,
    /// 모멘텀
    Momentum,
    /// 펀더멘털 지표 순위
    #[serde(alias = "fundamental_indicator")]
    FundamentalRanking,
}

impl StrategyType {
    /// 모든 전략 유형.
    pub const ALL: [StrategyType; 5] = [
        StrategyType::BuyAndHold,
        StrategyType::MovingAverageCrossover,
        StrategyType::AssetAllocation,
        StrategyType::Momentum,
        StrategyType::FundamentalRanking,
    ];

    /// 설정 파일에 쓰는 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::BuyAndHold => "buy_and_hold",
            StrategyType::MovingAverageCrossover => "moving_average_crossover",
            StrategyType::AssetAllocation => "asset_allocation",
            StrategyType::Momentum => "momentum",
            StrategyType::FundamentalRanking => "fundamental_ranking",
        }
    }

    /// 한 줄 설명.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyType::BuyAndHold => "시작일에 목표 비중대로 매수 후 보유",
            StrategyType::MovingAverageCrossover => "단기/장기 이동평균 교차로 진입/청산",
            StrategyType::AssetAllocation => "고정 비중 유지, 주기 또는 이탈 임계값으로 리밸런싱",
            StrategyType::Momentum => "룩백 기간 수익률 상위 N개 자산 동일 비중",
            StrategyType::FundamentalRanking => "펀더멘털 조건 필터 후 지표 순위 상위 N개",
        }
    }

    /// 파라미터 목록 (이름, 설명).
    pub fn parameters(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            StrategyType::BuyAndHold => &[("weights", "자산별 비중 (합계로 정규화)")],
            StrategyType::MovingAverageCrossover => &[
                ("assets", "대상 자산 목록"),
                ("weights", "자산별 비중 (선택, 기본 동일 비중)"),
                ("short_window", "단기 이동평균 기간 (기본 20)"),
                ("long_window", "장기 이동평균 기간 (기본 60)"),
            ],
            StrategyType::AssetAllocation => &[
                ("weights", "자산별 목표 비중"),
                (
                    "rebalancing_frequency",
                    "daily/weekly/monthly/quarterly/annual/never/always (기본 monthly)",
                ),
                ("rebalancing_threshold", "비중 이탈 임계값 (선택, 예: 0.05)"),
            ],
            StrategyType::Momentum => &[
                ("asset_pool", "후보 자산 목록"),
                ("lookback_months", "룩백 개월 수 (기본 3)"),
                ("top_n", "선택 자산 수 (기본 1)"),
                ("risk_free_asset", "비교용 무위험 자산 (선택, 배분에 미사용)"),
            ],
            StrategyType::FundamentalRanking => &[
                ("universe", "후보 자산 목록"),
                ("conditions", "필터 조건 목록 (예: \"per < 10\")"),
                ("ranking_metric", "순위 지표"),
                ("ranking_order", "asc/desc (기본 desc)"),
                ("top_n", "선택 자산 수 (기본 20)"),
                ("re_evaluation_frequency", "quarterly/annual (기본 annual)"),
            ],
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ================================================================================================
// 유형별 파라미터
// ================================================================================================

/// 매수 후 보유 파라미터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyAndHoldParams {
    /// 자산별 비중
    pub weights: WeightMap,
}

fn default_short_window() -> usize {
    20
}

fn default_long_window() -> usize {
    60
}

/// 이동평균 교차 파라미터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageCrossoverParams {
    /// 대상 자산 (비어 있으면 `weights`의 키)
    #[serde(default)]
    pub assets: Vec<String>,
    /// 자산별 비중 (없으면 동일 비중)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightMap>,
    /// 단기 이동평균 기간 (거래일)
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    /// 장기 이동평균 기간 (거래일)
    #[serde(default = "default_long_window")]
    pub long_window: usize,
}

impl MovingAverageCrossoverParams {
    /// 투자 시 자산별 비중 (정규화됨).
    pub fn slot_weights(&self) -> WeightMap {
        match &self.weights {
            Some(weights) if !weights.is_empty() => normalize_weights(weights),
            _ => {
                let n = Decimal::from(self.assets.len().max(1));
                self.assets
                    .iter()
                    .map(|asset| (asset.clone(), Decimal::ONE / n))
                    .collect()
            }
        }
    }
}

/// 자산 배분 파라미터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocationParams {
    /// 목표 비중
    pub weights: WeightMap,
    /// 리밸런싱 주기
    #[serde(default)]
    pub rebalancing_frequency: RebalanceFrequency,
    /// 비중 이탈 임계값 (비율)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebalancing_threshold: Option<Decimal>,
}

fn default_lookback_months() -> u32 {
    3
}

fn default_momentum_top_n() -> usize {
    1
}

/// 모멘텀 파라미터.
///
/// 선택된 자산은 항상 동일 비중이며, 비중 설정은 무시됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumParams {
    /// 후보 자산
    pub asset_pool: Vec<String>,
    /// 룩백 개월 수
    #[serde(default = "default_lookback_months")]
    pub lookback_months: u32,
    /// 선택 자산 수
    #[serde(default = "default_momentum_top_n")]
    pub top_n: usize,
    /// 결과 비교용 무위험 자산
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_free_asset: Option<String>,
}

/// 순위 정렬 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingOrder {
    /// 오름차순 (낮을수록 상위, 예: PER)
    #[serde(alias = "ascending")]
    Asc,
    /// 내림차순 (높을수록 상위, 예: ROE)
    #[default]
    #[serde(alias = "descending")]
    Desc,
}

fn default_fundamental_top_n() -> usize {
    20
}

/// 펀더멘털 지표 순위 파라미터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRankingParams {
    /// 후보 자산
    pub universe: Vec<String>,
    /// 필터 조건 (모두 만족해야 통과)
    #[serde(default)]
    pub conditions: Vec<FundamentalCondition>,
    /// 순위 지표
    pub ranking_metric: String,
    /// 순위 정렬 방향
    #[serde(default)]
    pub ranking_order: RankingOrder,
    /// 선택 자산 수
    #[serde(default = "default_fundamental_top_n")]
    pub top_n: usize,
    /// 재평가 주기
    #[serde(default)]
    pub re_evaluation_frequency: ReEvaluationFrequency,
}

/// 유형별 파라미터.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyParams {
    BuyAndHold(BuyAndHoldParams),
    MovingAverageCrossover(MovingAverageCrossoverParams),
    AssetAllocation(AssetAllocationParams),
    Momentum(MomentumParams),
    FundamentalRanking(FundamentalRankingParams),
}

impl StrategyParams {
    /// 전략 유형.
    pub fn strategy_type(&self) -> StrategyType {
        match self {
            StrategyParams::BuyAndHold(_) => StrategyType::BuyAndHold,
            StrategyParams::MovingAverageCrossover(_) => StrategyType::MovingAverageCrossover,
            StrategyParams::AssetAllocation(_) => StrategyType::AssetAllocation,
            StrategyParams::Momentum(_) => StrategyType::Momentum,
            StrategyParams::FundamentalRanking(_) => StrategyType::FundamentalRanking,
        }
    }

    /// 파라미터를 검증합니다.
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            StrategyParams::BuyAndHold(p) => validate_weights("weights", &p.weights),
            StrategyParams::MovingAverageCrossover(p) => {
                if p.assets.is_empty() {
                    return Err(ConfigurationError::EmptyAssets("assets".to_string()));
                }
                validate_asset_ids("assets", &p.assets)?;
                if let Some(weights) = &p.weights {
                    validate_weights("weights", weights)?;
                    if let Some(unknown) = weights.keys().find(|k| !p.assets.contains(k)) {
                        return Err(ConfigurationError::invalid(
                            "weights",
                            format!("assets에 없는 자산: {}", unknown),
                        ));
                    }
                }
                if p.short_window == 0 {
                    return Err(ConfigurationError::invalid("short_window", "1 이상이어야 합니다"));
                }
                if p.short_window >= p.long_window {
                    return Err(ConfigurationError::invalid(
                        "long_window",
                        format!(
                            "short_window({})보다 커야 합니다: {}",
                            p.short_window, p.long_window
                        ),
                    ));
                }
                Ok(())
            }
            StrategyParams::AssetAllocation(p) => {
                validate_weights("weights", &p.weights)?;
                if let Some(threshold) = p.rebalancing_threshold {
                    if threshold < Decimal::ZERO || threshold > Decimal::ONE {
                        return Err(ConfigurationError::invalid(
                            "rebalancing_threshold",
                            format!("0 이상 1 이하여야 합니다: {}", threshold),
                        ));
                    }
                }
                Ok(())
            }
            StrategyParams::Momentum(p) => {
                if p.asset_pool.is_empty() {
                    return Err(ConfigurationError::EmptyAssets("asset_pool".to_string()));
                }
                validate_asset_ids("asset_pool", &p.asset_pool)?;
                if p.lookback_months == 0 {
                    return Err(ConfigurationError::invalid(
                        "lookback_months",
                        "1 이상이어야 합니다",
                    ));
                }
                if p.top_n == 0 || p.top_n > p.asset_pool.len() {
                    return Err(ConfigurationError::invalid(
                        "top_n",
                        format!("1 이상 {} 이하여야 합니다: {}", p.asset_pool.len(), p.top_n),
                    ));
                }
                Ok(())
            }
            StrategyParams::FundamentalRanking(p) => {
                if p.universe.is_empty() {
                    return Err(ConfigurationError::EmptyAssets("universe".to_string()));
                }
                validate_asset_ids("universe", &p.universe)?;
                if p.ranking_metric.trim().is_empty() {
                    return Err(ConfigurationError::invalid("ranking_metric", "비어 있습니다"));
                }
                if p.top_n == 0 {
                    return Err(ConfigurationError::invalid("top_n", "1 이상이어야 합니다"));
                }
                Ok(())
            }
        }
    }
}

fn validate_asset_ids(field: &str, assets: &[String]) -> ConfigResult<()> {
    if assets.iter().any(|a| a.trim().is_empty()) {
        return Err(ConfigurationError::invalid(field, "빈 자산 식별자"));
    }
    let unique: BTreeSet<&String> = assets.iter().collect();
    if unique.len() != assets.len() {
        return Err(ConfigurationError::invalid(field, "중복된 자산"));
    }
    Ok(())
}

fn validate_weights(field: &str, weights: &WeightMap) -> ConfigResult<()> {
    if weights.is_empty() {
        return Err(ConfigurationError::EmptyAssets(field.to_string()));
    }
    if weights.keys().any(|k| k.trim().is_empty()) {
        return Err(ConfigurationError::invalid(field, "빈 자산 식별자"));
    }
    if let Some((asset, weight)) = weights.iter().find(|(_, w)| **w < Decimal::ZERO) {
        return Err(ConfigurationError::invalid(
            field,
            format!("{}의 비중이 음수입니다: {}", asset, weight),
        ));
    }
    let total: Decimal = weights.values().sum();
    if total <= Decimal::ZERO {
        return Err(ConfigurationError::invalid(field, "비중 합계가 0입니다"));
    }
    Ok(())
}

/// 비중 합계가 1이 되도록 정규화합니다.
///
/// 합계가 0 이하면 빈 맵을 반환합니다.
pub fn normalize_weights(weights: &WeightMap) -> WeightMap {
    let total: Decimal = weights.values().sum();
    if total <= Decimal::ZERO {
        return WeightMap::new();
    }
    weights
        .iter()
        .map(|(asset, weight)| (asset.clone(), *weight / total))
        .collect()
}

// ================================================================================================
// 전략 설정
// ================================================================================================

/// 검증된 전략 설정.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStrategyConfig")]
pub struct StrategyConfig {
    /// 전략 ID
    pub id: String,
    /// 전략 이름
    pub name: String,
    params: StrategyParams,
}

impl StrategyConfig {
    /// 검증 후 새 설정을 생성합니다. ID는 새로 발급됩니다.
    pub fn new(name: impl Into<String>, params: StrategyParams) -> ConfigResult<Self> {
        params.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            params,
        })
    }

    /// ID를 지정합니다.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// TOML 문자열에서 파싱합니다.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// JSON 문자열에서 파싱합니다.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// 유형별 파라미터.
    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// 전략 유형.
    pub fn strategy_type(&self) -> StrategyType {
        self.params.strategy_type()
    }

    /// 파라미터를 다시 검증합니다.
    pub fn validate(&self) -> ConfigResult<()> {
        self.params.validate()
    }

    /// 시뮬레이션이 가격을 추적해야 하는 자산 (정렬, 중복 제거).
    pub fn referenced_assets(&self) -> Vec<String> {
        let assets: BTreeSet<String> = match &self.params {
            StrategyParams::BuyAndHold(p) => p.weights.keys().cloned().collect(),
            StrategyParams::MovingAverageCrossover(p) => p.assets.iter().cloned().collect(),
            StrategyParams::AssetAllocation(p) => p.weights.keys().cloned().collect(),
            StrategyParams::Momentum(p) => p.asset_pool.iter().cloned().collect(),
            StrategyParams::FundamentalRanking(p) => p.universe.iter().cloned().collect(),
        };
        assets.into_iter().collect()
    }

    /// 결과 비교용으로만 쓰는 자산.
    pub fn benchmark_assets(&self) -> Vec<String> {
        match &self.params {
            StrategyParams::Momentum(p) => p.risk_free_asset.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// 펀더멘털 데이터가 필요한지 확인합니다.
    pub fn requires_fundamentals(&self) -> bool {
        matches!(self.params, StrategyParams::FundamentalRanking(_))
    }

    /// 신호 계산에 필요한 과거 데이터의 시작일.
    pub fn data_start(&self, start: NaiveDate) -> NaiveDate {
        match &self.params {
            StrategyParams::MovingAverageCrossover(p) => start
                .checked_sub_days(Days::new(p.long_window as u64 * 2 + 7))
                .unwrap_or(start),
            StrategyParams::Momentum(p) => start
                .checked_sub_months(Months::new(p.lookback_months))
                .and_then(|d| d.checked_sub_days(Days::new(7)))
                .unwrap_or(start),
            _ => start,
        }
    }
}

fn new_strategy_id() -> String {
    Uuid::new_v4().to_string()
}

/// 역직렬화 표현. 파라미터는 유형을 안 뒤에 해석합니다.
#[derive(Debug, Clone, Deserialize)]
struct RawStrategyConfig {
    #[serde(default = "new_strategy_id")]
    id: String,
    #[serde(default)]
    name: String,
    strategy_type: StrategyType,
    #[serde(default)]
    parameters: serde_json::Value,
}

fn parse_params<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ConfigResult<T> {
    let value = if value.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| ConfigurationError::Parse(e.to_string()))
}

impl TryFrom<RawStrategyConfig> for StrategyConfig {
    type Error = ConfigurationError;

    fn try_from(raw: RawStrategyConfig) -> Result<Self, Self::Error> {
        let params = match raw.strategy_type {
            StrategyType::BuyAndHold => StrategyParams::BuyAndHold(parse_params(raw.parameters)?),
            StrategyType::MovingAverageCrossover => {
                let mut p: MovingAverageCrossoverParams = parse_params(raw.parameters)?;
                if p.assets.is_empty() {
                    if let Some(weights) = &p.weights {
                        p.assets = weights.keys().cloned().collect();
                    }
                }
                StrategyParams::MovingAverageCrossover(p)
            }
            StrategyType::AssetAllocation => {
                StrategyParams::AssetAllocation(parse_params(raw.parameters)?)
            }
            StrategyType::Momentum => StrategyParams::Momentum(parse_params(raw.parameters)?),
            StrategyType::FundamentalRanking => {
                StrategyParams::FundamentalRanking(parse_params(raw.parameters)?)
            }
        };
        params.validate()?;

        let name = if raw.name.trim().is_empty() {
            params.strategy_type().to_string()
        } else {
            raw.name
        };

        Ok(Self {
            id: raw.id,
            name,
            params,
        })
    }
}

impl Serialize for StrategyConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StrategyConfig", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("strategy_type", &self.strategy_type())?;
        match &self.params {
            StrategyParams::BuyAndHold(p) => state.serialize_field("parameters", p)?,
            StrategyParams::MovingAverageCrossover(p) => state.serialize_field("parameters", p)?,
            StrategyParams::AssetAllocation(p) => state.serialize_field("parameters", p)?,
            StrategyParams::Momentum(p) => state.serialize_field("parameters", p)?,
            StrategyParams::FundamentalRanking(p) => state.serialize_field("parameters", p)?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn weights(entries: &[(&str, Decimal)]) -> WeightMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_asset_allocation_toml() {
        let config = StrategyConfig::from_toml_str(
            r#"
            id = "aa-1"
            name = "60/40"
            strategy_type = "asset_allocation"

            [parameters]
            rebalancing_frequency = "quarterly"
            rebalancing_threshold = 0.05

            [parameters.weights]
            SPY = 0.6
            TLT = 0.4
            "#,
        )
        .unwrap();

        assert_eq!(config.id, "aa-1");
        assert_eq!(config.strategy_type(), StrategyType::AssetAllocation);
        assert_eq!(config.referenced_assets(), vec!["SPY", "TLT"]);
        match config.params() {
            StrategyParams::AssetAllocation(p) => {
                assert_eq!(p.rebalancing_frequency, RebalanceFrequency::Quarterly);
                assert_eq!(p.rebalancing_threshold, Some(dec!(0.05)));
                assert_eq!(p.weights.get("SPY"), Some(&dec!(0.6)));
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn test_parse_momentum_json_ignores_weights() {
        let config = StrategyConfig::from_json_str(
            r#"{
                "name": "dual",
                "strategy_type": "momentum",
                "parameters": {
                    "asset_pool": ["SPY", "EFA", "AGG"],
                    "top_n": 1,
                    "weights": {"SPY": 1.0},
                    "risk_free_asset": "BIL"
                }
            }"#,
        )
        .unwrap();

        assert!(!config.id.is_empty());
        assert_eq!(config.benchmark_assets(), vec!["BIL"]);
        match config.params() {
            StrategyParams::Momentum(p) => assert_eq!(p.lookback_months, 3),
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_negative_weight() {
        let params = StrategyParams::BuyAndHold(BuyAndHoldParams {
            weights: weights(&[("SPY", dec!(1)), ("TLT", dec!(-0.5))]),
        });
        let err = StrategyConfig::new("bad", params).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_empty_momentum_pool() {
        let err = StrategyConfig::from_json_str(
            r#"{"strategy_type": "momentum", "parameters": {"asset_pool": []}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("asset_pool"));
    }

    #[test]
    fn test_rejects_unknown_strategy_type() {
        let err = StrategyConfig::from_json_str(r#"{"strategy_type": "martingale"}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn test_rejects_unparseable_condition() {
        let err = StrategyConfig::from_json_str(
            r#"{
                "strategy_type": "fundamental_ranking",
                "parameters": {
                    "universe": ["A", "B"],
                    "ranking_metric": "roe",
                    "conditions": ["per ~ 10"]
                }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn test_ma_crossover_window_validation() {
        let params = StrategyParams::MovingAverageCrossover(MovingAverageCrossoverParams {
            assets: vec!["SPY".to_string()],
            weights: None,
            short_window: 50,
            long_window: 20,
        });
        assert!(StrategyConfig::new("ma", params).is_err());
    }

    #[test]
    fn test_ma_crossover_assets_from_weights() {
        let config = StrategyConfig::from_json_str(
            r#"{
                "strategy_type": "ma_crossover",
                "parameters": {"weights": {"QQQ": 3, "SPY": 1}, "short_window": 5, "long_window": 10}
            }"#,
        )
        .unwrap();
        match config.params() {
            StrategyParams::MovingAverageCrossover(p) => {
                assert_eq!(p.assets, vec!["QQQ", "SPY"]);
                assert_eq!(p.slot_weights().get("QQQ"), Some(&dec!(0.75)));
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn test_data_start_includes_warmup() {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let config = StrategyConfig::new(
            "mom",
            StrategyParams::Momentum(MomentumParams {
                asset_pool: vec!["A".to_string()],
                lookback_months: 3,
                top_n: 1,
                risk_free_asset: None,
            }),
        )
        .unwrap();
        assert_eq!(
            config.data_start(start),
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        );
    }

    #[test]
    fn test_serialize_roundtrip_preserves_params() {
        let config = StrategyConfig::new(
            "bh",
            StrategyParams::BuyAndHold(BuyAndHoldParams {
                weights: weights(&[("SPY", dec!(1))]),
            }),
        )
        .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back = StrategyConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_toml_roundtrip_keeps_parameter_table() {
        let config = StrategyConfig::new(
            "dual momentum",
            StrategyParams::Momentum(MomentumParams {
                asset_pool: vec!["SPY".to_string(), "EFA".to_string()],
                lookback_months: 6,
                top_n: 1,
                risk_free_asset: Some("BIL".to_string()),
            }),
        )
        .unwrap();

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("strategy_type = \"momentum\""));
        assert!(text.contains("[parameters]"));
        let back = StrategyConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_normalize_weights() {
        let normalized = normalize_weights(&weights(&[("A", dec!(3)), ("B", dec!(1))]));
        assert_eq!(normalized.get("A"), Some(&dec!(0.75)));
        assert_eq!(normalized.get("B"), Some(&dec!(0.25)));
    }
}
