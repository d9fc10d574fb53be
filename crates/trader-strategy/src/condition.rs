//! 펀더멘털 필터 조건.
//!
//! 조건은 `값 지표 (연산자) 배수 × 비교 지표` 형태입니다.
//!
//! ```text
//! per < 10
//! net_current_asset_value > 1.5 * market_cap
//! roe >= 0.15
//! ```
//!
//! 테이블 형식도 지원합니다:
//!
//! ```toml
//! [[parameters.conditions]]
//! value_metric = "net_current_asset_value"
//! comparison_operator = ">"
//! comparison_metric = "market_cap"
//! comparison_multiplier = 1.5
//! ```

use crate::error::ConfigurationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 유동자산 − 총부채.
pub const NET_CURRENT_ASSET_VALUE: &str = "net_current_asset_value";
/// 종가 × 발행주식수.
pub const MARKET_CAP: &str = "market_cap";
/// 상수 1을 뜻하는 비교 지표 (배수가 실제 상수 값이 됨).
pub const CONSTANT: &str = "constant";

/// 비교 연산자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl ComparisonOperator {
    /// 두 값을 비교합니다.
    pub fn apply(&self, lhs: Decimal, rhs: Decimal) -> bool {
        match self {
            ComparisonOperator::Gt => lhs > rhs,
            ComparisonOperator::Lt => lhs < rhs,
            ComparisonOperator::Ge => lhs >= rhs,
            ComparisonOperator::Le => lhs <= rhs,
            ComparisonOperator::Eq => lhs == rhs,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Eq => "=",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            "=" | "==" => Ok(Self::Eq),
            other => Err(ConfigurationError::InvalidCondition(format!(
                "알 수 없는 연산자: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 비교 대상.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonTarget {
    /// 다른 지표
    Metric(String),
    /// 상수
    Constant(Decimal),
}

impl ComparisonTarget {
    fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigurationError::InvalidCondition(
                "비교 대상이 비어 있습니다".to_string(),
            ));
        }
        if raw.eq_ignore_ascii_case(CONSTANT) {
            return Ok(Self::Constant(Decimal::ONE));
        }
        if let Ok(value) = Decimal::from_str(raw) {
            return Ok(Self::Constant(value));
        }
        parse_metric_name(raw).map(Self::Metric)
    }
}

impl fmt::Display for ComparisonTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonTarget::Metric(name) => write!(f, "{}", name),
            ComparisonTarget::Constant(value) => write!(f, "{}", value),
        }
    }
}

fn parse_metric_name(raw: &str) -> Result<String, ConfigurationError> {
    let name = raw.trim().to_lowercase();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(ConfigurationError::InvalidCondition(format!(
            "지표 이름이 올바르지 않습니다: {}",
            raw
        )))
    }
}

/// 펀더멘털 필터 조건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRepr", into = "String")]
pub struct FundamentalCondition {
    /// 좌변 지표
    pub value_metric: String,
    /// 비교 연산자
    pub operator: ComparisonOperator,
    /// 우변 지표 또는 상수
    pub comparison: ComparisonTarget,
    /// 우변에 곱하는 배수
    pub multiplier: Decimal,
}

impl FundamentalCondition {
    /// 조건을 평가합니다.
    ///
    /// 필요한 지표가 없으면 `None`을 반환합니다.
    pub fn evaluate(&self, metrics: &MetricView<'_>) -> Option<bool> {
        let lhs = metrics.get(&self.value_metric)?;
        let rhs = match &self.comparison {
            ComparisonTarget::Metric(name) => metrics.get(name)?,
            ComparisonTarget::Constant(value) => *value,
        };
        Some(self.operator.apply(lhs, rhs * self.multiplier))
    }
}

impl FromStr for FundamentalCondition {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable =
            || ConfigurationError::InvalidCondition(format!("'{}' 형식이 올바르지 않습니다", s));

        // 두 글자 연산자를 먼저 찾음
        let (op_pos, op_len) = [">=", "<=", "==", ">", "<", "="]
            .iter()
            .find_map(|op| s.find(op).map(|pos| (pos, op.len())))
            .ok_or_else(unparseable)?;

        let lhs = &s[..op_pos];
        let operator: ComparisonOperator = s[op_pos..op_pos + op_len].parse()?;
        let rhs = s[op_pos + op_len..].trim();

        let (multiplier, target) = match rhs.split_once('*') {
            Some((factor, target)) => {
                let factor = Decimal::from_str(factor.trim()).map_err(|_| unparseable())?;
                (factor, target)
            }
            None => (Decimal::ONE, rhs),
        };

        Ok(Self {
            value_metric: parse_metric_name(lhs)?,
            operator,
            comparison: ComparisonTarget::parse(target)?,
            multiplier,
        })
    }
}

impl fmt::Display for FundamentalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.multiplier == Decimal::ONE {
            write!(f, "{} {} {}", self.value_metric, self.operator, self.comparison)
        } else {
            write!(
                f,
                "{} {} {} * {}",
                self.value_metric, self.operator, self.multiplier, self.comparison
            )
        }
    }
}

impl From<FundamentalCondition> for String {
    fn from(condition: FundamentalCondition) -> Self {
        condition.to_string()
    }
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

/// 직렬화 표현 (문자열 또는 테이블).
#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionRepr {
    Text(String),
    Table {
        value_metric: String,
        comparison_operator: String,
        comparison_metric: String,
        #[serde(default = "default_multiplier")]
        comparison_multiplier: Decimal,
    },
}

impl TryFrom<ConditionRepr> for FundamentalCondition {
    type Error = ConfigurationError;

    fn try_from(repr: ConditionRepr) -> Result<Self, Self::Error> {
        match repr {
            ConditionRepr::Text(text) => text.parse(),
            ConditionRepr::Table {
                value_metric,
                comparison_operator,
                comparison_metric,
                comparison_multiplier,
            } => Ok(Self {
                value_metric: parse_metric_name(&value_metric)?,
                operator: comparison_operator.parse()?,
                comparison: ComparisonTarget::parse(&comparison_metric)?,
                multiplier: comparison_multiplier,
            }),
        }
    }
}

/// 지표 조회 뷰.
///
/// 스냅샷에 없는 파생 지표(`net_current_asset_value`, `market_cap`)를 계산합니다.
#[derive(Debug, Clone, Copy)]
pub struct MetricView<'a> {
    snapshot: &'a BTreeMap<String, Decimal>,
    price: Option<Decimal>,
}

impl<'a> MetricView<'a> {
    /// 스냅샷과 해당 시점 종가로 뷰를 생성합니다.
    pub fn new(snapshot: &'a BTreeMap<String, Decimal>, price: Option<Decimal>) -> Self {
        Self { snapshot, price }
    }

    /// 지표 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<Decimal> {
        if let Some(value) = self.snapshot.get(name) {
            return Some(*value);
        }
        match name {
            NET_CURRENT_ASSET_VALUE => {
                let current_assets = self.snapshot.get("current_assets")?;
                let total_liabilities = self.snapshot.get("total_liabilities")?;
                Some(*current_assets - *total_liabilities)
            }
            MARKET_CAP => {
                let shares = self.snapshot.get("shares_outstanding")?;
                Some(self.price? * *shares)
            }
            _ => None,
        }
    }
}
