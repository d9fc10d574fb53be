//! 백테스트 엔진
//!
//! 거래일마다 포트폴리오를 시가 평가하고, 신호 엔진이 의사결정일로 판단하면
//! 주문 실행기로 목표 배분을 체결한 뒤 평가액을 기록합니다.
//!
//! 시뮬레이션은 `Initializing → Running → Finalizing` 단계를 거치며,
//! 가격 시계열은 모두 시작 전에 조회하므로 루프 안에서는 I/O가 없습니다.

use super::benchmark::collect_benchmarks;
use super::config::{BacktestConfig, ScheduledCashFlow};
use super::error::{BacktestError, Result, SimulationWarning};
use super::executor::{OrderExecutor, TransactionLedger};
use super::portfolio::PortfolioState;
use super::result::{BacktestResult, ResultAssembler, ValuePoint};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trader_core::{backtest_span, PriceSeries, SimulatedTransaction};
use trader_data::{BenchmarkProvider, FundamentalProvider, PriceSeriesProvider};
use trader_strategy::{build_signal_engine, MarketView, SignalContext, SignalEngine, StrategyConfig};
use uuid::Uuid;

/// 백테스트 실행 요청.
#[derive(Debug, Clone)]
pub struct BacktestRequest {
    /// 전략 설정
    pub strategy: StrategyConfig,
    /// 시작일 (포함)
    pub start_date: NaiveDate,
    /// 종료일 (포함)
    pub end_date: NaiveDate,
    /// 초기 자본
    pub initial_capital: Decimal,
    /// 디버그 로그 기록 여부
    pub debug: bool,
}

impl BacktestRequest {
    pub fn new(
        strategy: StrategyConfig,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: Decimal,
    ) -> Self {
        Self {
            strategy,
            start_date,
            end_date,
            initial_capital,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 요청 검증
    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::Configuration(format!(
                "초기 자본은 0보다 커야 합니다: {}",
                self.initial_capital
            )));
        }
        if self.start_date > self.end_date {
            return Err(BacktestError::Configuration(format!(
                "시작일({})이 종료일({})보다 늦습니다",
                self.start_date, self.end_date
            )));
        }
        self.strategy.validate()?;
        Ok(())
    }
}

/// 시뮬레이션 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    /// 초기 자본 투입 및 첫 배분
    Initializing,
    /// 일별 반복
    Running,
    /// 지표 계산 및 결과 조립
    Finalizing,
}

/// 백테스팅 엔진
///
/// 한 번의 `run` 호출은 자신만의 포트폴리오 상태와 원장을 소유하므로
/// 같은 엔진을 여러 스레드에서 동시에 실행해도 서로 영향을 주지 않습니다.
#[derive(Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
    prices: Arc<dyn PriceSeriesProvider>,
    fundamentals: Option<Arc<dyn FundamentalProvider>>,
    benchmarks: Option<Arc<dyn BenchmarkProvider>>,
    cancel: CancellationToken,
    job_id: Option<Uuid>,
}

impl BacktestEngine {
    /// 새 백테스트 엔진 생성
    pub fn new(config: BacktestConfig, prices: Arc<dyn PriceSeriesProvider>) -> Self {
        Self {
            config,
            prices,
            fundamentals: None,
            benchmarks: None,
            cancel: CancellationToken::new(),
            job_id: None,
        }
    }

    /// 펀더멘털 Provider 설정
    pub fn with_fundamentals(mut self, provider: Arc<dyn FundamentalProvider>) -> Self {
        self.fundamentals = Some(provider);
        self
    }

    /// 벤치마크 Provider 설정. 미설정 시 가격 Provider에서 조회합니다.
    pub fn with_benchmarks(mut self, provider: Arc<dyn BenchmarkProvider>) -> Self {
        self.benchmarks = Some(provider);
        self
    }

    /// 취소 토큰 설정
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub(crate) fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// 백테스트 실행
    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestResult> {
        let span = match self.job_id {
            Some(job_id) => backtest_span!(request.strategy.name, job_id),
            None => backtest_span!(request.strategy.name),
        };
        let _enter = span.enter();

        request.validate()?;
        self.config.validate()?;
        if request.strategy.requires_fundamentals() && self.fundamentals.is_none() {
            return Err(BacktestError::Configuration(format!(
                "{} 전략에는 펀더멘털 데이터가 필요합니다",
                request.strategy.strategy_type()
            )));
        }

        info!(
            strategy_type = %request.strategy.strategy_type(),
            start = %request.start_date,
            end = %request.end_date,
            initial_capital = %request.initial_capital,
            "백테스트 시작"
        );

        let mut warnings = Vec::new();
        let series = self.load_series(request, &mut warnings)?;
        let dates = simulation_dates(&series, request.start_date, request.end_date);
        if dates.is_empty() {
            return Err(BacktestError::FatalSimulation(format!(
                "{} ~ {} 구간에 가격 데이터가 있는 자산이 없습니다",
                request.start_date, request.end_date
            )));
        }

        let mut simulation = SimulationLoop::new(
            &self.config,
            &series,
            self.fundamentals.as_deref(),
            build_signal_engine(&request.strategy),
            PortfolioState::new(request.initial_capital, dates[0]),
            request.debug,
        );
        for warning in warnings {
            simulation.warn(warning);
        }

        for date in dates {
            if self.cancel.is_cancelled() {
                info!(%date, "백테스트 취소됨");
                return Err(BacktestError::Cancelled);
            }
            simulation.step(date)?;
        }

        let mut benchmark_ids = self.config.benchmarks.clone();
        benchmark_ids.extend(request.strategy.benchmark_assets());
        let (benchmarks, benchmark_warnings) = match &self.benchmarks {
            Some(provider) => collect_benchmarks(
                provider.as_ref(),
                &benchmark_ids,
                request.start_date,
                request.end_date,
                request.initial_capital,
            ),
            None => collect_benchmarks(
                &PriceBenchmarks(self.prices.as_ref()),
                &benchmark_ids,
                request.start_date,
                request.end_date,
                request.initial_capital,
            ),
        };
        for warning in benchmark_warnings {
            simulation.warn(warning);
        }

        let (value_history, transactions, debug_log) = simulation.finish();

        let result = ResultAssembler::new(
            request.strategy.id.clone(),
            request.strategy.name.clone(),
            request.start_date,
            request.end_date,
            request.initial_capital,
        )
        .with_benchmarks(benchmarks)
        .with_debug_log(debug_log)
        .assemble(value_history, transactions);

        info!(
            final_capital = %result.final_capital(),
            trades = result.trade_count(),
            sharpe = result.metrics().sharpe_ratio,
            "백테스트 완료"
        );

        Ok(result)
    }

    /// 참조 자산의 가격을 신호 준비 기간부터 조회합니다.
    ///
    /// 데이터가 없는 자산은 빈 시계열로 두고 경고를 남깁니다.
    fn load_series(
        &self,
        request: &BacktestRequest,
        warnings: &mut Vec<SimulationWarning>,
    ) -> Result<BTreeMap<String, PriceSeries>> {
        let data_start = request.strategy.data_start(request.start_date);
        let mut series = BTreeMap::new();

        for asset_id in request.strategy.referenced_assets() {
            let prices = match self.prices.get_prices(&asset_id, data_start, request.end_date) {
                Ok(prices) => prices,
                Err(e) if e.is_missing() => PriceSeries::default(),
                Err(e) => return Err(e.into()),
            };
            if prices.between(request.start_date, request.end_date).is_empty() {
                warnings.push(SimulationWarning::MissingSeries {
                    asset_id: asset_id.clone(),
                });
            }
            debug!(asset = %asset_id, points = prices.len(), "가격 데이터 로드");
            series.insert(asset_id, prices);
        }

        Ok(series)
    }
}

/// 가격 Provider를 벤치마크 Provider로 사용하는 어댑터.
struct PriceBenchmarks<'a>(&'a dyn PriceSeriesProvider);

impl BenchmarkProvider for PriceBenchmarks<'_> {
    fn get_benchmark(
        &self,
        benchmark_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> trader_data::Result<PriceSeries> {
        self.0.get_prices(benchmark_id, start, end)
    }
}

/// [start, end] 구간에서 한 자산이라도 가격이 있는 날짜의 합집합.
fn simulation_dates(
    series: &BTreeMap<String, PriceSeries>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    series
        .values()
        .flat_map(|s| s.between(start, end).iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 한 번의 실행이 단독으로 소유하는 시뮬레이션 상태.
struct SimulationLoop<'a> {
    phase: SimulationPhase,
    config: &'a BacktestConfig,
    series: &'a BTreeMap<String, PriceSeries>,
    fundamentals: Option<&'a dyn FundamentalProvider>,
    signal: Box<dyn SignalEngine>,
    state: PortfolioState,
    ledger: TransactionLedger,
    history: Vec<ValuePoint>,
    cash_flows: VecDeque<ScheduledCashFlow>,
    /// 가격 미관측 경고를 이미 남긴 자산
    unpriced: BTreeSet<String>,
    debug_log: Option<Vec<String>>,
}

impl<'a> SimulationLoop<'a> {
    fn new(
        config: &'a BacktestConfig,
        series: &'a BTreeMap<String, PriceSeries>,
        fundamentals: Option<&'a dyn FundamentalProvider>,
        signal: Box<dyn SignalEngine>,
        state: PortfolioState,
        debug: bool,
    ) -> Self {
        let mut cash_flows = config.cash_flows.clone();
        cash_flows.sort_by_key(|f| f.date);

        Self {
            phase: SimulationPhase::Initializing,
            config,
            series,
            fundamentals,
            signal,
            state,
            ledger: TransactionLedger::new(),
            history: Vec::new(),
            cash_flows: cash_flows.into(),
            unpriced: BTreeSet::new(),
            debug_log: debug.then(Vec::new),
        }
    }

    fn transition(&mut self, next: SimulationPhase) {
        debug!(from = ?self.phase, to = ?next, "시뮬레이션 단계 전환");
        self.phase = next;
    }

    fn log(&mut self, line: String) {
        if let Some(log) = self.debug_log.as_mut() {
            log.push(line);
        }
    }

    fn warn(&mut self, warning: SimulationWarning) {
        warn!(%warning, "시뮬레이션 경고");
        self.log(warning.to_string());
    }

    /// 하루를 진행합니다: 시가 평가 → 현금 흐름 → 신호 → 체결 → 평가액 기록.
    fn step(&mut self, date: NaiveDate) -> Result<()> {
        self.state.set_date(date);
        self.mark_to_market(date);
        self.apply_cash_flows(date);

        let current_weights = self.state.current_weights();
        let ctx = SignalContext {
            date,
            market: MarketView::new(date, self.series),
            current_weights: &current_weights,
            fundamentals: self.fundamentals,
        };

        let outcome = self.signal.evaluate(&ctx);
        for note in self.signal.drain_notes() {
            self.log(note);
        }
        if let Some(signal) = outcome? {
            debug!(%date, reason = %signal.reason, "의사결정일");
            let line = format!("[{}] {}: {}", date, self.signal.name(), signal.reason);
            self.log(line);

            let first_entry = self.ledger.len();
            let warnings =
                OrderExecutor::new(self.config).execute(&mut self.state, &signal.target, &mut self.ledger);
            for warning in warnings {
                self.warn(warning);
            }
            if self.debug_log.is_some() {
                let lines: Vec<String> = self.ledger.entries()[first_entry..]
                    .iter()
                    .map(describe_transaction)
                    .collect();
                for line in lines {
                    self.log(line);
                }
            }
        }

        self.history.push(ValuePoint::new(date, self.state.total_value()));

        if self.phase == SimulationPhase::Initializing {
            self.transition(SimulationPhase::Running);
        }
        Ok(())
    }

    /// 당일 종가로 평가 가격을 갱신합니다. 가격이 없으면 직전 가격을 유지합니다.
    fn mark_to_market(&mut self, date: NaiveDate) {
        let series = self.series;
        for (asset_id, prices) in series {
            if let Some(price) = prices.price_on(date) {
                self.state.mark(asset_id, price);
                continue;
            }
            match prices.last_on_or_before(date) {
                Some(point) => {
                    self.state.mark(asset_id, point.close);
                    if self.state.quantity(asset_id) > Decimal::ZERO {
                        self.warn(SimulationWarning::DataGap {
                            date,
                            asset_id: asset_id.clone(),
                            carried_price: point.close,
                        });
                    }
                }
                None if self.config.asset(asset_id).class.is_cash() => {
                    self.state.mark(asset_id, Decimal::ONE);
                }
                None => {
                    if self.unpriced.insert(asset_id.clone()) {
                        self.warn(SimulationWarning::NoPriceYet {
                            date,
                            asset_id: asset_id.clone(),
                        });
                    }
                }
            }
        }
    }

    /// 오늘까지 도래한 예약 현금 흐름을 반영합니다.
    fn apply_cash_flows(&mut self, date: NaiveDate) {
        while self.cash_flows.front().is_some_and(|f| f.date <= date) {
            let Some(flow) = self.cash_flows.pop_front() else {
                break;
            };
            let recorded = self.ledger.len();
            let warning =
                OrderExecutor::new(self.config).apply_cash_flow(&mut self.state, &flow, &mut self.ledger);
            let line = self.ledger.entries()[recorded..].first().map(describe_transaction);
            if let Some(line) = line {
                self.log(line);
            }
            if let Some(warning) = warning {
                self.warn(warning);
            }
        }
    }

    fn finish(mut self) -> (Vec<ValuePoint>, Vec<SimulatedTransaction>, Option<Vec<String>>) {
        self.transition(SimulationPhase::Finalizing);
        (self.history, self.ledger.into_entries(), self.debug_log)
    }
}

fn describe_transaction(tx: &SimulatedTransaction) -> String {
    format!(
        "[{}] {} {} {} @ {} (수수료 {:.2}, 세금 {:.2}, 현금 {:.2}, 평가액 {:.2})",
        tx.date,
        tx.transaction_type,
        tx.asset_id,
        tx.quantity,
        tx.price,
        tx.fee,
        tx.tax,
        tx.cash_balance,
        tx.portfolio_value
    )
}

/// 기본 비용 설정으로 백테스트를 실행합니다.
pub fn run_backtest(
    strategy: StrategyConfig,
    prices: Arc<dyn PriceSeriesProvider>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    initial_capital: Decimal,
    debug: bool,
) -> Result<BacktestResult> {
    let request =
        BacktestRequest::new(strategy, start_date, end_date, initial_capital).with_debug(debug);
    BacktestEngine::new(BacktestConfig::default(), prices).run(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trader_core::{PricePoint, TransactionType};
    use trader_data::InMemoryPriceProvider;
    use trader_strategy::{BuyAndHoldParams, StrategyParams};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn buy_and_hold(assets: &[&str]) -> StrategyConfig {
        let weights = assets.iter().map(|a| (a.to_string(), Decimal::ONE)).collect();
        StrategyConfig::new("보유", StrategyParams::BuyAndHold(BuyAndHoldParams { weights })).unwrap()
    }

    fn engine(provider: InMemoryPriceProvider) -> BacktestEngine {
        BacktestEngine::new(BacktestConfig::frictionless(), Arc::new(provider))
    }

    #[test]
    fn test_request_validation() {
        let provider = InMemoryPriceProvider::new();
        let request = BacktestRequest::new(buy_and_hold(&["A"]), d(5), d(1), dec!(1000));
        let err = engine(provider).run(&request).unwrap_err();
        assert!(err.is_configuration());

        let request = BacktestRequest::new(buy_and_hold(&["A"]), d(1), d(5), Decimal::ZERO);
        let err = engine(InMemoryPriceProvider::new()).run(&request).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_no_data_is_fatal() {
        let request = BacktestRequest::new(buy_and_hold(&["A"]), d(1), d(5), dec!(1000));
        let err = engine(InMemoryPriceProvider::new()).run(&request).unwrap_err();
        assert!(matches!(err, BacktestError::FatalSimulation(_)));
    }

    #[test]
    fn test_dates_are_union_of_series() {
        let provider = InMemoryPriceProvider::new()
            .with_series("A", vec![PricePoint::new(d(2), dec!(10)), PricePoint::new(d(4), dec!(10))])
            .with_series("B", vec![PricePoint::new(d(3), dec!(20)), PricePoint::new(d(4), dec!(20))]);
        let request = BacktestRequest::new(buy_and_hold(&["A", "B"]), d(1), d(5), dec!(1000));

        let result = engine(provider).run(&request).unwrap();
        let dates: Vec<_> = result.value_history().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2), d(3), d(4)]);
    }

    #[test]
    fn test_unpriced_asset_is_warned_not_fatal() {
        let provider = InMemoryPriceProvider::new()
            .with_series("A", vec![PricePoint::new(d(2), dec!(10)), PricePoint::new(d(3), dec!(11))])
            .with_series("B", vec![PricePoint::new(d(3), dec!(20))]);
        let request =
            BacktestRequest::new(buy_and_hold(&["A", "B"]), d(1), d(5), dec!(1000)).with_debug(true);

        let result = engine(provider).run(&request).unwrap();
        let log = result.debug_log().unwrap();
        assert!(log.iter().any(|l| l.contains("B 관측된 가격 없음")));
        // 첫날 B는 가격이 없어 매수하지 않음
        assert!(result
            .transactions()
            .iter()
            .all(|t| t.asset_id != "B" || t.transaction_type != TransactionType::Buy));
    }

    #[test]
    fn test_cancelled_run_returns_no_result() {
        let provider = InMemoryPriceProvider::new()
            .with_series("A", vec![PricePoint::new(d(2), dec!(10))]);
        let token = CancellationToken::new();
        token.cancel();
        let request = BacktestRequest::new(buy_and_hold(&["A"]), d(1), d(5), dec!(1000));

        let err = engine(provider).with_cancellation(token).run(&request).unwrap_err();
        assert!(matches!(err, BacktestError::Cancelled));
    }

    #[test]
    fn test_debug_log_only_when_enabled() {
        let provider = InMemoryPriceProvider::new()
            .with_series("A", vec![PricePoint::new(d(2), dec!(10))]);
        let request = BacktestRequest::new(buy_and_hold(&["A"]), d(1), d(5), dec!(1000));

        let engine = engine(provider);
        assert!(engine.run(&request).unwrap().debug_log().is_none());
        let result = engine.run(&request.clone().with_debug(true)).unwrap();
        assert!(result.debug_log().unwrap().iter().any(|l| l.contains("BUY A 100")));
    }
}
