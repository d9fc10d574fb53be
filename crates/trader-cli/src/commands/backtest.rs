//! 백테스트 CLI 명령어.
//!
//! 전략 설정 파일과 CSV 가격 디렉토리로 백테스트를 실행합니다.
//!
//! # 전략 파일 형식 (TOML)
//!
//! ```toml
//! benchmarks = ["KOSPI"]
//!
//! [strategy]
//! name = "60/40"
//! strategy_type = "asset_allocation"
//!
//! [strategy.parameters]
//! rebalancing_frequency = "quarterly"
//!
//! [strategy.parameters.weights]
//! SPY = 0.6
//! TLT = 0.4
//!
//! [[assets]]
//! id = "SPY"
//! class = "us_equity"
//!
//! [[cash_flows]]
//! date = "2024-06-03"
//! type = "deposit"
//! amount = "1000"
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use trader_analytics::{
    BacktestConfig, BacktestEngine, BacktestJob, BacktestRequest, BacktestResult,
    ScheduledCashFlow,
};
use trader_core::{Asset, BacktestDefaults};
use trader_data::{load_fundamentals_dir, CsvPriceProvider};
use trader_strategy::StrategyConfig;

/// 시장 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 한국 시장 (수수료 0.015%, 거래세 0.23%)
    KR,
    /// 미국 시장 (무수수료)
    US,
}

impl Market {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "KR" | "KOREA" => Some(Market::KR),
            "US" | "USA" => Some(Market::US),
            _ => None,
        }
    }

    /// 시장 기본 비용 설정.
    pub fn preset(&self) -> BacktestConfig {
        match self {
            Market::KR => BacktestConfig::korean_market(),
            Market::US => BacktestConfig::us_market(),
        }
    }
}

/// 백테스트 CLI 설정
#[derive(Debug, Clone)]
pub struct BacktestCliConfig {
    /// 전략 설정 파일 경로 (.toml / .json)
    pub strategy_path: PathBuf,
    /// 가격 CSV 디렉토리 (`<dir>/<ASSET>.csv`)
    pub data_dir: PathBuf,
    /// 시장 비용 프리셋. 없으면 설정 파일의 기본값 사용
    pub market: Option<Market>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    /// 추가 벤치마크 자산
    pub benchmarks: Vec<String>,
    /// 거래별 디버그 로그 기록
    pub debug: bool,
    /// 결과 저장 경로 (.json이면 전체 결과, 그 외 요약)
    pub output_path: Option<PathBuf>,
}

/// 전략 설정 파일.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyFile {
    /// 전략 설정
    pub strategy: StrategyConfig,
    /// 자산 정의 (미지정 자산은 미국 주식으로 취급)
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// 예약된 입출금/배당
    #[serde(default)]
    pub cash_flows: Vec<ScheduledCashFlow>,
    /// 비교용 벤치마크
    #[serde(default)]
    pub benchmarks: Vec<String>,
}

/// 전략 설정 파일 로드
pub fn load_strategy_file(path: &Path) -> Result<StrategyFile> {
    if !path.exists() {
        return Err(anyhow!(
            "Strategy config file not found: {}",
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)?;

    let file: StrategyFile = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid strategy file: {}", path.display()))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid strategy file: {}", path.display()))?,
        _ => {
            return Err(anyhow!(
                "Unsupported config format. Use .toml or .json: {}",
                path.display()
            ))
        }
    };

    Ok(file)
}

/// 실행 설정을 조합합니다.
///
/// 시장 프리셋이 있으면 비용은 프리셋을, 없으면 애플리케이션 기본값을 따릅니다.
pub fn build_backtest_config(
    market: Option<Market>,
    defaults: &BacktestDefaults,
    file: &StrategyFile,
    extra_benchmarks: &[String],
) -> Result<BacktestConfig> {
    let mut config = match market {
        Some(market) => market.preset(),
        None => BacktestConfig::default()
            .with_fee_rate(defaults.fee_rate)
            .with_tax_rate(defaults.tax_rate)
            .with_slippage_rate(defaults.slippage_rate),
    };

    for asset in &file.assets {
        config = config.with_asset(asset.clone());
    }
    for flow in &file.cash_flows {
        config = config.with_cash_flow(flow.clone());
    }

    let mut benchmarks: Vec<String> = Vec::new();
    for id in file.benchmarks.iter().chain(extra_benchmarks) {
        if !benchmarks.contains(id) {
            benchmarks.push(id.clone());
        }
    }
    for id in benchmarks {
        config = config.with_benchmark(id);
    }

    config.validate()?;
    Ok(config)
}

/// 백테스트 실행
pub async fn run_backtest(
    cli: BacktestCliConfig,
    defaults: &BacktestDefaults,
) -> Result<Arc<BacktestResult>> {
    let file = load_strategy_file(&cli.strategy_path)?;
    info!(
        strategy = %file.strategy.name,
        strategy_type = %file.strategy.strategy_type(),
        "전략 설정 로드"
    );

    let config = build_backtest_config(cli.market, defaults, &file, &cli.benchmarks)?;
    debug!(
        fee_rate = %config.fee_rate,
        tax_rate = %config.tax_rate,
        slippage_rate = %config.slippage_rate,
        "비용 설정"
    );

    let prices = Arc::new(CsvPriceProvider::new(&cli.data_dir));
    let mut engine = BacktestEngine::new(config, prices.clone()).with_benchmarks(prices);

    if file.strategy.requires_fundamentals() {
        let dir = cli.data_dir.join("fundamentals");
        let fundamentals = load_fundamentals_dir(&dir)
            .with_context(|| format!("Failed to load fundamentals: {}", dir.display()))?;
        if fundamentals.is_empty() {
            warn!(dir = %dir.display(), "펀더멘털 데이터가 없습니다");
        }
        engine = engine.with_fundamentals(Arc::new(fundamentals));
    }

    let request = BacktestRequest::new(
        file.strategy,
        cli.start_date,
        cli.end_date,
        cli.initial_capital,
    )
    .with_debug(cli.debug);

    let job = BacktestJob::spawn(engine, request);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Simulating {} ~ {}...", cli.start_date, cli.end_date));
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut status = job.subscribe();
    tokio::select! {
        _ = status.wait_for(|s| s.is_terminal()) => {}
        _ = tokio::signal::ctrl_c() => {
            warn!(job_id = %job.id(), "중단 요청, 백테스트를 취소합니다");
            job.cancel();
        }
    }

    let outcome = job.wait().await;
    pb.finish_and_clear();
    let result = outcome?;

    println!("\n{}", result.summary());

    if cli.debug {
        if let Some(lines) = result.debug_log() {
            println!("\n🔎 디버그 로그 ({}건)", lines.len());
            for line in lines {
                println!("  {}", line);
            }
        }
    }

    if let Some(output_path) = &cli.output_path {
        save_report(&result, output_path)?;
        info!("Report saved to: {}", output_path.display());
    }

    Ok(result)
}

/// 백테스트 결과를 파일로 저장
pub fn save_report(result: &BacktestResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::to_string_pretty(result)?
    } else {
        // 기본: 텍스트 요약
        result.summary()
    };

    std::fs::write(path, content)?;
    Ok(())
}

/// 날짜 파싱 (YYYY-MM-DD)
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYY-MM-DD", s))
}

// ==================== 테스트 ====================
