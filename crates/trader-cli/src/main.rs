//! 전략 백테스트 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 60/40 자산배분 백테스트 (미국 시장 비용)
//! trader backtest -s strategies/60_40.toml -m US -f 2020-01-01 -t 2023-12-31
//!
//! # 한국 시장, 코스피 벤치마크, 결과 JSON 저장
//! trader backtest -s strategies/momentum.toml -m KR -f 2022-01-01 -t 2024-12-31 \
//!     --benchmark KOSPI -o results/momentum.json
//!
//! # 전략 목록 보기
//! trader strategies
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use trader_core::{init_logging, AppConfig};

use trader_cli::commands::backtest::{parse_date, run_backtest, BacktestCliConfig, Market};
use trader_cli::commands::strategies::print_available_strategies;

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Strategy backtesting CLI - 일별 종가 기반 전략 시뮬레이터", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 전략 백테스트 실행
    Backtest {
        /// 전략 설정 파일 경로 (TOML 또는 JSON)
        #[arg(short, long)]
        strategy: PathBuf,

        /// 가격 CSV 디렉토리 (기본: 설정 파일의 backtest.data_dir)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// 시장 유형 (KR: 한국, US: 미국). 생략 시 설정 파일의 비용 사용
        #[arg(short, long)]
        market: Option<String>,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long)]
        to: String,

        /// 초기 자본금 (기본: 설정 파일의 backtest.initial_capital)
        #[arg(short, long)]
        capital: Option<String>,

        /// 비교용 벤치마크 (여러 번 지정 가능)
        #[arg(short, long)]
        benchmark: Vec<String>,

        /// 거래별 디버그 로그 출력
        #[arg(long)]
        debug: bool,

        /// 결과 저장 경로 (.json: 전체 결과, 그 외: 요약)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 사용 가능한 전략 목록
    Strategies,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config)?;

    // 트레이싱 초기화
    init_logging(app_config.logging.to_log_config().overridden_by_env())?;

    match cli.command {
        Commands::Backtest {
            strategy,
            data_dir,
            market,
            from,
            to,
            capital,
            benchmark,
            debug,
            output,
        } => {
            let market = market
                .map(|m| {
                    Market::from_str(&m)
                        .ok_or_else(|| format!("Invalid market: {}. Supported: KR, US", m))
                })
                .transpose()?;

            let start_date = parse_date(&from)?;
            let end_date = parse_date(&to)?;

            let initial_capital = match capital {
                Some(capital) => capital
                    .parse::<rust_decimal::Decimal>()
                    .map_err(|_| format!("Invalid capital: {}", capital))?,
                None => app_config.backtest.initial_capital,
            };

            let backtest_config = BacktestCliConfig {
                strategy_path: strategy.clone(),
                data_dir: data_dir.unwrap_or_else(|| app_config.backtest.data_dir.clone()),
                market,
                start_date,
                end_date,
                initial_capital,
                benchmarks: benchmark,
                debug,
                output_path: output.clone(),
            };

            println!("\n📊 백테스트 실행 중...");
            println!("전략 설정: {}", strategy.display());
            println!("데이터: {}", backtest_config.data_dir.display());
            if let Some(market) = market {
                println!("시장: {:?}", market);
            }
            println!("기간: {} ~ {}", start_date, end_date);
            println!("초기 자본: {}", initial_capital);

            match run_backtest(backtest_config, &app_config.backtest).await {
                Ok(result) => {
                    info!(
                        trades = result.trade_count(),
                        "✅ Backtest completed successfully"
                    );
                    if let Some(out) = output {
                        println!("\n📁 결과 저장됨: {}", out.display());
                    }
                }
                Err(e) => {
                    error!("Backtest failed: {:#}", e);
                    return Err(e.into());
                }
            }
        }

        Commands::Strategies => {
            print_available_strategies();
        }
    }

    Ok(())
}
