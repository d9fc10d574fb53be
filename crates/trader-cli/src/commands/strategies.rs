//! 전략 목록 명령어.

use trader_strategy::StrategyType;

/// 사용 가능한 전략과 파라미터를 문자열로 만듭니다.
pub fn render_available_strategies() -> String {
    let mut out = String::new();
    out.push_str("\n📋 사용 가능한 전략 목록:\n");
    out.push_str("═══════════════════════════════════════════════════════════════\n");

    for strategy_type in StrategyType::ALL {
        out.push('\n');
        out.push_str(&format!(
            "  {:<26} | {}\n",
            strategy_type.as_str(),
            strategy_type.description()
        ));
        out.push_str("  ─────────────────────────────────────────────────────────────\n");
        for (name, help) in strategy_type.parameters() {
            out.push_str(&format!("    {:<24} {}\n", name, help));
        }
    }

    out.push('\n');
    out.push_str("═══════════════════════════════════════════════════════════════\n");
    out.push('\n');
    out.push_str("예시 설정 파일 (strategies/momentum.toml):\n");
    out.push_str("  [strategy]\n");
    out.push_str("  name = \"Dual Momentum\"\n");
    out.push_str("  strategy_type = \"momentum\"\n");
    out.push_str("  \n");
    out.push_str("  [strategy.parameters]\n");
    out.push_str("  asset_pool = [\"SPY\", \"EFA\", \"AGG\"]\n");
    out.push_str("  lookback_months = 12\n");
    out.push_str("  top_n = 1\n");
    out
}

/// 사용 가능한 전략 목록 출력
pub fn print_available_strategies() {
    println!("{}", render_available_strategies());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_strategy_type() {
        let rendered = render_available_strategies();
        for strategy_type in StrategyType::ALL {
            assert!(rendered.contains(strategy_type.as_str()));
            for (name, _) in strategy_type.parameters() {
                assert!(rendered.contains(name));
            }
        }
    }
}
