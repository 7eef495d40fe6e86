use paperfund_core::eval::entity::PerformanceMetrics;

const FALLBACK: &str = "继续执行当前策略，保持观察";

/// # Summary
/// 周期结论。对指标做简单的规则判断，多条结论用 " | " 连接。
///
/// # Logic
/// - 胜率 > 0.65 或 < 0.40
/// - 累计收益 > 10% 或 < -10%
/// - 回撤 > 25%
/// 都不触发时给出默认结论。
pub fn recommendation(metrics: &PerformanceMetrics) -> String {
    let mut notes = Vec::new();

    if metrics.win_rate > 0.65 {
        notes.push("胜率良好，可以适度提高投入");
    } else if metrics.win_rate < 0.40 {
        notes.push("胜率偏低，建议调整参数或暂缓买入");
    }

    if metrics.total_return > 0.10 {
        notes.push("累计收益超过 10%，可考虑部分止盈");
    } else if metrics.total_return < -0.10 {
        notes.push("累计亏损超过 10%，需要决定补仓还是止损");
    }

    if metrics.max_drawdown > 0.25 {
        notes.push("回撤超过 25%，风险偏高");
    }

    if notes.is_empty() {
        return FALLBACK.to_string();
    }
    notes.join(" | ")
}

/// # Summary
/// 信号批次处理后的行动建议，阈值与周期结论不同。
pub fn next_actions(metrics: &PerformanceMetrics) -> Vec<String> {
    let mut actions = Vec::new();

    if metrics.win_rate > 0.65 {
        actions.push("策略表现稳定，可以加大投入".to_string());
    } else if metrics.win_rate < 0.40 {
        actions.push("胜率偏低，建议先观望".to_string());
    }

    if metrics.total_return > 0.15 {
        actions.push("累计收益超过 15%，建议分批兑现".to_string());
    } else if metrics.total_return < -0.15 {
        actions.push("累计亏损超过 15%，请重新评估策略".to_string());
    }

    if metrics.execution_rate < 0.5 {
        actions.push("信号执行率偏低，检查可用资金或成交价格来源".to_string());
    }

    if actions.is_empty() {
        actions.push(FALLBACK.to_string());
    }
    actions
}
