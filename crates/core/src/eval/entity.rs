use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// 单个持仓标的的未实现盈亏明细。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrealizedPnl {
    /// 持有份额
    pub shares: Decimal,
    /// 成本价 (首笔买入成交价，未知为 0)
    pub cost_price: Decimal,
    /// 当前价格 (无报价为 0)
    pub current_price: Decimal,
    /// 总成本
    pub total_cost: Decimal,
    /// 当前市值
    pub current_value: Decimal,
    /// 盈亏金额
    pub pnl: Decimal,
    /// 盈亏比例 (成本未知时为 0)
    pub pnl_percent: Decimal,
}

/// # Summary
/// 绩效指标值对象。每次按需重新计算，从不作为权威状态持久化。
///
/// # Invariants
/// - 前置条件不满足 (空账本、分母为 0、样本不足) 时各项指标一律为 0，永远不会是 NaN。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceMetrics {
    /// 累计收益率 (小数)
    pub total_return: f64,
    /// 胜率
    pub win_rate: f64,
    /// 执行率 = 已执行 / 信号总数
    pub execution_rate: f64,
    /// 年化夏普比率 (基于月度收益)
    pub sharpe_ratio: f64,
    /// 最大回撤 (由当前未实现亏损近似)
    pub max_drawdown: f64,
    pub total_signals: usize,
    pub executed_signals: usize,
    pub pending_signals: usize,
    /// 现金 + 持仓市值
    pub total_value: Decimal,
    pub current_cash: Decimal,
    pub current_holdings: BTreeMap<String, Decimal>,
}

impl PerformanceMetrics {
    /// 进化步骤会读取的标量指标，按名称列出以便做有限性检查。
    pub fn scalars(&self) -> [(&'static str, f64); 5] {
        [
            ("total_return", self.total_return),
            ("win_rate", self.win_rate),
            ("execution_rate", self.execution_rate),
            ("sharpe_ratio", self.sharpe_ratio),
            ("max_drawdown", self.max_drawdown),
        ]
    }
}
