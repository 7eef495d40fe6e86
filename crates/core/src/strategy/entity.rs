use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// # Summary
/// 进化规则允许各参数到达的边界与单步幅度。
pub mod bounds {
    use super::*;

    pub const RSI_OVERSOLD_MIN: u32 = 20;
    pub const RSI_OVERSOLD_MAX: u32 = 40;
    pub const RSI_OVERSOLD_STEP: u32 = 2;

    pub const PROFIT_TAKE_MIN: Decimal = dec!(0.05);
    pub const PROFIT_TAKE_MAX: Decimal = dec!(0.20);
    pub const PROFIT_TAKE_STEP: Decimal = dec!(0.02);

    /// 止损阈值是负的小数，`MIN` 为最宽松的止损
    pub const LOSS_CUT_MIN: Decimal = dec!(-0.25);
    pub const LOSS_CUT_MAX: Decimal = dec!(-0.05);
    pub const LOSS_CUT_STEP: Decimal = dec!(0.05);
}

/// # Summary
/// 策略参数集。字段固定、类型明确，缺字段或未知字段在反序列化时直接报错。
///
/// # Invariants
/// - 同一时刻只有一组 "当前" 参数生效。
/// - 进化只改动 `rsi_oversold`、`profit_take_threshold`、`loss_cut_threshold`，其余字段原样透传。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyParams {
    // RSI 周期
    pub rsi_window: u32,
    // RSI 超卖点
    pub rsi_oversold: u32,
    // RSI 超买点
    pub rsi_overbought: u32,
    // 均线周期
    pub ma_window: u32,
    // 买入评分门槛
    pub buy_score_threshold: f64,
    // 卖出 RSI 阈值
    pub sell_threshold: u32,
    // 止盈比例
    pub profit_take_threshold: Decimal,
    // 止损比例 (负数)
    pub loss_cut_threshold: Decimal,
    // 补仓亏损比例 (负数)
    pub dca_loss_threshold: Decimal,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            rsi_oversold: 30,
            rsi_overbought: 75,
            ma_window: 20,
            buy_score_threshold: 1.0,
            sell_threshold: 70,
            profit_take_threshold: dec!(0.10),
            loss_cut_threshold: dec!(-0.15),
            dca_loss_threshold: dec!(-0.10),
        }
    }
}

/// # Summary
/// 参数演进历史中的一条记录。历史只追加，永不删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRecord {
    pub timestamp: DateTime<Utc>,
    pub params: StrategyParams,
}
