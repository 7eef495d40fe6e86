use paperfund_core::eval::entity::PerformanceMetrics;
use paperfund_core::strategy::entity::{StrategyParams, bounds};

/// 胜率高于此值时放宽超卖阈值 (更少的买点)
pub const WIN_RATE_HIGH: f64 = 0.6;
/// 胜率低于此值时收紧超卖阈值
pub const WIN_RATE_LOW: f64 = 0.4;
pub const SHARPE_HIGH: f64 = 1.0;
pub const SHARPE_LOW: f64 = 0.5;
pub const DRAWDOWN_SMALL: f64 = 0.05;
pub const DRAWDOWN_LARGE: f64 = 0.20;

/// # Summary
/// 单步参数调整。只改动三个字段，其余字段原样透传。
///
/// # Logic
/// 1. `rsi_oversold`：胜率 > 0.6 时减 2 (不低于 20)；胜率 < 0.4 时加 2 (不高于 40)。
/// 2. `profit_take_threshold`：夏普 > 1.0 时加 0.02 (不高于 0.20)；夏普 < 0.5 时减 0.02 (不低于 0.05)。
/// 3. `loss_cut_threshold`：回撤 < 0.05 时加 0.05 收紧 (不高于 -0.05)；回撤 > 0.20 时减 0.05 放宽 (不低于 -0.25)。
///
/// # Arguments
/// * `current` - 当前生效的参数集。
/// * `metrics` - 调用方保证各标量为有限数值。
pub fn adjust(current: &StrategyParams, metrics: &PerformanceMetrics) -> StrategyParams {
    let mut next = current.clone();

    if metrics.win_rate > WIN_RATE_HIGH {
        next.rsi_oversold = current
            .rsi_oversold
            .saturating_sub(bounds::RSI_OVERSOLD_STEP)
            .max(bounds::RSI_OVERSOLD_MIN);
    } else if metrics.win_rate < WIN_RATE_LOW {
        next.rsi_oversold = current
            .rsi_oversold
            .saturating_add(bounds::RSI_OVERSOLD_STEP)
            .min(bounds::RSI_OVERSOLD_MAX);
    }

    if metrics.sharpe_ratio > SHARPE_HIGH {
        next.profit_take_threshold =
            (current.profit_take_threshold + bounds::PROFIT_TAKE_STEP).min(bounds::PROFIT_TAKE_MAX);
    } else if metrics.sharpe_ratio < SHARPE_LOW {
        next.profit_take_threshold =
            (current.profit_take_threshold - bounds::PROFIT_TAKE_STEP).max(bounds::PROFIT_TAKE_MIN);
    }

    if metrics.max_drawdown < DRAWDOWN_SMALL {
        next.loss_cut_threshold =
            (current.loss_cut_threshold + bounds::LOSS_CUT_STEP).min(bounds::LOSS_CUT_MAX);
    } else if metrics.max_drawdown > DRAWDOWN_LARGE {
        next.loss_cut_threshold =
            (current.loss_cut_threshold - bounds::LOSS_CUT_STEP).max(bounds::LOSS_CUT_MIN);
    }

    next
}
