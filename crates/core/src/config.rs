use crate::strategy::entity::StrategyParams;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub account: AccountConfig,
    pub evaluation: EvaluationConfig,
    /// 首次启动时使用的基础策略参数，只需写出要覆盖默认值的字段
    #[serde(deserialize_with = "overlay_strategy")]
    pub strategy: StrategyParams,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub initial_cash: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// 年化无风险利率，夏普比率按月扣减 `risk_free_rate / 12`
    pub risk_free_rate: f64,
    /// 仪表板展示最近多少次参数演进
    pub history_display_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: String,
    /// EnvFilter 语法，`RUST_LOG` 存在时以其为准
    pub level: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(100000),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            history_display_limit: 5,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

/// 配置文件里的策略参数片段。缺省字段取 `StrategyParams::default()`，
/// 账本历史仍按完整结构严格解析。
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StrategyOverlay {
    rsi_window: Option<u32>,
    rsi_oversold: Option<u32>,
    rsi_overbought: Option<u32>,
    ma_window: Option<u32>,
    buy_score_threshold: Option<f64>,
    sell_threshold: Option<u32>,
    profit_take_threshold: Option<Decimal>,
    loss_cut_threshold: Option<Decimal>,
    dca_loss_threshold: Option<Decimal>,
}

fn overlay_strategy<'de, D>(deserializer: D) -> Result<StrategyParams, D::Error>
where
    D: Deserializer<'de>,
{
    let o = StrategyOverlay::deserialize(deserializer)?;
    let base = StrategyParams::default();
    Ok(StrategyParams {
        rsi_window: o.rsi_window.unwrap_or(base.rsi_window),
        rsi_oversold: o.rsi_oversold.unwrap_or(base.rsi_oversold),
        rsi_overbought: o.rsi_overbought.unwrap_or(base.rsi_overbought),
        ma_window: o.ma_window.unwrap_or(base.ma_window),
        buy_score_threshold: o.buy_score_threshold.unwrap_or(base.buy_score_threshold),
        sell_threshold: o.sell_threshold.unwrap_or(base.sell_threshold),
        profit_take_threshold: o.profit_take_threshold.unwrap_or(base.profit_take_threshold),
        loss_cut_threshold: o.loss_cut_threshold.unwrap_or(base.loss_cut_threshold),
        dca_loss_threshold: o.dca_loss_threshold.unwrap_or(base.dca_loss_threshold),
    })
}
