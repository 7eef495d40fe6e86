use crate::common::{PriceMap, SignalType};
use crate::eval::entity::UnrealizedPnl;
use crate::trade::port::TradeError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// 信号的匹配身份三元组 (签发日期, 标的, 方向)。
///
/// # Invariants
/// - 三元组相同的多条信号是有歧义的，引擎总是按账本顺序取第一条待执行的。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalIdentity {
    pub date: NaiveDate,
    pub instrument_id: String,
    pub signal_type: SignalType,
}

impl SignalIdentity {
    pub fn new(date: NaiveDate, instrument_id: impl Into<String>, signal_type: SignalType) -> Self {
        Self {
            date,
            instrument_id: instrument_id.into(),
            signal_type,
        }
    }
}

/// # Summary
/// 一次虚拟成交的事实记录。
///
/// # Invariants
/// - 四个字段总是一起写入，写入后不再修改。
/// - BUY 时 `amount` 为实际花费；SELL 时 `amount` 为卖出所得。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// 成交日期
    pub date: NaiveDate,
    /// 成交价格
    pub price: Decimal,
    /// 成交金额
    pub amount: Decimal,
    /// 成交份额
    pub shares: Decimal,
}

/// # Summary
/// 上游信号生产方给出的一条买卖建议，以及它后续的成交情况。
///
/// # Invariants
/// - `execution` 为 `None` 时该信号处于待执行 (pending) 状态。
/// - `execution` 一旦写入即为只追加的事实，不可回滚或覆盖。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// 信号签发日期
    pub date: NaiveDate,
    /// 标的代码
    pub instrument_id: String,
    /// 标的名称
    pub instrument_name: String,
    /// 方向
    pub signal_type: SignalType,
    /// 信号强度，习惯上落在 0-3
    pub signal_score: f64,
    /// 签发时的参考价格
    pub quoted_price: Decimal,
    /// 建议买入金额 (SELL 时忽略)
    pub suggested_amount: Decimal,
    /// 信号原因
    pub reason: String,
    /// 成交记录
    pub execution: Option<Execution>,
}

impl TradeSignal {
    /// # Logic
    /// 创建一条全新的待执行信号。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        instrument_id: impl Into<String>,
        instrument_name: impl Into<String>,
        signal_type: SignalType,
        signal_score: f64,
        quoted_price: Decimal,
        suggested_amount: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            date,
            instrument_id: instrument_id.into(),
            instrument_name: instrument_name.into(),
            signal_type,
            signal_score,
            quoted_price,
            suggested_amount,
            reason: reason.into(),
            execution: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.execution.is_none()
    }

    pub fn identity(&self) -> SignalIdentity {
        SignalIdentity::new(self.date, self.instrument_id.clone(), self.signal_type)
    }

    pub fn matches(&self, identity: &SignalIdentity) -> bool {
        self.date == identity.date
            && self.signal_type == identity.signal_type
            && self.instrument_id == identity.instrument_id
    }

    /// # Logic
    /// 入账前的输入契约检查，拒绝会污染账本的数据。
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.instrument_id.trim().is_empty() {
            return Err(TradeError::InvalidSignal("instrument_id 不能为空".into()));
        }
        if !self.signal_score.is_finite() {
            return Err(TradeError::InvalidSignal(format!(
                "{} 的 signal_score 不是有限数值: {}",
                self.instrument_id, self.signal_score
            )));
        }
        if self.quoted_price < Decimal::ZERO {
            return Err(TradeError::InvalidSignal(format!(
                "{} 的 quoted_price 为负: {}",
                self.instrument_id, self.quoted_price
            )));
        }
        if self.suggested_amount < Decimal::ZERO {
            return Err(TradeError::InvalidSignal(format!(
                "{} 的 suggested_amount 为负: {}",
                self.instrument_id, self.suggested_amount
            )));
        }
        Ok(())
    }
}

/// # Summary
/// 虚拟账户的资金与持仓快照。由成交流水确定性地推导而来。
///
/// # Invariants
/// - `cash` 在任何操作之后都不为负 (买入花费被钳制在可用现金之内)。
/// - `holdings` 中不存在份额为 0 或负数的条目，清仓即删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// 初始资金
    pub initial_cash: Decimal,
    /// 当前现金
    pub cash: Decimal,
    /// 标的 -> 份额
    pub holdings: BTreeMap<String, Decimal>,
}

impl Portfolio {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            holdings: BTreeMap::new(),
        }
    }

    /// # Logic
    /// 总资产 = 现金 + Σ 份额 × 价格。没有报价的标的按 0 计入 (已知的近似处理)。
    /// 超出 `Decimal` 表示范围时饱和到 `Decimal::MAX`。
    pub fn valuation(&self, prices: &PriceMap) -> Decimal {
        self.holdings
            .iter()
            .map(|(code, shares)| {
                shares.saturating_mul(prices.get(code).copied().unwrap_or(Decimal::ZERO))
            })
            .fold(self.cash, Decimal::saturating_add)
    }

    /// 检查快照是否满足不变量，用于加载持久化状态时识别损坏数据。
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.cash < Decimal::ZERO {
            return Err(format!("cash is negative: {}", self.cash));
        }
        if let Some((code, shares)) = self.holdings.iter().find(|(_, s)| **s <= Decimal::ZERO) {
            return Err(format!("holding {} has non-positive shares: {}", code, shares));
        }
        Ok(())
    }
}

/// # Summary
/// 信号账本与资金持仓的组合快照，是持久化和评估的基本单位。
///
/// # Invariants
/// - 两者总是成对保存，保证加载后的一致性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub signals: Vec<TradeSignal>,
    pub portfolio: Portfolio,
}

impl LedgerSnapshot {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            signals: Vec::new(),
            portfolio: Portfolio::new(initial_cash),
        }
    }

    pub fn executed(&self) -> impl Iterator<Item = &TradeSignal> {
        self.signals.iter().filter(|s| !s.is_pending())
    }

    /// # Logic
    /// 每个标的的成本价取账本中**第一笔**已成交 BUY 的成交价，而非加权均价。
    pub fn cost_basis(&self) -> BTreeMap<String, Decimal> {
        let mut basis = BTreeMap::new();
        for s in self.signals.iter().filter(|s| s.signal_type == SignalType::Buy) {
            if let Some(exec) = &s.execution {
                basis.entry(s.instrument_id.clone()).or_insert(exec.price);
            }
        }
        basis
    }

    /// # Logic
    /// 1. 取首笔成交价作为成本价，未知时为 0。
    /// 2. 成本 = 份额 × 成本价 (成本价为 0 时成本记为 0)。
    /// 3. 盈亏 = 当前市值 - 成本；成本为 0 时收益率记为 0。
    pub fn unrealized_pnl(&self, prices: &PriceMap) -> BTreeMap<String, UnrealizedPnl> {
        let basis = self.cost_basis();
        self.portfolio
            .holdings
            .iter()
            .map(|(code, shares)| {
                let cost_price = basis.get(code).copied().unwrap_or(Decimal::ZERO);
                let current_price = prices.get(code).copied().unwrap_or(Decimal::ZERO);
                let total_cost = if cost_price > Decimal::ZERO {
                    shares.saturating_mul(cost_price)
                } else {
                    Decimal::ZERO
                };
                let current_value = shares.saturating_mul(current_price);
                let pnl = current_value.saturating_sub(total_cost);
                let pnl_percent = if total_cost > Decimal::ZERO {
                    pnl.checked_div(total_cost).unwrap_or(if pnl < Decimal::ZERO {
                        Decimal::MIN
                    } else {
                        Decimal::MAX
                    })
                } else {
                    Decimal::ZERO
                };
                (
                    code.clone(),
                    UnrealizedPnl {
                        shares: *shares,
                        cost_price,
                        current_price,
                        total_cost,
                        current_value,
                        pnl,
                        pnl_percent,
                    },
                )
            })
            .collect()
    }

    /// 检查整份快照的不变量。
    pub fn check_invariants(&self) -> Result<(), String> {
        self.portfolio.check_invariants()
    }
}

/// # Summary
/// 一次成功的虚拟成交回报。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub identity: SignalIdentity,
    pub execution: Execution,
}

/// # Summary
/// `execute` 的业务结果。除 `Filled` 之外都代表 "未成交"，不是错误。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// 成交成功
    Filled(Fill),
    /// 没有匹配的待执行信号
    NotFound,
    /// HOLD 信号永远不可执行
    NotExecutable,
    /// 买入时可用现金为 0
    InsufficientCash,
    /// 卖出时没有该标的持仓
    NoHolding,
}

impl ExecutionOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, ExecutionOutcome::Filled(_))
    }
}
