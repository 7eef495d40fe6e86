use paperfund_core::trade::entity::Portfolio;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// # Summary
/// 虚拟账户的资金与持仓状态，只能由交易引擎在互斥锁内修改。
///
/// # Invariants
/// - 现金永远不为负：扣款前由撮合器把花费钳制到可用现金之内。
/// - 持仓份额为 0 的标的会被立即移除，映射中不出现 0。
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    inner: Portfolio,
}

impl PortfolioState {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            inner: Portfolio::new(initial_cash),
        }
    }

    pub fn from_portfolio(portfolio: Portfolio) -> Self {
        Self { inner: portfolio }
    }

    pub fn cash(&self) -> Decimal {
        self.inner.cash
    }

    pub fn initial_cash(&self) -> Decimal {
        self.inner.initial_cash
    }

    pub fn holdings(&self) -> &BTreeMap<String, Decimal> {
        &self.inner.holdings
    }

    pub fn shares_of(&self, instrument_id: &str) -> Option<Decimal> {
        self.inner.holdings.get(instrument_id).copied()
    }

    /// # Logic
    /// 买入扣款。超过可用现金的部分按可用现金扣减，并记录告警。
    pub fn spend(&mut self, amount: Decimal) {
        let actual = if amount > self.inner.cash {
            tracing::warn!(
                "扣款 {} 超过可用现金 {}，按可用现金扣减",
                amount,
                self.inner.cash
            );
            self.inner.cash
        } else {
            amount
        };
        self.inner.cash -= actual;
    }

    /// 到账 (卖出所得)。
    pub fn credit(&mut self, amount: Decimal) {
        self.inner.cash = self.inner.cash.saturating_add(amount);
    }

    /// # Logic
    /// 增加某个标的的份额；增加后份额不为正则整体移除该条目。
    pub fn add_shares(&mut self, instrument_id: &str, shares: Decimal) {
        if shares.is_zero() {
            return;
        }
        let entry = self
            .inner
            .holdings
            .entry(instrument_id.to_string())
            .or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(shares);
        if *entry <= Decimal::ZERO {
            self.inner.holdings.remove(instrument_id);
        }
    }

    /// # Logic
    /// 整仓卖出：移除持仓并返回原有份额。没有持仓时返回 `None`。
    pub fn liquidate(&mut self, instrument_id: &str) -> Option<Decimal> {
        self.inner
            .holdings
            .remove(instrument_id)
            .filter(|shares| *shares > Decimal::ZERO)
    }

    /// 获取对外只读的持仓快照。
    pub fn to_portfolio(&self) -> Portfolio {
        self.inner.clone()
    }

    pub fn as_portfolio(&self) -> &Portfolio {
        &self.inner
    }
}
