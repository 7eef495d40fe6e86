use super::entity::{ExecutionOutcome, LedgerSnapshot, SignalIdentity, TradeSignal};
use crate::common::PriceMap;
use crate::eval::entity::UnrealizedPnl;
use crate::store::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

/// # Summary
/// 交易引擎中可能发生的错误。
///
/// # Invariants
/// - "没有匹配信号 / 现金不足 / 没有持仓" 属于业务结果，由 `ExecutionOutcome` 表达，不在此列。
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("信号不合法: {0}")]
    InvalidSignal(String),
    #[error("成交价格必须为正. 标的: {instrument_id}, 价格: {price}")]
    InvalidPrice {
        instrument_id: String,
        price: Decimal,
    },
    #[error("持久化失败: {0}")]
    Store(#[from] StoreError),
}

/// # Summary
/// 交易引擎端口。编排层通过此接口向虚拟账户写入信号、触发成交和读取快照，
/// 它是信号账本与资金持仓的唯一写入者。
///
/// # Invariants
/// - 实现必须把 "账本 + 持仓" 放在同一个互斥边界之后，`execute` 读到的现金和持仓必须来自同一时刻。
/// - 每次成功的写操作之后，账本与持仓作为一个整体持久化。
#[async_trait]
pub trait TradePort: Send + Sync {
    /// 追加一条待执行信号
    ///
    /// # Arguments
    /// * `signal` - 上游产生的信号，成交字段必须为空
    ///
    /// # Returns
    /// * `Err(TradeError::InvalidSignal)` - 输入契约被破坏
    async fn intake(&self, signal: TradeSignal) -> Result<(), TradeError>;

    /// 按顺序追加一批待执行信号，整批只持久化一次
    ///
    /// # Returns
    /// * `Err(_)` - 任一条非法或持久化失败，账本保持原样
    async fn intake_batch(&self, signals: Vec<TradeSignal>) -> Result<(), TradeError>;

    /// 按身份三元组执行第一条匹配的待执行信号
    ///
    /// # Arguments
    /// * `identity` - (日期, 标的, 方向)
    /// * `execution_date` - 成交日期
    /// * `execution_price` - 成交价格，必须大于 0
    async fn execute(
        &self,
        identity: &SignalIdentity,
        execution_date: NaiveDate,
        execution_price: Decimal,
    ) -> Result<ExecutionOutcome, TradeError>;

    /// 当前账户总资产
    async fn valuation(&self, prices: &PriceMap) -> Decimal;

    /// 每个持仓标的的未实现盈亏
    async fn unrealized_pnl(&self, prices: &PriceMap) -> BTreeMap<String, UnrealizedPnl>;

    /// 账本与持仓的一致性只读快照
    async fn snapshot(&self) -> LedgerSnapshot;

    /// 按账本顺序返回尚未成交的信号
    async fn pending_signals(&self) -> Vec<TradeSignal>;
}
