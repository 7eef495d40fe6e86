use super::error::StoreError;
use crate::strategy::entity::ParamRecord;
use crate::trade::entity::LedgerSnapshot;
use async_trait::async_trait;

/// # Summary
/// 信号账本与资金持仓的持久化接口。
///
/// # Invariants
/// - `save` 必须把账本与持仓放在同一个事务边界中写入，要么全部生效要么全部不生效。
/// - `load` 返回的快照必须与最近一次成功的 `save` 完全一致 (信号顺序、成交字段、持仓)。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// # Summary
    /// 加载最近一次保存的账本快照。
    ///
    /// # Returns
    /// * `Ok(None)` - 冷启动，没有任何历史状态。
    /// * `Err(StoreError::Corrupt)` - 历史状态存在但已损坏。
    async fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError>;

    /// # Summary
    /// 原子地保存完整账本与持仓。
    ///
    /// # Arguments
    /// * `snapshot` - 当前引擎内的全部状态。
    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError>;
}

/// # Summary
/// 参数演进历史的持久化接口，只追加。
#[async_trait]
pub trait ParamHistoryStore: Send + Sync {
    /// # Summary
    /// 按追加顺序返回全部历史记录，冷启动时返回空列表。
    async fn load_history(&self) -> Result<Vec<ParamRecord>, StoreError>;

    /// # Summary
    /// 追加一条记录。
    async fn append(&self, record: &ParamRecord) -> Result<(), StoreError>;
}
