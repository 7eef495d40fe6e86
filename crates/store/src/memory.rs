use async_trait::async_trait;
use paperfund_core::store::error::StoreError;
use paperfund_core::store::port::{LedgerStore, ParamHistoryStore};
use paperfund_core::strategy::entity::ParamRecord;
use paperfund_core::trade::entity::LedgerSnapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

/// # Summary
/// 基于内存的账本存储，进程退出即丢失。用于测试和不需要落盘的运行。
pub struct MemoryLedgerStore {
    snapshot: Arc<RwLock<Option<LedgerSnapshot>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }
}

/// # Summary
/// 基于内存的参数历史存储。
pub struct MemoryParamStore {
    records: Arc<RwLock<Vec<ParamRecord>>>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryParamStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParamHistoryStore for MemoryParamStore {
    async fn load_history(&self) -> Result<Vec<ParamRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: &ParamRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
