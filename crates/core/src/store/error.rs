use thiserror::Error;

/// # Summary
/// 存储层错误枚举，区分 "底层读写失败" 与 "持久化状态已损坏"。
///
/// # Invariants
/// - "没有历史状态" (冷启动) 不是错误，由 `Ok(None)` / 空列表表达。
/// - `Corrupt` 应在启动时作为致命错误上报，而不是被当作空状态吞掉。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 数据库操作失败
    #[error("Database error: {0}")]
    Database(String),
    /// 已持久化的数据无法解析或违反不变量
    #[error("Corrupt state: {0}")]
    Corrupt(String),
    /// 初始化存储失败
    #[error("Initialization error: {0}")]
    InitError(String),
}
