use paperfund_core::store::error::StoreError;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use std::path::Path;

/// # Summary
/// 打开 (必要时创建) 指定路径的 SQLite 数据库。
///
/// # Logic
/// 1. 确保父目录存在。
/// 2. 开启 WAL 与 `create_if_missing`，单连接串行写入。
///
/// # Arguments
/// * `db_path` - 数据库文件路径。
///
/// # Returns
/// * 连接池，或 `StoreError::InitError`。
pub async fn connect(db_path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::InitError(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(10));

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))
}

pub(crate) fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
