use crate::pool::{connect, db_err};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperfund_core::store::error::StoreError;
use paperfund_core::store::port::ParamHistoryStore;
use paperfund_core::strategy::entity::{ParamRecord, StrategyParams};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

const PARAMS_DB: &str = "params.db";

/// # Summary
/// `ParamHistoryStore` 的 SQLite 实现。每条记录以 JSON 文本保存参数集，只追加。
///
/// # Invariants
/// * 自增主键即追加顺序。
/// * 时间戳以 RFC 3339 文本保存。
pub struct SqliteParamStore {
    pool: SqlitePool,
}

impl SqliteParamStore {
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let pool = connect(&data_dir.join(PARAMS_DB)).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS param_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at TEXT NOT NULL,
                params TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!("Parameter history database ready at {}", data_dir.join(PARAMS_DB).display());
        Ok(Self { pool })
    }
}

#[async_trait]
impl ParamHistoryStore for SqliteParamStore {
    async fn load_history(&self) -> Result<Vec<ParamRecord>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT recorded_at, params FROM param_history ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        rows.into_iter()
            .map(|(recorded_at, params)| {
                let timestamp = DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| {
                        StoreError::Corrupt(format!("bad timestamp {}: {}", recorded_at, e))
                    })?
                    .with_timezone(&Utc);
                let params: StrategyParams = serde_json::from_str(&params)
                    .map_err(|e| StoreError::Corrupt(format!("bad params json: {}", e)))?;
                Ok(ParamRecord { timestamp, params })
            })
            .collect()
    }

    async fn append(&self, record: &ParamRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(&record.params)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query("INSERT INTO param_history (recorded_at, params) VALUES (?, ?)")
            .bind(record.timestamp.to_rfc3339())
            .bind(json)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
