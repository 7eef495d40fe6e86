use crate::pool::{connect, db_err};
use async_trait::async_trait;
use chrono::NaiveDate;
use paperfund_core::common::SignalType;
use paperfund_core::store::error::StoreError;
use paperfund_core::store::port::LedgerStore;
use paperfund_core::trade::entity::{Execution, LedgerSnapshot, Portfolio, TradeSignal};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const LEDGER_DB: &str = "ledger.db";

/// # Summary
/// `LedgerStore` 的 SQLite 实现。信号账本、资金与持仓存放在同一个数据库文件中，
/// 每次保存都在一个事务内整体覆盖，从而保证两者永远成对落盘。
///
/// # Invariants
/// * `signals.seq` 即账本顺序，加载时按 `seq` 升序还原。
/// * `portfolio` 表只有一行 (`id = 'MAIN'`)。
/// * 金额与份额以 TEXT 保存 `Decimal` 的十进制字符串，避免浮点误差。
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SignalRow {
    date: String,
    instrument_id: String,
    instrument_name: String,
    signal_type: String,
    signal_score: f64,
    quoted_price: String,
    suggested_amount: String,
    reason: String,
    execution_date: Option<String>,
    execution_price: Option<String>,
    execution_amount: Option<String>,
    execution_shares: Option<String>,
}

impl SqliteLedgerStore {
    /// # Summary
    /// 在 `data_dir` 下打开账本数据库并初始化表结构。
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let pool = connect(&data_dir.join(LEDGER_DB)).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signals (
                seq INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                instrument_id TEXT NOT NULL,
                instrument_name TEXT NOT NULL,
                signal_type TEXT NOT NULL,
                signal_score REAL NOT NULL,
                quoted_price TEXT NOT NULL,
                suggested_amount TEXT NOT NULL,
                reason TEXT NOT NULL,
                execution_date TEXT,
                execution_price TEXT,
                execution_amount TEXT,
                execution_shares TEXT
            );

            CREATE TABLE IF NOT EXISTS portfolio (
                id TEXT PRIMARY KEY,
                initial_cash TEXT NOT NULL,
                cash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS holdings (
                instrument_id TEXT PRIMARY KEY,
                shares TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!("Ledger database ready at {}", data_dir.join(LEDGER_DB).display());
        Ok(Self { pool })
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw)
        .map_err(|e| StoreError::Corrupt(format!("{} is not a decimal ({}): {}", field, raw, e)))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::from_str(raw)
        .map_err(|e| StoreError::Corrupt(format!("{} is not a date ({}): {}", field, raw, e)))
}

impl SignalRow {
    /// # Logic
    /// 成交四元组要么全部存在要么全部缺失，部分存在视为损坏。
    fn into_signal(self) -> Result<TradeSignal, StoreError> {
        let execution = match (
            self.execution_date,
            self.execution_price,
            self.execution_amount,
            self.execution_shares,
        ) {
            (None, None, None, None) => None,
            (Some(date), Some(price), Some(amount), Some(shares)) => Some(Execution {
                date: parse_date("execution_date", &date)?,
                price: parse_decimal("execution_price", &price)?,
                amount: parse_decimal("execution_amount", &amount)?,
                shares: parse_decimal("execution_shares", &shares)?,
            }),
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "partial execution record for {} on {}",
                    self.instrument_id, self.date
                )));
            }
        };

        let signal_type = SignalType::from_str(&self.signal_type).map_err(StoreError::Corrupt)?;

        Ok(TradeSignal {
            date: parse_date("date", &self.date)?,
            instrument_id: self.instrument_id,
            instrument_name: self.instrument_name,
            signal_type,
            signal_score: self.signal_score,
            quoted_price: parse_decimal("quoted_price", &self.quoted_price)?,
            suggested_amount: parse_decimal("suggested_amount", &self.suggested_amount)?,
            reason: self.reason,
            execution,
        })
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    /// # Logic
    /// 1. 读取资金行、持仓与按 `seq` 排序的信号。
    /// 2. 三张表都为空时视为冷启动。
    /// 3. 有信号或持仓却没有资金行、字段无法解析、违反持仓不变量时返回 `Corrupt`。
    async fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        let portfolio_row: Option<(String, String)> =
            sqlx::query_as("SELECT initial_cash, cash FROM portfolio WHERE id = 'MAIN'")
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        let holding_rows: Vec<(String, String)> =
            sqlx::query_as("SELECT instrument_id, shares FROM holdings ORDER BY instrument_id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        let signal_rows: Vec<SignalRow> = sqlx::query_as(
            r#"
            SELECT date, instrument_id, instrument_name, signal_type, signal_score,
                   quoted_price, suggested_amount, reason,
                   execution_date, execution_price, execution_amount, execution_shares
            FROM signals ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let Some((initial_cash, cash)) = portfolio_row else {
            if signal_rows.is_empty() && holding_rows.is_empty() {
                return Ok(None);
            }
            return Err(StoreError::Corrupt(
                "ledger rows exist without a portfolio record".into(),
            ));
        };

        let mut holdings = BTreeMap::new();
        for (code, shares) in holding_rows {
            let shares = parse_decimal("shares", &shares)?;
            holdings.insert(code, shares);
        }

        let snapshot = LedgerSnapshot {
            signals: signal_rows
                .into_iter()
                .map(SignalRow::into_signal)
                .collect::<Result<Vec<_>, _>>()?,
            portfolio: Portfolio {
                initial_cash: parse_decimal("initial_cash", &initial_cash)?,
                cash: parse_decimal("cash", &cash)?,
                holdings,
            },
        };
        snapshot.check_invariants().map_err(StoreError::Corrupt)?;

        debug!(signals = snapshot.signals.len(), "Ledger loaded");
        Ok(Some(snapshot))
    }

    /// # Logic
    /// 在单个事务内清空并重写三张表，任一步失败都整体回滚。
    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM signals").execute(&mut *tx).await.map_err(db_err)?;
        sqlx::query("DELETE FROM holdings").execute(&mut *tx).await.map_err(db_err)?;

        for (seq, s) in (0_i64..).zip(snapshot.signals.iter()) {
            let exec = s.execution.as_ref();
            sqlx::query(
                r#"
                INSERT INTO signals (
                    seq, date, instrument_id, instrument_name, signal_type, signal_score,
                    quoted_price, suggested_amount, reason,
                    execution_date, execution_price, execution_amount, execution_shares
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(seq)
            .bind(s.date.to_string())
            .bind(&s.instrument_id)
            .bind(&s.instrument_name)
            .bind(s.signal_type.to_string())
            .bind(s.signal_score)
            .bind(s.quoted_price.to_string())
            .bind(s.suggested_amount.to_string())
            .bind(&s.reason)
            .bind(exec.map(|e| e.date.to_string()))
            .bind(exec.map(|e| e.price.to_string()))
            .bind(exec.map(|e| e.amount.to_string()))
            .bind(exec.map(|e| e.shares.to_string()))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        for (code, shares) in &snapshot.portfolio.holdings {
            sqlx::query("INSERT INTO holdings (instrument_id, shares) VALUES (?, ?)")
                .bind(code)
                .bind(shares.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        sqlx::query(
            r#"
            INSERT INTO portfolio (id, initial_cash, cash)
            VALUES ('MAIN', ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                initial_cash = excluded.initial_cash,
                cash = excluded.cash
            "#,
        )
        .bind(snapshot.portfolio.initial_cash.to_string())
        .bind(snapshot.portfolio.cash.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        debug!(
            signals = snapshot.signals.len(),
            cash = %snapshot.portfolio.cash,
            "Ledger saved"
        );
        Ok(())
    }
}
