use chrono::{NaiveDate, TimeZone, Utc};
use paperfund_core::common::SignalType;
use paperfund_core::store::error::StoreError;
use paperfund_core::store::port::{LedgerStore, ParamHistoryStore};
use paperfund_core::strategy::entity::{ParamRecord, StrategyParams};
use paperfund_core::trade::entity::{Execution, LedgerSnapshot, TradeSignal};
use paperfund_store::ledger::SqliteLedgerStore;
use paperfund_store::params::SqliteParamStore;
use paperfund_store::pool::connect;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn sample_snapshot() -> LedgerSnapshot {
    let d1 = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();

    let mut snap = LedgerSnapshot::new(dec!(100000));
    let mut filled = TradeSignal::new(d1, "161725", "白酒指数", SignalType::Buy, 2.5, dec!(1.0), dec!(10000), "RSI 超卖");
    filled.execution = Some(Execution {
        date: d2,
        price: dec!(1.2),
        amount: dec!(10000),
        shares: dec!(10000) / dec!(1.2),
    });
    snap.signals.push(filled);
    snap.signals.push(TradeSignal::new(d2, "110011", "中小盘", SignalType::Hold, 0.3, dec!(2.31), dec!(0), "观望"));
    snap.portfolio.cash = dec!(90000);
    snap.portfolio.holdings.insert("161725".into(), dec!(10000) / dec!(1.2));
    snap
}

#[tokio::test]
async fn test_ledger_cold_start_and_round_trip() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();

    assert!(store.load().await.unwrap().is_none());

    let snap = sample_snapshot();
    store.save(&snap).await.unwrap();
    assert_eq!(store.load().await.unwrap(), Some(snap.clone()));

    // 覆盖保存后不残留旧持仓
    let mut next = snap;
    next.portfolio.holdings.clear();
    next.portfolio.cash = dec!(102500);
    store.save(&next).await.unwrap();
    drop(store);

    let reopened = SqliteLedgerStore::open(tmp.path()).await.unwrap();
    assert_eq!(reopened.load().await.unwrap(), Some(next));
}

#[tokio::test]
async fn test_ledger_without_portfolio_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();

    let pool = connect(&tmp.path().join("ledger.db")).await.unwrap();
    sqlx::query(
        "INSERT INTO signals (seq, date, instrument_id, instrument_name, signal_type, signal_score, quoted_price, suggested_amount, reason) \
         VALUES (0, '2025-04-01', 'X', '', 'BUY', 1.0, '1', '100', '')",
    )
    .execute(&pool)
    .await
    .unwrap();

    assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_partial_execution_record_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();
    store.save(&LedgerSnapshot::new(dec!(1000))).await.unwrap();

    let pool = connect(&tmp.path().join("ledger.db")).await.unwrap();
    sqlx::query(
        "INSERT INTO signals (seq, date, instrument_id, instrument_name, signal_type, signal_score, quoted_price, suggested_amount, reason, execution_price) \
         VALUES (0, '2025-04-01', 'X', '', 'BUY', 1.0, '1', '100', '', '1.1')",
    )
    .execute(&pool)
    .await
    .unwrap();

    assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_unparsable_amount_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();
    store.save(&sample_snapshot()).await.unwrap();

    let pool = connect(&tmp.path().join("ledger.db")).await.unwrap();
    sqlx::query("UPDATE portfolio SET cash = 'lots' WHERE id = 'MAIN'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_zero_share_holding_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();
    store.save(&sample_snapshot()).await.unwrap();

    let pool = connect(&tmp.path().join("ledger.db")).await.unwrap();
    sqlx::query("UPDATE holdings SET shares = '0'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_negative_cash_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteLedgerStore::open(tmp.path()).await.unwrap();
    store.save(&sample_snapshot()).await.unwrap();

    let pool = connect(&tmp.path().join("ledger.db")).await.unwrap();
    sqlx::query("UPDATE portfolio SET cash = '-1' WHERE id = 'MAIN'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_param_history_appends_in_order() {
    let tmp = tempdir().unwrap();
    let store = SqliteParamStore::open(tmp.path()).await.unwrap();
    assert!(store.load_history().await.unwrap().is_empty());

    let first = ParamRecord {
        timestamp: Utc.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap(),
        params: StrategyParams::default(),
    };
    let mut tuned = StrategyParams::default();
    tuned.rsi_oversold = 28;
    tuned.profit_take_threshold = dec!(0.12);
    let second = ParamRecord {
        timestamp: Utc.with_ymd_and_hms(2025, 4, 8, 9, 30, 0).unwrap(),
        params: tuned,
    };

    store.append(&first).await.unwrap();
    store.append(&second).await.unwrap();
    drop(store);

    let reopened = SqliteParamStore::open(tmp.path()).await.unwrap();
    assert_eq!(reopened.load_history().await.unwrap(), vec![first, second]);
}

#[tokio::test]
async fn test_param_history_with_bad_json_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteParamStore::open(tmp.path()).await.unwrap();

    let pool = connect(&tmp.path().join("params.db")).await.unwrap();
    sqlx::query("INSERT INTO param_history (recorded_at, params) VALUES ('2025-04-01T00:00:00+00:00', '{\"rsi_oversld\": 25}')")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(store.load_history().await, Err(StoreError::Corrupt(_))));
}

#[tokio::test]
async fn test_param_history_with_missing_key_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = SqliteParamStore::open(tmp.path()).await.unwrap();

    let pool = connect(&tmp.path().join("params.db")).await.unwrap();
    sqlx::query("INSERT INTO param_history (recorded_at, params) VALUES ('2025-04-01T00:00:00+00:00', '{\"rsi_oversold\": 25}')")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(store.load_history().await, Err(StoreError::Corrupt(_))));
}
