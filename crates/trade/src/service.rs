use crate::matcher::FillEngine;
use crate::portfolio::PortfolioState;
use async_trait::async_trait;
use chrono::NaiveDate;
use paperfund_core::common::{PriceMap, SignalType};
use paperfund_core::eval::entity::UnrealizedPnl;
use paperfund_core::store::port::LedgerStore;
use paperfund_core::trade::entity::{
    ExecutionOutcome, Fill, LedgerSnapshot, SignalIdentity, TradeSignal,
};
use paperfund_core::trade::port::{TradeError, TradePort};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 互斥锁保护的账本 + 持仓对。
#[derive(Debug, Clone)]
struct Book {
    signals: Vec<TradeSignal>,
    portfolio: PortfolioState,
}

impl Book {
    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            signals: self.signals.clone(),
            portfolio: self.portfolio.to_portfolio(),
        }
    }
}

/// # Summary
/// `TradingEngine` 是纸面账户的唯一写入者，实现了 `TradePort`。
/// 信号入账与信号成交是仅有的两个写操作，每次成功写入后把账本与持仓整体交给 `LedgerStore`。
///
/// # Invariants
/// - 账本与持仓处于同一把 `Mutex` 之后，任何写操作都在持锁期间完成。
/// - 写操作先在副本上计算并持久化，成功后才替换内存状态；持久化失败时内存保持原样。
pub struct TradingEngine {
    book: Mutex<Book>,
    store: Arc<dyn LedgerStore>,
    matcher: FillEngine,
}

impl TradingEngine {
    /// # Summary
    /// 从持久化存储恢复引擎；冷启动时以 `initial_cash` 开户。
    ///
    /// # Logic
    /// 1. 通过 `LedgerStore::load` 读取历史快照，损坏的状态直接上报。
    /// 2. 没有历史时创建全新账户。
    /// 3. 历史中的初始资金与配置不一致时以历史为准并告警。
    pub async fn open(store: Arc<dyn LedgerStore>, initial_cash: Decimal) -> Result<Self, TradeError> {
        let book = match store.load().await? {
            Some(snapshot) => {
                if snapshot.portfolio.initial_cash != initial_cash {
                    warn!(
                        "持久化账户的初始资金 {} 与配置 {} 不一致，沿用持久化值",
                        snapshot.portfolio.initial_cash, initial_cash
                    );
                }
                info!(
                    signals = snapshot.signals.len(),
                    cash = %snapshot.portfolio.cash,
                    "Ledger restored from store"
                );
                Book {
                    signals: snapshot.signals,
                    portfolio: PortfolioState::from_portfolio(snapshot.portfolio),
                }
            }
            None => {
                info!(%initial_cash, "No prior ledger found, starting a fresh account");
                Book {
                    signals: Vec::new(),
                    portfolio: PortfolioState::new(initial_cash),
                }
            }
        };

        Ok(Self {
            book: Mutex::new(book),
            store,
            matcher: FillEngine::new(),
        })
    }

    pub async fn cash(&self) -> Decimal {
        self.book.lock().await.portfolio.cash()
    }

    pub async fn holdings(&self) -> BTreeMap<String, Decimal> {
        self.book.lock().await.portfolio.holdings().clone()
    }

    pub async fn signals(&self) -> Vec<TradeSignal> {
        self.book.lock().await.signals.clone()
    }

    pub async fn initial_cash(&self) -> Decimal {
        self.book.lock().await.portfolio.initial_cash()
    }
}

#[async_trait]
impl TradePort for TradingEngine {
    async fn intake(&self, signal: TradeSignal) -> Result<(), TradeError> {
        self.intake_batch(vec![signal]).await
    }

    /// # Logic
    /// 1. 先校验整批信号，任一条非法或携带成交记录则整批拒绝。
    /// 2. 在副本上按顺序追加，只保存一次，成功后替换内存状态。
    async fn intake_batch(&self, signals: Vec<TradeSignal>) -> Result<(), TradeError> {
        for signal in &signals {
            signal.validate()?;
            if !signal.is_pending() {
                return Err(TradeError::InvalidSignal(format!(
                    "{} {} 的新信号不能携带成交记录",
                    signal.date, signal.instrument_id
                )));
            }
        }
        if signals.is_empty() {
            return Ok(());
        }

        let mut book = self.book.lock().await;
        let mut next = book.clone();
        for signal in signals {
            info!(
                date = %signal.date,
                instrument = %signal.instrument_id,
                kind = %signal.signal_type,
                amount = %signal.suggested_amount,
                "Signal received"
            );
            next.signals.push(signal);
        }

        self.store.save(&next.snapshot()).await?;
        *book = next;
        Ok(())
    }

    /// # Logic
    /// 1. 成交价不为正视为调用方违约，直接返回错误。
    /// 2. HOLD 永远不可执行。
    /// 3. 按账本顺序定位第一条匹配且待执行的信号。
    /// 4. BUY 钳制花费后买入；SELL 整仓卖出。
    /// 5. 写入成交字段并持久化，成功后替换内存状态。
    async fn execute(
        &self,
        identity: &SignalIdentity,
        execution_date: NaiveDate,
        execution_price: Decimal,
    ) -> Result<ExecutionOutcome, TradeError> {
        if execution_price <= Decimal::ZERO {
            return Err(TradeError::InvalidPrice {
                instrument_id: identity.instrument_id.clone(),
                price: execution_price,
            });
        }
        if !identity.signal_type.is_executable() {
            return Ok(ExecutionOutcome::NotExecutable);
        }

        let mut book = self.book.lock().await;
        let Some(idx) = book
            .signals
            .iter()
            .position(|s| s.is_pending() && s.matches(identity))
        else {
            warn!(
                date = %identity.date,
                instrument = %identity.instrument_id,
                kind = %identity.signal_type,
                "No pending signal matches"
            );
            return Ok(ExecutionOutcome::NotFound);
        };

        let mut next = book.clone();
        let signal = next.signals[idx].clone();
        let filled = match signal.signal_type {
            SignalType::Buy => {
                self.matcher
                    .fill_buy(&mut next.portfolio, &signal, execution_date, execution_price)?
            }
            SignalType::Sell => {
                self.matcher
                    .fill_sell(&mut next.portfolio, &signal, execution_date, execution_price)?
            }
            SignalType::Hold => return Ok(ExecutionOutcome::NotExecutable),
        };

        let Some(execution) = filled else {
            let outcome = match signal.signal_type {
                SignalType::Buy => ExecutionOutcome::InsufficientCash,
                _ => ExecutionOutcome::NoHolding,
            };
            warn!(instrument = %signal.instrument_id, ?outcome, "Signal not executed");
            return Ok(outcome);
        };

        next.signals[idx].execution = Some(execution.clone());
        self.store.save(&next.snapshot()).await?;
        *book = next;

        info!(
            instrument = %identity.instrument_id,
            kind = %identity.signal_type,
            price = %execution.price,
            amount = %execution.amount,
            shares = %execution.shares,
            cash = %book.portfolio.cash(),
            "Signal executed"
        );

        Ok(ExecutionOutcome::Filled(Fill {
            identity: identity.clone(),
            execution,
        }))
    }

    async fn valuation(&self, prices: &PriceMap) -> Decimal {
        self.book.lock().await.portfolio.as_portfolio().valuation(prices)
    }

    async fn unrealized_pnl(&self, prices: &PriceMap) -> BTreeMap<String, UnrealizedPnl> {
        self.book.lock().await.snapshot().unrealized_pnl(prices)
    }

    async fn snapshot(&self) -> LedgerSnapshot {
        self.book.lock().await.snapshot()
    }

    async fn pending_signals(&self) -> Vec<TradeSignal> {
        self.book
            .lock()
            .await
            .signals
            .iter()
            .filter(|s| s.is_pending())
            .cloned()
            .collect()
    }
}
