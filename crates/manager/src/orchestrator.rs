use crate::advice;
use crate::batch::SignalBatch;
use chrono::{DateTime, NaiveDate, Utc};
use paperfund_core::common::PriceMap;
use paperfund_core::common::time::TimeProvider;
use paperfund_core::config::EvaluationConfig;
use paperfund_core::eval::entity::{PerformanceMetrics, UnrealizedPnl};
use paperfund_core::store::error::StoreError;
use paperfund_core::strategy::entity::{ParamRecord, StrategyParams};
use paperfund_core::strategy::error::EvolveError;
use paperfund_core::trade::entity::{ExecutionOutcome, Fill, SignalIdentity};
use paperfund_core::trade::port::{TradeError, TradePort};
use paperfund_eval::evaluator::PerformanceEvaluator;
use paperfund_evolve::evolver::ParameterEvolver;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// # Summary
/// Manager 层的统一错误类型。
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),
    #[error("Evolve error: {0}")]
    Evolve(#[from] EvolveError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// 一次每日周期的输出。
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub metrics: PerformanceMetrics,
    pub new_params: StrategyParams,
    pub recommendation: String,
}

/// 每次周期在内存中留下的评估记录。
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub timestamp: DateTime<Utc>,
    pub metrics: PerformanceMetrics,
    pub new_params: StrategyParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub timestamp: DateTime<Utc>,
    pub metrics: PerformanceMetrics,
    pub current_params: StrategyParams,
    pub unrealized_pnl: BTreeMap<String, UnrealizedPnl>,
    /// 最近若干次参数演进
    pub params_evolution: Vec<ParamRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedSignal {
    pub instrument_id: String,
    pub signal_type: String,
    pub score: f64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub signal_date: NaiveDate,
    pub processed_signals: Vec<ProcessedSignal>,
    pub cycle: CycleSummary,
    pub dashboard: Dashboard,
    pub next_actions: Vec<String>,
}

/// 批量执行中没有成交的信号及原因。
#[derive(Debug, Clone, Serialize)]
pub struct SkippedExecution {
    pub identity: SignalIdentity,
    pub outcome: ExecutionOutcome,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ExecutionReport {
    pub executed: Vec<Fill>,
    pub failed: Vec<SkippedExecution>,
}

/// # Summary
/// 优化编排器，系统的应用服务层门面。
/// 把交易引擎、绩效评估与参数进化组合成一次 "每日周期"，并提供批量入账、批量执行与仪表板。
///
/// # Invariants
/// - 交易端口与进化器均由外部构造后注入，编排器不创建任何全局状态。
/// - 进化器只通过内部 `Mutex` 访问，同一时刻只有一个周期在推进参数。
pub struct OptimizationOrchestrator {
    trade: Arc<dyn TradePort>,
    evaluator: PerformanceEvaluator,
    evolver: Mutex<ParameterEvolver>,
    clock: Arc<dyn TimeProvider>,
    history_display_limit: usize,
    evaluations: Mutex<Vec<EvaluationRecord>>,
}

impl OptimizationOrchestrator {
    /// # Arguments
    /// * `trade` - 交易端口的具体实现。
    /// * `evolver` - 已从历史恢复的参数进化器。
    /// * `clock` - 时间供给器。
    /// * `settings` - 评估配置 (无风险利率、仪表板展示条数)。
    pub fn new(
        trade: Arc<dyn TradePort>,
        evolver: ParameterEvolver,
        clock: Arc<dyn TimeProvider>,
        settings: &EvaluationConfig,
    ) -> Self {
        Self {
            trade,
            evaluator: PerformanceEvaluator::new(settings.risk_free_rate),
            evolver: Mutex::new(evolver),
            clock,
            history_display_limit: settings.history_display_limit,
            evaluations: Mutex::new(Vec::new()),
        }
    }

    /// # Summary
    /// 运行一次每日周期：评估 → 进化 → 结论。
    ///
    /// # Logic
    /// 1. 取交易引擎的当前快照并按价格表评估。
    /// 2. 用评估结果推进参数，进化失败时整个周期失败且不留下评估记录。
    /// 3. 记录评估并生成结论文本。
    pub async fn run_cycle(&self, prices: &PriceMap) -> Result<CycleSummary, ManagerError> {
        let snapshot = self.trade.snapshot().await;
        let metrics = self.evaluator.compute(&snapshot, prices);

        let new_params = self.evolver.lock().await.evolve(&metrics).await?;

        self.evaluations.lock().await.push(EvaluationRecord {
            timestamp: self.clock.now(),
            metrics: metrics.clone(),
            new_params: new_params.clone(),
        });

        let recommendation = advice::recommendation(&metrics);
        info!(
            total_return = metrics.total_return,
            win_rate = metrics.win_rate,
            %recommendation,
            "Daily cycle completed"
        );

        Ok(CycleSummary {
            metrics,
            new_params,
            recommendation,
        })
    }

    /// # Summary
    /// 处理上游的一批信号：全部检查通过后整批入账，再以批次报价运行一次周期。
    ///
    /// # Logic
    /// 1. 批次没有日期时取当天。
    /// 2. 先把所有信号转换并校验，任一条非法则整批拒绝，账本不变。
    /// 3. 整批入账并只持久化一次，失败时账本不变；批次中的正报价组成价格表。
    /// 4. 运行周期并生成仪表板与行动建议。
    pub async fn ingest_batch(&self, batch: &SignalBatch) -> Result<BatchReport, ManagerError> {
        let signal_date = batch.date.unwrap_or_else(|| self.clock.today());

        let signals = batch
            .signals
            .iter()
            .map(|s| s.to_signal(signal_date))
            .collect::<Result<Vec<_>, _>>()?;

        let processed_signals: Vec<ProcessedSignal> = signals
            .iter()
            .map(|signal| ProcessedSignal {
                instrument_id: signal.instrument_id.clone(),
                signal_type: signal.signal_type.to_string(),
                score: signal.signal_score,
                amount: signal.suggested_amount,
            })
            .collect();
        self.trade.intake_batch(signals).await?;
        info!(date = %signal_date, count = processed_signals.len(), "Signal batch ingested");

        let prices = batch.prices();
        let cycle = self.run_cycle(&prices).await?;
        let dashboard = self.dashboard(&prices).await;
        let next_actions = advice::next_actions(&dashboard.metrics);

        Ok(BatchReport {
            signal_date,
            processed_signals,
            cycle,
            dashboard,
            next_actions,
        })
    }

    /// # Summary
    /// 按账本顺序尝试执行所有有报价的待执行信号。
    ///
    /// # Logic
    /// 1. HOLD 信号与没有正报价的标的被跳过，不进入结果。
    /// 2. 成交的进入 `executed`，未成交的连同原因进入 `failed`。
    pub async fn execute_pending(
        &self,
        prices: &PriceMap,
        execution_date: NaiveDate,
    ) -> Result<ExecutionReport, ManagerError> {
        let mut report = ExecutionReport::default();

        for signal in self.trade.pending_signals().await {
            if !signal.signal_type.is_executable() {
                continue;
            }
            let Some(price) = prices.get(&signal.instrument_id).copied() else {
                continue;
            };
            if price <= Decimal::ZERO {
                warn!(instrument = %signal.instrument_id, %price, "Skipping non-positive price");
                continue;
            }

            let identity = signal.identity();
            match self.trade.execute(&identity, execution_date, price).await? {
                ExecutionOutcome::Filled(fill) => report.executed.push(fill),
                outcome => report.failed.push(SkippedExecution { identity, outcome }),
            }
        }

        info!(
            executed = report.executed.len(),
            failed = report.failed.len(),
            "Pending signals processed"
        );
        Ok(report)
    }

    /// # Summary
    /// 当前状态总览：指标、当前参数、未实现盈亏与最近的参数演进。
    pub async fn dashboard(&self, prices: &PriceMap) -> Dashboard {
        let snapshot = self.trade.snapshot().await;
        let metrics = self.evaluator.compute(&snapshot, prices);
        let evolver = self.evolver.lock().await;

        Dashboard {
            timestamp: self.clock.now(),
            metrics,
            current_params: evolver.current().clone(),
            unrealized_pnl: snapshot.unrealized_pnl(prices),
            params_evolution: evolver.recent(self.history_display_limit).to_vec(),
        }
    }

    pub async fn current_params(&self) -> StrategyParams {
        self.evolver.lock().await.current().clone()
    }

    pub async fn evaluations(&self) -> Vec<EvaluationRecord> {
        self.evaluations.lock().await.clone()
    }
}
