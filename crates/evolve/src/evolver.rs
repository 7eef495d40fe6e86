use crate::rules;
use paperfund_core::common::time::TimeProvider;
use paperfund_core::eval::entity::PerformanceMetrics;
use paperfund_core::store::port::ParamHistoryStore;
use paperfund_core::strategy::entity::{ParamRecord, StrategyParams};
use paperfund_core::strategy::error::EvolveError;
use std::sync::Arc;
use tracing::info;

/// # Summary
/// 参数进化器，独占参数历史。持有当前生效的参数集与只追加的历史。
///
/// # Invariants
/// - 每次成功的 `evolve` 都恰好追加一条历史，并把新参数提升为当前参数，即使数值没有变化。
/// - 追加持久化失败时，内存中的当前参数与历史保持不变。
/// - 历史从不删除，展示时只取末尾若干条。
pub struct ParameterEvolver {
    current: StrategyParams,
    history: Vec<ParamRecord>,
    store: Arc<dyn ParamHistoryStore>,
    clock: Arc<dyn TimeProvider>,
}

impl ParameterEvolver {
    /// # Summary
    /// 从历史存储恢复进化器。
    ///
    /// # Logic
    /// 当前参数取历史的最后一条；历史为空 (冷启动) 时使用 `base`。
    pub async fn load(
        store: Arc<dyn ParamHistoryStore>,
        clock: Arc<dyn TimeProvider>,
        base: StrategyParams,
    ) -> Result<Self, EvolveError> {
        let history = store.load_history().await?;
        let current = history.last().map(|r| r.params.clone()).unwrap_or(base);
        info!(entries = history.len(), "Parameter history loaded");

        Ok(Self {
            current,
            history,
            store,
            clock,
        })
    }

    pub fn current(&self) -> &StrategyParams {
        &self.current
    }

    pub fn history(&self) -> &[ParamRecord] {
        &self.history
    }

    /// 最近 `n` 条历史，按时间先后排列。
    pub fn recent(&self, n: usize) -> &[ParamRecord] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// # Summary
    /// 根据一次绩效评估推导新参数，追加到历史并设为当前参数。
    ///
    /// # Returns
    /// * `Err(EvolveError::NonFiniteMetric)` - 指标中含 NaN 或无穷大，此时不追加任何记录。
    pub async fn evolve(&mut self, metrics: &PerformanceMetrics) -> Result<StrategyParams, EvolveError> {
        if let Some((name, value)) = metrics.scalars().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(EvolveError::NonFiniteMetric { name, value });
        }

        let next = rules::adjust(&self.current, metrics);
        let record = ParamRecord {
            timestamp: self.clock.now(),
            params: next.clone(),
        };
        self.store.append(&record).await?;

        info!(
            rsi_oversold = next.rsi_oversold,
            profit_take = %next.profit_take_threshold,
            loss_cut = %next.loss_cut_threshold,
            "Strategy parameters evolved"
        );
        self.history.push(record);
        self.current = next.clone();
        Ok(next)
    }
}
