use chrono::Datelike;
use paperfund_core::common::{PriceMap, SignalType};
use paperfund_core::eval::entity::PerformanceMetrics;
use paperfund_core::trade::entity::LedgerSnapshot;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use tracing::debug;

const MONTHS_PER_YEAR: f64 = 12.0;

/// # Summary
/// 绩效评估器。不持有任何状态，对账本快照与外部价格表做纯计算。
///
/// # Invariants
/// - 输出的所有比率都是有限数值；任何前置条件不满足时对应指标为 0。
#[derive(Debug, Clone, Copy)]
pub struct PerformanceEvaluator {
    risk_free_rate: f64,
}

impl PerformanceEvaluator {
    /// # Arguments
    /// * `risk_free_rate` - 年化无风险利率，夏普比率按月扣减 `risk_free_rate / 12`。
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// # Summary
    /// 计算一组完整的绩效指标。
    ///
    /// # Logic
    /// 1. 总资产按价格表估值，缺失价格按 0 计。
    /// 2. 胜率的分子只统计成交价优于签发参考价的 BUY，分母是全部已成交信号。
    /// 3. 夏普比率基于签发月份的月度收益。
    /// 4. 最大回撤由当前未实现亏损近似，已实现的亏损不计入。
    pub fn compute(&self, snapshot: &LedgerSnapshot, prices: &PriceMap) -> PerformanceMetrics {
        let portfolio = &snapshot.portfolio;
        let total_value = portfolio.valuation(prices);

        let total_return = if portfolio.initial_cash.is_zero() {
            0.0
        } else {
            ratio(total_value.saturating_sub(portfolio.initial_cash), portfolio.initial_cash)
        };

        let total_signals = snapshot.signals.len();
        let executed_signals = snapshot.executed().count();
        let wins = snapshot
            .executed()
            .filter(|s| s.signal_type == SignalType::Buy)
            .filter(|s| {
                s.execution
                    .as_ref()
                    .is_some_and(|e| s.quoted_price > e.price)
            })
            .count();

        let metrics = PerformanceMetrics {
            total_return,
            win_rate: fraction(wins, executed_signals),
            execution_rate: fraction(executed_signals, total_signals),
            sharpe_ratio: sharpe_ratio(&monthly_returns(snapshot), self.risk_free_rate),
            max_drawdown: max_drawdown(snapshot, prices, total_value),
            total_signals,
            executed_signals,
            pending_signals: total_signals - executed_signals,
            total_value,
            current_cash: portfolio.cash,
            current_holdings: portfolio.holdings.clone(),
        };

        debug!(
            total_return = metrics.total_return,
            win_rate = metrics.win_rate,
            sharpe = metrics.sharpe_ratio,
            drawdown = metrics.max_drawdown,
            "Performance evaluated"
        );
        metrics
    }
}

fn to_ratio(value: Decimal) -> f64 {
    value.to_f64().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// 两个金额之比。商超出 `Decimal` 范围时退回浮点除法，仍不是有限数则记为 0。
fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    match numerator.checked_div(denominator) {
        Some(q) => to_ratio(q),
        None => {
            let q = to_ratio(numerator) / to_ratio(denominator);
            if q.is_finite() { q } else { 0.0 }
        }
    }
}

fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    ratio(Decimal::from(numerator), Decimal::from(denominator))
}

fn sample_len(samples: &[f64]) -> f64 {
    f64::from(u32::try_from(samples.len()).unwrap_or(u32::MAX))
}

#[derive(Default)]
struct MonthBucket {
    buy: Decimal,
    sell: Decimal,
}

/// # Logic
/// 1. 按信号**签发日期**的年月分桶，分别累加已成交 BUY 与 SELL 的成交金额。
/// 2. 只有买入总额为正的月份才产生一个样本：(卖出 - 买入) / 买入。
/// 3. 样本按月份先后排序。
pub(crate) fn monthly_returns(snapshot: &LedgerSnapshot) -> Vec<f64> {
    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    for signal in &snapshot.signals {
        let Some(exec) = &signal.execution else {
            continue;
        };
        let bucket = buckets
            .entry((signal.date.year(), signal.date.month()))
            .or_default();
        match signal.signal_type {
            SignalType::Buy => bucket.buy = bucket.buy.saturating_add(exec.amount),
            SignalType::Sell => bucket.sell = bucket.sell.saturating_add(exec.amount),
            SignalType::Hold => {}
        }
    }

    buckets
        .values()
        .filter(|b| b.buy > Decimal::ZERO)
        .map(|b| ratio(b.sell.saturating_sub(b.buy), b.buy))
        .collect()
}

/// # Logic
/// 超额收益 = 月收益 - 年化无风险利率 / 12；取均值与总体标准差，年化系数 √12。
/// 样本少于 2 个或标准差为 0 时返回 0。
pub(crate) fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = sample_len(returns);
    let excess: Vec<f64> = returns
        .iter()
        .map(|r| r - risk_free_rate / MONTHS_PER_YEAR)
        .collect();
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    let sharpe = mean / std_dev * MONTHS_PER_YEAR.sqrt();
    if sharpe.is_finite() { sharpe } else { 0.0 }
}

/// # Logic
/// 取持仓中最负的未实现盈亏，其绝对值除以当前总资产，结果不小于 0。
/// 这是时点近似，会低估已经卖出兑现的亏损。
pub(crate) fn max_drawdown(snapshot: &LedgerSnapshot, prices: &PriceMap, total_value: Decimal) -> f64 {
    if total_value <= Decimal::ZERO {
        return 0.0;
    }
    let worst_loss = snapshot
        .unrealized_pnl(prices)
        .values()
        .map(|p| p.pnl)
        .fold(Decimal::ZERO, Decimal::min);

    ratio(-worst_loss, total_value).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use paperfund_core::trade::entity::{Execution, TradeSignal};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn executed(
        issued: NaiveDate,
        code: &str,
        kind: SignalType,
        quoted: Decimal,
        price: Decimal,
        amount: Decimal,
    ) -> TradeSignal {
        let mut s = TradeSignal::new(issued, code, "", kind, 1.0, quoted, amount, "");
        s.execution = Some(Execution {
            date: issued,
            price,
            amount,
            shares: amount / price,
        });
        s
    }

    #[test]
    fn test_empty_ledger_yields_all_zero() {
        let snap = LedgerSnapshot::new(dec!(100000));
        let m = PerformanceEvaluator::new(0.03).compute(&snap, &PriceMap::new());
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.execution_rate, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.total_value, dec!(100000));
    }

    #[test]
    fn test_zero_initial_cash_does_not_divide() {
        let snap = LedgerSnapshot::new(Decimal::ZERO);
        let m = PerformanceEvaluator::new(0.03).compute(&snap, &PriceMap::new());
        assert_eq!(m.total_return, 0.0);
    }

    #[test]
    fn test_win_rate_compares_fill_to_quoted_price() {
        let mut snap = LedgerSnapshot::new(dec!(1000));
        // 成交价低于参考价：算赢
        snap.signals.push(executed(date(1, 2), "A", SignalType::Buy, dec!(1.1), dec!(1.0), dec!(100)));
        // 成交价高于参考价：不算
        snap.signals.push(executed(date(1, 3), "B", SignalType::Buy, dec!(1.0), dec!(1.2), dec!(100)));
        // SELL 只进分母
        snap.signals.push(executed(date(1, 4), "A", SignalType::Sell, dec!(2.0), dec!(1.0), dec!(100)));
        // 待执行只进执行率分母
        snap.signals.push(TradeSignal::new(date(1, 5), "C", "", SignalType::Buy, 1.0, dec!(1), dec!(10), ""));

        let m = PerformanceEvaluator::new(0.03).compute(&snap, &PriceMap::new());
        assert!((m.win_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.execution_rate - 0.75).abs() < 1e-12);
        assert_eq!(m.executed_signals, 3);
        assert_eq!(m.pending_signals, 1);
    }

    #[test]
    fn test_total_return_marks_to_market() {
        let mut snap = LedgerSnapshot::new(dec!(1000));
        snap.portfolio.cash = dec!(500);
        snap.portfolio.holdings.insert("A".into(), dec!(100));
        let prices = PriceMap::from([("A".to_string(), dec!(6))]);
        let m = PerformanceEvaluator::new(0.03).compute(&snap, &prices);
        assert_eq!(m.total_value, dec!(1100));
        assert!((m.total_return - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_monthly_returns_bucket_by_issue_month() {
        let mut snap = LedgerSnapshot::new(dec!(10000));
        snap.signals.push(executed(date(1, 5), "A", SignalType::Buy, dec!(1), dec!(1), dec!(1000)));
        snap.signals.push(executed(date(1, 20), "A", SignalType::Sell, dec!(1), dec!(1), dec!(1100)));
        // 只有卖出的月份不产生样本
        snap.signals.push(executed(date(2, 3), "B", SignalType::Sell, dec!(1), dec!(1), dec!(500)));
        snap.signals.push(executed(date(3, 1), "C", SignalType::Buy, dec!(1), dec!(1), dec!(2000)));

        let returns = monthly_returns(&snap);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_needs_two_samples_and_spread() {
        assert_eq!(sharpe_ratio(&[], 0.03), 0.0);
        assert_eq!(sharpe_ratio(&[0.2], 0.03), 0.0);
        assert_eq!(sharpe_ratio(&[0.1, 0.1, 0.1], 0.03), 0.0);

        // 超额收益 [0.0975, -0.0025]：均值 0.0475，总体标准差 0.05
        let sharpe = sharpe_ratio(&[0.1, 0.0], 0.03);
        let expected = 0.0475 / 0.05 * 12f64.sqrt();
        assert!((sharpe - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_uses_worst_unrealized_loss() {
        let mut snap = LedgerSnapshot::new(dec!(1000));
        snap.signals.push(executed(date(1, 1), "A", SignalType::Buy, dec!(2), dec!(2), dec!(200)));
        snap.signals.push(executed(date(1, 1), "B", SignalType::Buy, dec!(1), dec!(1), dec!(100)));
        snap.portfolio.cash = dec!(700);
        snap.portfolio.holdings.insert("A".into(), dec!(100));
        snap.portfolio.holdings.insert("B".into(), dec!(100));

        // A 亏 100，B 赚 50，总资产 700 + 100 + 150 = 950
        let prices = PriceMap::from([("A".to_string(), dec!(1)), ("B".to_string(), dec!(1.5))]);
        let m = PerformanceEvaluator::new(0.03).compute(&snap, &prices);
        assert!((m.max_drawdown - 100.0 / 950.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_are_deterministic_across_months() {
        let mut snap = LedgerSnapshot::new(dec!(10000));
        snap.signals.push(executed(date(1, 6), "A", SignalType::Buy, dec!(1.2), dec!(1.0), dec!(1000)));
        snap.signals.push(executed(date(1, 27), "A", SignalType::Sell, dec!(1.1), dec!(1.3), dec!(650)));
        snap.signals.push(executed(date(2, 3), "B", SignalType::Buy, dec!(2.0), dec!(2.1), dec!(2100)));
        snap.signals.push(executed(date(2, 18), "B", SignalType::Sell, dec!(2.0), dec!(2.4), dec!(1200)));
        snap.signals.push(TradeSignal::new(date(2, 20), "C", "", SignalType::Buy, 0.5, dec!(3), dec!(300), ""));
        snap.portfolio.cash = dec!(8750);
        snap.portfolio.holdings.insert("A".into(), dec!(500));
        snap.portfolio.holdings.insert("B".into(), dec!(500));
        let prices = PriceMap::from([("A".to_string(), dec!(1.25)), ("B".to_string(), dec!(1.9))]);

        let evaluator = PerformanceEvaluator::new(0.03);
        let first = evaluator.compute(&snap, &prices);
        let second = evaluator.compute(&snap, &prices);
        assert_eq!(first, second);
        assert_ne!(first.sharpe_ratio, 0.0);
        assert!(first.max_drawdown > 0.0);
    }

    #[test]
    fn test_huge_positions_keep_metrics_finite() {
        let tiny = Decimal::new(1, 20);
        let mut snap = LedgerSnapshot::new(dec!(100000));
        snap.signals.push(executed(date(1, 2), "X", SignalType::Buy, dec!(1), tiny, dec!(100000)));
        snap.portfolio.cash = Decimal::ZERO;
        snap.portfolio.holdings.insert("X".into(), dec!(100000) / tiny);
        let prices = PriceMap::from([("X".to_string(), dec!(100000))]);

        let m = PerformanceEvaluator::new(0.03).compute(&snap, &prices);
        assert_eq!(m.total_value, Decimal::MAX);
        assert!(m.total_return.is_finite() && m.total_return > 0.0);
        assert!(m.sharpe_ratio.is_finite());
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn test_drawdown_is_zero_when_all_positions_gain() {
        let mut snap = LedgerSnapshot::new(dec!(1000));
        snap.signals.push(executed(date(1, 1), "A", SignalType::Buy, dec!(1), dec!(1), dec!(100)));
        snap.portfolio.cash = dec!(900);
        snap.portfolio.holdings.insert("A".into(), dec!(100));
        let prices = PriceMap::from([("A".to_string(), dec!(2))]);
        assert_eq!(max_drawdown(&snap, &prices, dec!(1100)), 0.0);
        assert_eq!(max_drawdown(&snap, &prices, Decimal::ZERO), 0.0);
    }
}
