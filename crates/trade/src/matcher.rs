use crate::portfolio::PortfolioState;
use chrono::NaiveDate;
use paperfund_core::trade::entity::{Execution, TradeSignal};
use paperfund_core::trade::port::TradeError;
use rust_decimal::Decimal;

/// # Summary
/// 纸面账户的撮合器。按调用方给出的成交价立即全量成交，
/// 不模拟手续费、滑点、最小交易单位或结算延迟。
#[derive(Debug, Default, Clone, Copy)]
pub struct FillEngine;

impl FillEngine {
    pub fn new() -> Self {
        Self
    }

    /// # Logic
    /// 1. 花费 = min(建议金额, 当前现金)。
    /// 2. 花费不为正时不成交 (现金已耗尽)，返回 `None`。
    /// 3. 份额 = 花费 / 成交价，扣减现金并增加持仓。
    /// 4. 份额或累计持仓超出 `Decimal` 表示范围时拒绝成交，状态不变。
    ///
    /// # Arguments
    /// * `price` - 成交价格，调用方保证大于 0
    pub fn fill_buy(
        &self,
        state: &mut PortfolioState,
        signal: &TradeSignal,
        date: NaiveDate,
        price: Decimal,
    ) -> Result<Option<Execution>, TradeError> {
        let spend = signal.suggested_amount.min(state.cash());
        if spend <= Decimal::ZERO {
            return Ok(None);
        }

        let invalid = || TradeError::InvalidPrice {
            instrument_id: signal.instrument_id.clone(),
            price,
        };
        let shares = spend.checked_div(price).ok_or_else(invalid)?;
        let held = state.shares_of(&signal.instrument_id).unwrap_or(Decimal::ZERO);
        if held.checked_add(shares).is_none() {
            return Err(invalid());
        }

        state.spend(spend);
        state.add_shares(&signal.instrument_id, shares);

        Ok(Some(Execution {
            date,
            price,
            amount: spend,
            shares,
        }))
    }

    /// # Logic
    /// 整仓卖出。没有持仓时返回 `None`；否则所得 = 全部份额 × 成交价，计入现金。
    /// 所得或到账后现金溢出时拒绝成交。
    pub fn fill_sell(
        &self,
        state: &mut PortfolioState,
        signal: &TradeSignal,
        date: NaiveDate,
        price: Decimal,
    ) -> Result<Option<Execution>, TradeError> {
        let Some(shares) = state.liquidate(&signal.instrument_id) else {
            return Ok(None);
        };

        let invalid = || TradeError::InvalidPrice {
            instrument_id: signal.instrument_id.clone(),
            price,
        };
        let proceeds = shares.checked_mul(price).ok_or_else(invalid)?;
        if state.cash().checked_add(proceeds).is_none() {
            return Err(invalid());
        }
        state.credit(proceeds);

        Ok(Some(Execution {
            date,
            price,
            amount: proceeds,
            shares,
        }))
    }
}
