use chrono::NaiveDate;
use paperfund_core::common::{PriceMap, SignalType};
use paperfund_core::trade::entity::TradeSignal;
use paperfund_core::trade::port::TradeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 上游监控程序产出的一批信号。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalBatch {
    /// 批次日期，缺省时取当天
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub signals: Vec<BatchSignal>,
}

/// # Summary
/// 批次中的单条信号，字段命名沿用上游格式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSignal {
    #[serde(alias = "fund_code")]
    pub instrument_id: String,
    #[serde(default, alias = "fund_name")]
    pub instrument_name: String,
    /// BUY / SELL / HOLD，大小写不敏感
    pub signal: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub suggested_amount: Decimal,
    #[serde(default)]
    pub reason: String,
}

impl BatchSignal {
    /// 以批次日期转换成待执行信号，并做入账前检查。
    pub fn to_signal(&self, date: NaiveDate) -> Result<TradeSignal, TradeError> {
        let signal_type = SignalType::from_str(&self.signal).map_err(TradeError::InvalidSignal)?;
        let signal = TradeSignal::new(
            date,
            self.instrument_id.clone(),
            self.instrument_name.clone(),
            signal_type,
            self.score,
            self.current_price,
            self.suggested_amount,
            self.reason.clone(),
        );
        signal.validate()?;
        Ok(signal)
    }
}

impl SignalBatch {
    /// 从批次中提取价格表，只保留正价格。
    pub fn prices(&self) -> PriceMap {
        self.signals
            .iter()
            .filter(|s| s.current_price > Decimal::ZERO)
            .map(|s| (s.instrument_id.clone(), s.current_price))
            .collect()
    }
}
