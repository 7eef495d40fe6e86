use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

pub mod time;

/// # Summary
/// 外部行情协作方提供的价格表，键为标的代码。
pub type PriceMap = HashMap<String, Decimal>;

/// # Summary
/// 交易信号的方向。
///
/// # Invariants
/// - 只有 `Buy` 与 `Sell` 可以被执行，`Hold` 永远只是记录。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    // 买入
    Buy,
    // 卖出 (全部清仓)
    Sell,
    // 观望
    Hold,
}

impl SignalType {
    /// 该方向的信号是否允许成交。
    pub fn is_executable(self) -> bool {
        !matches!(self, SignalType::Hold)
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(SignalType::Buy),
            "SELL" => Ok(SignalType::Sell),
            "HOLD" => Ok(SignalType::Hold),
            _ => Err(format!("Unknown SignalType: {}", s)),
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Buy => write!(f, "BUY"),
            SignalType::Sell => write!(f, "SELL"),
            SignalType::Hold => write!(f, "HOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_type_parse_is_case_insensitive() {
        assert_eq!("buy".parse::<SignalType>(), Ok(SignalType::Buy));
        assert_eq!(" Sell ".parse::<SignalType>(), Ok(SignalType::Sell));
        assert_eq!("HOLD".parse::<SignalType>(), Ok(SignalType::Hold));
        assert!("SHORT".parse::<SignalType>().is_err());
    }

    #[test]
    fn test_signal_type_display_round_trips() {
        for t in [SignalType::Buy, SignalType::Sell, SignalType::Hold] {
            assert_eq!(t.to_string().parse::<SignalType>(), Ok(t));
        }
        assert!(!SignalType::Hold.is_executable());
    }
}
