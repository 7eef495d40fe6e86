use crate::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 参数进化域错误枚举。
#[derive(Error, Debug)]
pub enum EvolveError {
    // 输入指标出现 NaN 或无穷大，视为调用方违约
    #[error("Metric {name} is not finite: {value}")]
    NonFiniteMetric { name: &'static str, value: f64 },
    // 历史追加失败
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
