//! 账本与参数历史的持久化适配器。
//!
//! SQLite 实现用于生产，内存实现用于测试与一次性运行。

pub mod ledger;
pub mod memory;
pub mod params;
pub mod pool;
