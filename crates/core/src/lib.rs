//! 纸面交易闭环的领域核心：实体、端口 (trait) 与错误定义。
//!
//! 所有具体实现 (撮合、存储、评估、进化) 都位于各自的 crate 中，
//! 编译期只依赖这里声明的抽象。

pub mod common;
pub mod config;
pub mod eval;
pub mod store;
pub mod strategy;
pub mod trade;
