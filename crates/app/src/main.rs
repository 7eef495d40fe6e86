mod cli;
mod settings;

use clap::Parser;
use cli::{Cli, Command};
use paperfund_core::common::PriceMap;
use paperfund_core::common::time::{RealTimeProvider, TimeProvider};
use paperfund_core::config::LogConfig;
use paperfund_evolve::evolver::ParameterEvolver;
use paperfund_manager::batch::SignalBatch;
use paperfund_manager::orchestrator::OptimizationOrchestrator;
use paperfund_store::ledger::SqliteLedgerStore;
use paperfund_store::params::SqliteParamStore;
use paperfund_trade::service::TradingEngine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责加载配置、实例化存储与领域组件并注入到 `OptimizationOrchestrator`，然后执行一条子命令。
///
/// # Logic
/// 1. 解析命令行并加载分层配置。
/// 2. 初始化日志 (stderr + 文件)。
/// 3. 实例化基础设施层 (SQLite 存储)。
/// 4. 恢复交易引擎与参数进化器。
/// 5. 构造编排器并执行子命令，结果以 JSON 输出到 stdout。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = settings::load(&cli.config)?;

    // 1. 初始化日志
    let _log_guard = init_tracing(&cfg.log);
    info!("Paperfund starting...");

    // 2. 实例化基础设施层
    let data_dir = PathBuf::from(&cfg.database.data_dir);
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);
    let ledger_store = Arc::new(SqliteLedgerStore::open(&data_dir).await?);
    let param_store = Arc::new(SqliteParamStore::open(&data_dir).await?);

    // 3. 恢复领域组件，损坏的持久化状态在这里直接终止启动
    let engine = Arc::new(TradingEngine::open(ledger_store, cfg.account.initial_cash).await?);
    let evolver = ParameterEvolver::load(param_store, clock.clone(), cfg.strategy.clone()).await?;

    // 4. 构造应用服务层
    let orchestrator = OptimizationOrchestrator::new(engine, evolver, clock.clone(), &cfg.evaluation);

    match cli.command {
        Command::Intake { batch } => {
            let batch: SignalBatch = read_json(&batch)?;
            emit(&orchestrator.ingest_batch(&batch).await?)?;
        }
        Command::Execute { prices, date } => {
            let prices: PriceMap = read_json(&prices)?;
            let date = date.unwrap_or_else(|| clock.today());
            emit(&orchestrator.execute_pending(&prices, date).await?)?;
        }
        Command::Cycle { prices } => {
            let prices: PriceMap = read_json(&prices)?;
            emit(&orchestrator.run_cycle(&prices).await?)?;
        }
        Command::Dashboard { prices } => {
            let prices: PriceMap = read_json(&prices)?;
            emit(&orchestrator.dashboard(&prices).await)?;
        }
    }

    info!("Paperfund finished");
    Ok(())
}

/// # Summary
/// 安装全局日志：stderr 输出人类可读格式，日志目录下按天滚动写入 `paperfund.log`。
/// stdout 留给 JSON 结果。
///
/// # Returns
/// * 文件写入器的守卫，必须在进程结束前一直持有。
fn init_tracing(log: &LogConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&log.dir, "paperfund.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(filter());
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn emit<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
