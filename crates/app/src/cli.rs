use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "paperfund", version, about = "Paper-trading feedback loop for fund signals")]
pub struct Cli {
    /// 配置文件路径 (不带扩展名)
    #[arg(long, global = true, default_value = "config/paperfund")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 入账一批上游信号并运行一次周期
    Intake {
        /// 信号批次 JSON 文件
        batch: PathBuf,
    },
    /// 按报价执行所有待执行信号
    Execute {
        /// 价格表 JSON 文件 ({"代码": 价格})
        prices: PathBuf,
        /// 成交日期，缺省为当天
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// 运行一次评估 + 进化周期
    Cycle { prices: PathBuf },
    /// 输出仪表板
    Dashboard { prices: PathBuf },
}
