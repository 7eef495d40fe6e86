use config::{Config, ConfigError, Environment, File};
use paperfund_core::config::AppConfig;

/// # Summary
/// 分层加载配置：内置默认值 → 配置文件 (可选) → `PAPERFUND__` 前缀的环境变量。
///
/// # Arguments
/// * `path` - 配置文件路径，不带扩展名时按 `config` 的规则查找。
///
/// # Returns
/// * 合并后的 `AppConfig`；文件存在但格式错误时返回错误。
pub fn load(path: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("PAPERFUND")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
