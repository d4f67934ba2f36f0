//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// 查询未显式给 count 时使用的默认条数。
    pub default_query_limit: i64,
    /// 单次查询允许的最大条数。
    pub max_query_limit: i64,
    /// 小时分桶使用的本地时区偏移（分钟，可为负）。
    pub utc_offset_minutes: i32,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("GMS_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("GMS_DATABASE_URL".to_string()))?;
        let default_query_limit = read_i64_with_default("GMS_DEFAULT_QUERY_LIMIT", 100)?;
        let max_query_limit = read_i64_with_default("GMS_MAX_QUERY_LIMIT", 1_000)?;
        let utc_offset_minutes = read_i32_with_default("GMS_UTC_OFFSET_MINUTES", 0)?;

        Ok(Self {
            database_url,
            default_query_limit,
            max_query_limit,
            utc_offset_minutes,
        })
    }
}

fn read_i64_with_default(key: &str, default: i64) -> Result<i64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<i64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_i32_with_default(key: &str, default: i32) -> Result<i32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<i32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}
