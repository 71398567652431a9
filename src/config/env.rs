use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::error::{FlowError, Result};

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// Loads `.env` (or the given file) into the process environment.
    /// Variables that are already set win. A missing file is not an error.
    pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
        let loaded = match path {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match loaded {
            Ok(()) => Ok(()),
            Err(err) if err.not_found() => Ok(()),
            Err(err) => Err(FlowError::Config(format!("failed to load env file: {err}"))),
        }
    }

    /// 获取 API Key
    ///
    /// 优先级：
    /// 1. `${VAR_NAME}` 形式：读取对应环境变量
    /// 2. 空字符串：读取 `default_env_var`
    /// 3. 其他：原样返回
    pub fn get_api_key(api_key: &str, default_env_var: &str) -> Result<String> {
        if api_key.starts_with("${") && api_key.ends_with('}') {
            let env_var_name = &api_key[2..api_key.len() - 1];
            Self::get_env(env_var_name)
        } else if api_key.is_empty() {
            Self::get_env(default_env_var)
        } else {
            Ok(api_key.to_string())
        }
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(FlowError::Config(format!(
                "environment variable `{key}` is not set; add it to `.env` or export it"
            ))),
        }
    }

    /// 获取可选的环境变量，空值视为未设置
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    /// Reads a boolean flag; `true`, `1`, `yes` and `on` (any case) are true.
    pub fn get_flag(key: &str) -> bool {
        Self::get_env_optional(key)
            .map(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                )
            })
            .unwrap_or(false)
    }

    pub fn get_parsed<T>(key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::get_env_optional(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                FlowError::Config(format!("environment variable `{key}`=`{raw}`: {e}"))
            }),
        }
    }
}
