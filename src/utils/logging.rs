use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// 支持通过环境变量配置：
    /// - RUST_LOG: 设置日志级别（error, warn, info, debug, trace）
    /// - RESEARCHFLOW_DEBUG: 启用详细调试输出
    ///
    /// Logs go to stderr so reports printed on stdout stay clean. Calling
    /// it twice is harmless.
    ///
    /// ```no_run
    /// use researchflow::utils::LoggingConfig;
    ///
    /// LoggingConfig::init();
    /// tracing::info!("ready");
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if is_debug {
                    EnvFilter::new("researchflow=debug,info")
                } else {
                    EnvFilter::new("researchflow=info,warn")
                }
            }
        };

        let fmt_layer = if is_debug {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
        };

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok();

        if installed && is_debug {
            tracing::debug!("debug logging enabled");
        }
    }

    /// 初始化日志系统（带自定义过滤器）
    pub fn init_with_filter(filter: &str) {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }

    /// 检查是否启用调试模式
    pub fn is_debug() -> bool {
        env::var("RESEARCHFLOW_DEBUG").is_ok()
    }
}
