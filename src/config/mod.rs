// 配置模块

mod env;
mod research;

pub use env::EnvConfig;
pub use research::{LlmProvider, ResearchConfig};
