use crate::config::ResearchConfig;
use crate::error::{FlowError, Result};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证 API Key 格式
    pub fn validate_api_key(api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(FlowError::Config("api key must not be empty".to_string()));
        }

        if api_key.starts_with("your_") || (api_key.starts_with("sk-") && api_key.len() < 20) {
            return Err(FlowError::Config(
                "api key looks like a placeholder, provide a real key".to_string(),
            ));
        }

        Ok(())
    }

    /// 验证 URL 格式
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(FlowError::Config("url must not be empty".to_string()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FlowError::Config(format!(
                "url `{url}` must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// 验证模型名称
    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(FlowError::Config("model name must not be empty".to_string()));
        }

        let lower = model.to_lowercase();
        if lower.contains("gpt") && !lower.contains("gpt-") {
            tracing::warn!(
                model = %model,
                "model name looks unusual, GPT models are usually named like `gpt-4o`"
            );
        }

        Ok(())
    }

    /// 验证节点名称
    pub fn validate_node_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(FlowError::Config("node name must not be empty".to_string()));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(FlowError::Config(format!(
                "node name `{name}` may only contain letters, digits, `_` and `-`"
            )));
        }

        Ok(())
    }

    /// Checks everything the research workflow needs before a run starts.
    pub fn validate_research_config(config: &ResearchConfig) -> Result<()> {
        Self::validate_model_name(&config.model)?;
        Self::validate_api_key(&config.require_api_key()?)?;
        if let Some(url) = &config.base_url {
            Self::validate_url(url)?;
        }
        Ok(())
    }
}
