use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::{FlowError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{ApiFormat, LlmRequest, LlmResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct GenericHttpClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    format: ApiFormat,
}

impl GenericHttpClient {
    /// 创建 HTTP 客户端
    ///
    /// 连接池复用连接；超时避免请求无限挂起。
    fn create_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| FlowError::Llm(format!("failed to build http client: {e}")))
    }

    pub fn new<S1, S2, S3>(endpoint: S1, api_key: S2, model: S3, format: ApiFormat) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Ok(Self {
            client: Self::create_client()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            format,
        })
    }

    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new("https://api.openai.com/v1", api_key, model, ApiFormat::OpenAI)
    }

    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new("https://api.anthropic.com/v1", api_key, model, ApiFormat::Anthropic)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match self.format {
            ApiFormat::OpenAI if base.ends_with("/chat/completions") => base.to_string(),
            ApiFormat::OpenAI => format!("{base}/chat/completions"),
            ApiFormat::Anthropic if base.ends_with("/messages") => base.to_string(),
            ApiFormat::Anthropic => format!("{base}/messages"),
        }
    }

    fn body(&self, request: &LlmRequest) -> Value {
        match self.format {
            ApiFormat::OpenAI => {
                let mut messages = Vec::new();
                if let Some(system) = &request.system {
                    messages.push(json!({ "role": "system", "content": system }));
                }
                messages.push(json!({ "role": "user", "content": request.user }));
                json!({
                    "model": self.model,
                    "messages": messages,
                    "temperature": request.temperature,
                    "max_tokens": request.max_tokens,
                })
            }
            ApiFormat::Anthropic => {
                let mut body = json!({
                    "model": self.model,
                    "messages": [{ "role": "user", "content": request.user }],
                    "temperature": request.temperature,
                    "max_tokens": request.max_tokens,
                });
                if let Some(system) = &request.system {
                    body["system"] = json!(system);
                }
                body
            }
        }
    }

    fn extract_content(&self, payload: &Value) -> Option<String> {
        match self.format {
            ApiFormat::OpenAI => payload["choices"]
                .get(0)
                .and_then(|choice| choice["message"]["content"].as_str())
                .map(str::to_string),
            ApiFormat::Anthropic => {
                let blocks = payload["content"].as_array()?;
                let text: Vec<&str> = blocks
                    .iter()
                    .filter(|block| block["type"] == "text")
                    .filter_map(|block| block["text"].as_str())
                    .collect();
                if text.is_empty() {
                    None
                } else {
                    Some(text.join(""))
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for GenericHttpClient {
    #[instrument(skip(self, request), fields(model = %self.model, format = ?self.format))]
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let builder = self.client.post(self.url()).json(&self.body(&request));
        let builder = match self.format {
            ApiFormat::OpenAI => builder.bearer_auth(&self.api_key),
            ApiFormat::Anthropic => builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| FlowError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FlowError::Llm(format!(
                "request failed with status {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FlowError::Llm(format!("invalid response body: {e}")))?;
        let content = self
            .extract_content(&payload)
            .ok_or_else(|| FlowError::Llm("missing message content".to_string()))?;

        Ok(LlmResponse {
            content,
            metadata: Some(payload),
        })
    }

    fn describe(&self) -> String {
        format!("{:?}:{}", self.format, self.model)
    }
}
