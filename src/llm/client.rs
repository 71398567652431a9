use std::sync::Arc;

use async_trait::async_trait;

use super::types::{LlmRequest, LlmResponse};
use crate::error::Result;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Provider/model label used in logs.
    fn describe(&self) -> String {
        "llm".to_string()
    }
}

pub type DynLlmClient = Arc<dyn LlmClient>;
