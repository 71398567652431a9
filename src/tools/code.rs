use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of handing generated code to a runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodeRun {
    pub success: bool,
    pub executed: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Executes generated code. Sandboxing is the implementor's business.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, language: &str, code: &str) -> Result<CodeRun>;
}

pub type DynCodeRunner = Arc<dyn CodeRunner>;

/// Records the code without executing anything.
#[derive(Clone, Debug, Default)]
pub struct DryRunRunner;

#[async_trait]
impl CodeRunner for DryRunRunner {
    async fn run(&self, language: &str, code: &str) -> Result<CodeRun> {
        Ok(CodeRun {
            success: true,
            executed: false,
            output: format!(
                "{} lines of {language} generated, not executed",
                code.lines().count()
            ),
            files: Vec::new(),
            error: None,
        })
    }
}
