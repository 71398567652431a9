use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::llm::DynLlmClient;
use crate::research::keys::{ANALYSIS_RESULTS, CODE_EXECUTION_RESULTS};
use crate::research::model::{CodeExecutionRecord, GeneratedCode, Task, TaskKind};
use crate::research::parse::parse_yaml_value;
use crate::research::prompts;
use crate::state::SharedState;
use crate::tools::{CodeRun, DynCodeRunner};

use super::{ask, drop_pending, pending_of};

/// Generates code for each pending code task and hands it to the runner.
/// A failing run is recorded, not raised.
pub struct CodeExecutorNode {
    llm: DynLlmClient,
    runner: DynCodeRunner,
}

impl CodeExecutorNode {
    pub fn new(llm: DynLlmClient, runner: DynCodeRunner) -> Self {
        Self { llm, runner }
    }

    async fn generate(&self, task: &Task, analysis: &str) -> Result<GeneratedCode> {
        let reply = ask(self.llm.as_ref(), prompts::code_execution(task, analysis)).await?;
        Ok(serde_yaml::from_value(parse_yaml_value(&reply)?)?)
    }
}

pub struct CodeInput {
    pub tasks: Vec<Task>,
    pub analysis: String,
}

#[async_trait]
impl Node for CodeExecutorNode {
    type Prep = CodeInput;
    type Exec = Vec<CodeExecutionRecord>;

    async fn prep(&self, shared: &SharedState) -> Result<CodeInput> {
        let analysis = match shared.get(ANALYSIS_RESULTS) {
            Some(value) => serde_yaml::to_string(value)?,
            None => "(no analysis yet)".to_string(),
        };
        Ok(CodeInput {
            tasks: pending_of(shared, TaskKind::CodeExecution)?,
            analysis,
        })
    }

    async fn exec(&self, input: &CodeInput) -> Result<Vec<CodeExecutionRecord>> {
        let mut records = Vec::with_capacity(input.tasks.len());
        for task in &input.tasks {
            let generated = self.generate(task, &input.analysis).await?;
            let run = match self.runner.run(&generated.language, &generated.code).await {
                Ok(run) => run,
                Err(error) => {
                    warn!(task = %task.description, error = %error, "code run failed");
                    CodeRun {
                        success: false,
                        executed: false,
                        output: String::new(),
                        files: Vec::new(),
                        error: Some(error.to_string()),
                    }
                }
            };
            info!(task = %task.description, success = run.success, "code task done");
            records.push(CodeExecutionRecord {
                task: task.description.clone(),
                code: generated.code,
                explanation: generated.explanation,
                run,
            });
        }
        Ok(records)
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _input: CodeInput,
        records: Vec<CodeExecutionRecord>,
    ) -> Result<Action> {
        if !shared.contains(CODE_EXECUTION_RESULTS) {
            shared.set(CODE_EXECUTION_RESULTS, Vec::<CodeExecutionRecord>::new())?;
        }
        for record in records {
            shared.push(CODE_EXECUTION_RESULTS, record)?;
        }
        drop_pending(shared, TaskKind::CodeExecution)?;
        Ok(Action::default())
    }
}
