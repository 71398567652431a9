use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::llm::DynLlmClient;
use crate::research::keys::{PENDING_TASKS, QUERY, SUPERVISOR_FEEDBACK, TASKS};
use crate::research::model::Task;
use crate::research::parse::parse_yaml_value;
use crate::research::prompts;
use crate::research::validation::TaskValidator;
use crate::state::SharedState;

use super::ask;

/// Turns the query, plus any reviewer feedback, into a validated task list.
pub struct PlannerNode {
    llm: DynLlmClient,
}

impl PlannerNode {
    pub fn new(llm: DynLlmClient) -> Self {
        Self { llm }
    }
}

pub struct PlannerInput {
    pub query: String,
    pub feedback: Option<String>,
}

#[async_trait]
impl Node for PlannerNode {
    type Prep = PlannerInput;
    type Exec = Vec<Task>;

    async fn prep(&self, shared: &SharedState) -> Result<PlannerInput> {
        Ok(PlannerInput {
            query: shared.require(QUERY)?,
            feedback: shared.get_as(SUPERVISOR_FEEDBACK)?,
        })
    }

    async fn exec(&self, input: &PlannerInput) -> Result<Vec<Task>> {
        let prompt = prompts::planner(&input.query, input.feedback.as_deref());
        let reply = ask(self.llm.as_ref(), prompt).await?;
        TaskValidator::parse_tasks(parse_yaml_value(&reply)?)
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _input: PlannerInput,
        tasks: Vec<Task>,
    ) -> Result<Action> {
        info!(tasks = tasks.len(), "plan ready");
        shared.set(TASKS, &tasks)?;
        shared.set(PENDING_TASKS, tasks)?;
        shared.remove(SUPERVISOR_FEEDBACK);
        Ok(Action::default())
    }
}
