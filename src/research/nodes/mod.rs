//! 研究节点
//!
//! One [`Node`](crate::flow::Node) per step of the research graph. Each node
//! reads and writes only the keys listed in [`keys`](super::keys).

mod approval;
mod code_executor;
mod data_analysis;
mod planner;
mod reporter;
mod supervisor;
mod visualization;
mod web_research;

pub use approval::ApprovalNode;
pub use code_executor::CodeExecutorNode;
pub use data_analysis::DataAnalysisNode;
pub use planner::PlannerNode;
pub use reporter::ReporterNode;
pub use supervisor::{SupervisorNode, SupervisorPlan, SupervisorVerdict};
pub use visualization::VisualizationNode;
pub use web_research::WebResearchNode;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::llm::{LlmClient, LlmRequest};
use crate::state::SharedState;

use super::keys::PENDING_TASKS;
use super::model::{ResearchFinding, Task, TaskKind};
use super::parse::parse_yaml_section;
use super::prompts::SYSTEM;

async fn ask(llm: &dyn LlmClient, prompt: String) -> Result<String> {
    let request = LlmRequest::user(prompt).with_system(SYSTEM);
    Ok(llm.complete(request).await?.content)
}

async fn ask_section<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    prompt: String,
    section: &str,
) -> Result<T> {
    let reply = ask(llm, prompt).await?;
    parse_yaml_section(&reply, section)
}

fn pending(shared: &SharedState) -> Result<Vec<Task>> {
    Ok(shared.get_as::<Vec<Task>>(PENDING_TASKS)?.unwrap_or_default())
}

pub(crate) fn pending_of(shared: &SharedState, kind: TaskKind) -> Result<Vec<Task>> {
    Ok(pending(shared)?
        .into_iter()
        .filter(|task| task.kind == kind)
        .collect())
}

fn drop_pending(shared: &mut SharedState, kind: TaskKind) -> Result<()> {
    let remaining: Vec<Task> = pending(shared)?
        .into_iter()
        .filter(|task| task.kind != kind)
        .collect();
    shared.set(PENDING_TASKS, remaining)
}

fn summarize_findings(findings: &[ResearchFinding]) -> String {
    if findings.is_empty() {
        return "(no web research results)".to_string();
    }
    let mut out = String::new();
    for finding in findings {
        out.push_str(&format!("## {} [{}]\n", finding.term, finding.task));
        if finding.hits.is_empty() {
            out.push_str("- no results\n");
        }
        for hit in &finding.hits {
            out.push_str(&format!("- {}: {}", hit.title, hit.description));
            if !hit.url.is_empty() {
                out.push_str(&format!(" ({})", hit.url));
            }
            out.push('\n');
        }
    }
    out
}
