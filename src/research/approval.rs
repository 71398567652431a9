use std::sync::Arc;

use async_trait::async_trait;
use dialoguer::{Confirm, Input};

use crate::error::{FlowError, Result};

use super::model::{ApprovalDecision, Report};

/// Human checkpoint between an accepted report and the end of the run.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn review(&self, query: &str, report: &Report) -> Result<ApprovalDecision>;
}

pub type DynApprovalGate = Arc<dyn ApprovalGate>;

/// Approves everything; for unattended and batch runs.
#[derive(Clone, Debug, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn review(&self, _query: &str, _report: &Report) -> Result<ApprovalDecision> {
        Ok(ApprovalDecision::approve())
    }
}

/// Prints the report summary to stderr and asks on the terminal.
#[derive(Clone, Debug, Default)]
pub struct ConsoleApproval;

#[async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn review(&self, query: &str, report: &Report) -> Result<ApprovalDecision> {
        let summary = format!(
            "\n[REVIEW] {query}\n{}\n{} findings, {} recommendations",
            report.executive_summary.trim(),
            report.detailed_findings.len(),
            report.recommendations.len()
        );
        tokio::task::spawn_blocking(move || prompt(&summary))
            .await
            .map_err(|err| FlowError::Other(err.into()))?
    }
}

fn prompt(summary: &str) -> Result<ApprovalDecision> {
    eprintln!("{summary}");
    let approved = Confirm::new()
        .with_prompt("Approve this report?")
        .default(true)
        .interact()
        .map_err(|err| FlowError::Other(err.into()))?;
    if approved {
        return Ok(ApprovalDecision::approve());
    }
    let feedback: String = Input::new()
        .with_prompt("What should change")
        .allow_empty(true)
        .interact_text()
        .map_err(|err| FlowError::Other(err.into()))?;
    let feedback = if feedback.trim().is_empty() {
        "rejected by reviewer".to_string()
    } else {
        feedback
    };
    Ok(ApprovalDecision::reject(feedback))
}
