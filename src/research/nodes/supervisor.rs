use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::llm::DynLlmClient;
use crate::research::actions;
use crate::research::keys::{
    reset_for_revision, ANALYSIS_RESULTS, FINAL_REPORT, QUERY, REVISIONS, VISUALIZATIONS,
};
use crate::research::model::{Analysis, Report, ReviewDecision, TaskKind};
use crate::research::prompts;
use crate::state::SharedState;

use super::{ask_section, pending_of};

/// What the supervisor decided from the state alone.
#[derive(Clone, Debug, PartialEq)]
pub enum SupervisorPlan {
    /// Send the run to the node behind this action.
    Route(&'static str),
    /// A report exists and needs a quality review.
    Review {
        query: String,
        report: Report,
        revisions: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SupervisorVerdict {
    Route(&'static str),
    Reviewed(ReviewDecision),
}

/// 监督节点
///
/// Hub of the research graph. Routes to whichever stage still has work, in
/// the order research, analysis, code, charts, report. Once a report exists
/// it asks the model for a quality review and either forwards the report to
/// human approval or sends the run back to the planner. After
/// `max_revisions` send-backs the report is forwarded regardless.
pub struct SupervisorNode {
    llm: DynLlmClient,
    max_revisions: u32,
}

impl SupervisorNode {
    pub fn new(llm: DynLlmClient, max_revisions: u32) -> Self {
        Self { llm, max_revisions }
    }

    pub fn plan(shared: &SharedState) -> Result<SupervisorPlan> {
        if !pending_of(shared, TaskKind::WebResearch)?.is_empty() {
            return Ok(SupervisorPlan::Route(actions::RESEARCH));
        }
        let analysis: Option<Analysis> = shared.get_as(ANALYSIS_RESULTS)?;
        let Some(analysis) = analysis else {
            return Ok(SupervisorPlan::Route(actions::ANALYZE));
        };
        if !pending_of(shared, TaskKind::DataAnalysis)?.is_empty() {
            return Ok(SupervisorPlan::Route(actions::ANALYZE));
        }
        if !pending_of(shared, TaskKind::CodeExecution)?.is_empty() {
            return Ok(SupervisorPlan::Route(actions::EXECUTE_CODE));
        }
        if !analysis.visualizations.is_empty() && !shared.contains(VISUALIZATIONS) {
            return Ok(SupervisorPlan::Route(actions::VISUALIZE));
        }
        match shared.get_as::<Report>(FINAL_REPORT)? {
            None => Ok(SupervisorPlan::Route(actions::REPORT)),
            Some(report) => Ok(SupervisorPlan::Review {
                query: shared.require(QUERY)?,
                report,
                revisions: shared.get_as(REVISIONS)?.unwrap_or(0),
            }),
        }
    }
}

#[async_trait]
impl Node for SupervisorNode {
    type Prep = SupervisorPlan;
    type Exec = SupervisorVerdict;

    async fn prep(&self, shared: &SharedState) -> Result<SupervisorPlan> {
        Self::plan(shared)
    }

    async fn exec(&self, plan: &SupervisorPlan) -> Result<SupervisorVerdict> {
        match plan {
            SupervisorPlan::Route(action) => Ok(SupervisorVerdict::Route(*action)),
            SupervisorPlan::Review { query, report, .. } => {
                let prompt = prompts::review(query, report);
                let decision = ask_section(self.llm.as_ref(), prompt, "decision").await?;
                Ok(SupervisorVerdict::Reviewed(decision))
            }
        }
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        plan: SupervisorPlan,
        verdict: SupervisorVerdict,
    ) -> Result<Action> {
        let decision = match verdict {
            SupervisorVerdict::Route(action) => {
                info!(%action, "routing");
                return Ok(Action::new(action));
            }
            SupervisorVerdict::Reviewed(decision) => decision,
        };
        let revisions = match plan {
            SupervisorPlan::Review { revisions, .. } => revisions,
            SupervisorPlan::Route(_) => 0,
        };

        if decision.approved {
            info!(confidence = ?decision.confidence, "report accepted");
            return Ok(Action::new(actions::REVIEW));
        }
        if revisions >= self.max_revisions {
            warn!(
                revisions,
                max_revisions = self.max_revisions,
                "revision limit reached, forwarding report as is"
            );
            return Ok(Action::new(actions::REVIEW));
        }
        let feedback = decision
            .feedback
            .unwrap_or_else(|| "report did not meet quality standards".to_string());
        let revisions = reset_for_revision(shared, &feedback)?;
        info!(revisions, feedback = %feedback, "report sent back for revision");
        Ok(Action::new(actions::NEEDS_REVISION))
    }
}
