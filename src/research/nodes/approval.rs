use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::research::actions;
use crate::research::approval::DynApprovalGate;
use crate::research::keys::{reset_for_revision, APPROVAL, FINAL_REPORT, QUERY};
use crate::research::model::{ApprovalDecision, Report};
use crate::state::SharedState;

/// Puts the accepted report in front of the approval gate. A rejection
/// sends the run back to the planner with the reviewer's feedback.
pub struct ApprovalNode {
    gate: DynApprovalGate,
}

impl ApprovalNode {
    pub fn new(gate: DynApprovalGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Node for ApprovalNode {
    type Prep = (String, Report);
    type Exec = ApprovalDecision;

    async fn prep(&self, shared: &SharedState) -> Result<(String, Report)> {
        Ok((shared.require(QUERY)?, shared.require(FINAL_REPORT)?))
    }

    async fn exec(&self, prep: &(String, Report)) -> Result<ApprovalDecision> {
        let (query, report) = prep;
        self.gate.review(query, report).await
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _prep: (String, Report),
        decision: ApprovalDecision,
    ) -> Result<Action> {
        shared.set(APPROVAL, &decision)?;
        if decision.approved {
            info!("report approved");
            return Ok(Action::new(actions::APPROVED));
        }
        let feedback = decision.feedback.as_deref().unwrap_or("rejected by reviewer");
        let revisions = reset_for_revision(shared, feedback)?;
        info!(revisions, feedback, "report rejected");
        Ok(Action::new(actions::REJECTED))
    }
}
