//! Shared-state keys of the research workflow.
//!
//! | key | written by | read by |
//! |-----|------------|---------|
//! | `query` | caller, batch | planner, analysis, reporter, approval |
//! | `tasks`, `pending_tasks` | planner; research, analysis and code nodes shrink `pending_tasks` | supervisor and the task nodes |
//! | `supervisor_feedback` | supervisor, approval | planner |
//! | `web_research_results` | web research | analysis, reporter |
//! | `analysis_results` | data analysis | supervisor, code executor, visualization, reporter |
//! | `code_execution_results` | code executor | reporter |
//! | `visualizations` | visualization | supervisor, reporter |
//! | `final_report` | reporter | supervisor, approval, caller |
//! | `revisions` | supervisor, approval | supervisor |
//! | `approval` | approval | caller |

use crate::error::Result;
use crate::state::SharedState;

pub const QUERY: &str = "query";
pub const QUERIES: &str = "queries";
pub const RESULTS: &str = "results";
pub const TASKS: &str = "tasks";
pub const PENDING_TASKS: &str = "pending_tasks";
pub const SUPERVISOR_FEEDBACK: &str = "supervisor_feedback";
pub const WEB_RESEARCH_RESULTS: &str = "web_research_results";
pub const ANALYSIS_RESULTS: &str = "analysis_results";
pub const CODE_EXECUTION_RESULTS: &str = "code_execution_results";
pub const VISUALIZATIONS: &str = "visualizations";
pub const FINAL_REPORT: &str = "final_report";
pub const REVISIONS: &str = "revisions";
pub const APPROVAL: &str = "approval";

/// Everything derived from a plan; cleared when the plan is redone.
const DERIVED: [&str; 7] = [
    TASKS,
    PENDING_TASKS,
    WEB_RESEARCH_RESULTS,
    ANALYSIS_RESULTS,
    CODE_EXECUTION_RESULTS,
    VISUALIZATIONS,
    FINAL_REPORT,
];

/// Drops derived results, stores the feedback for the planner and bumps the
/// revision counter. Returns the new counter value.
pub fn reset_for_revision(shared: &mut SharedState, feedback: &str) -> Result<u32> {
    for key in DERIVED {
        shared.remove(key);
    }
    shared.set(SUPERVISOR_FEEDBACK, feedback)?;
    let revisions = shared.get_as::<u32>(REVISIONS)?.unwrap_or(0) + 1;
    shared.set(REVISIONS, revisions)?;
    Ok(revisions)
}
