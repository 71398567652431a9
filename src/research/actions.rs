//! Action labels routed by the research graph.

pub const RESEARCH: &str = "research";
pub const ANALYZE: &str = "analyze";
pub const EXECUTE_CODE: &str = "execute_code";
pub const VISUALIZE: &str = "visualize";
pub const REPORT: &str = "report";
pub const REVIEW: &str = "review";
pub const NEEDS_REVISION: &str = "needs_revision";
pub const APPROVED: &str = "approved";
pub const REJECTED: &str = "rejected";
