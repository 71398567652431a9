//! 研究工作流
//!
//! A research assistant built on the flow engine: plan a query into tasks,
//! search the web, analyse, optionally generate code and charts, write a
//! report, review it and ask a human for the final word.

pub mod actions;
pub mod approval;
pub mod keys;
pub mod model;
pub mod nodes;
pub mod parse;
pub mod prompts;
pub mod validation;
pub mod workflow;

pub use approval::{ApprovalGate, AutoApprove, ConsoleApproval, DynApprovalGate};
pub use model::{
    Analysis, ApprovalDecision, CodeExecutionRecord, Report, ResearchFinding, ReviewDecision, Task,
    TaskKind, TaskParameters,
};
pub use validation::TaskValidator;
pub use workflow::{
    batch_research_flow, batch_state, initial_state, research_flow, ResearchOptions,
    ResearchServices,
};
#[cfg(feature = "http-clients")]
pub use workflow::{llm_from_config, toolkit_from_config};
