pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod llm;
pub mod research;
pub mod runtime;
pub mod state;
pub mod tools;
pub mod utils;

pub use config::{EnvConfig, LlmProvider, ResearchConfig};
pub use error::{FlowError, Result};
pub use flow::{
    node_fn, Action, BatchFailurePolicy, BatchFlow, BatchItemOutcome, BatchResult, DynRunnable,
    Flow, FlowBuilder, FlowRegistry, FnNode, Node, RetryPolicy, Runnable, Step, Transitions,
};
#[cfg(feature = "http-clients")]
pub use llm::GenericHttpClient;
pub use llm::{ApiFormat, DynLlmClient, LlmClient, LlmRequest, LlmResponse};
pub use research::{
    batch_research_flow, research_flow, ApprovalGate, AutoApprove, ConsoleApproval, Report,
    ResearchOptions, ResearchServices, Task, TaskKind,
};
pub use runtime::{FlowExecution, FlowExecutor};
pub use state::SharedState;
pub use tools::{ChartRenderer, CodeRunner, Toolkit, WebSearch};
pub use utils::{logging, validation};
