// Flow 模块 - 工作流定义和执行

pub mod action;
pub mod batch;
pub mod builder;
pub mod node;
pub mod registry;
pub mod retry;
pub mod transitions;
pub mod types;

// 重新导出核心类型
pub use action::Action;
pub use batch::{
    BatchFailurePolicy, BatchFlow, BatchItemOutcome, BatchResult, BATCH_INDEX_KEY, PARTIAL_ACTION,
};
pub use builder::FlowBuilder;
pub use node::{node_fn, DynRunnable, FnNode, Node, Runnable, Step};
pub use registry::FlowRegistry;
pub use retry::RetryPolicy;
pub use transitions::Transitions;
pub use types::Flow;
