// 运行时执行引擎模块

mod executor;
mod types;

pub(crate) use executor::execute_flow;
pub use executor::FlowExecutor;
pub use types::FlowExecution;
