use crate::flow::Action;

/// 运行时类型定义

/// Flow 执行结果
#[derive(Clone, Debug, PartialEq)]
pub struct FlowExecution {
    pub flow_name: String,
    pub last_node: String,
    pub action: Action,
    /// Node names in the order they ran, repeats included.
    pub visited: Vec<String>,
}

impl FlowExecution {
    pub fn steps(&self) -> usize {
        self.visited.len()
    }
}
