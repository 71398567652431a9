use std::collections::HashMap;
use std::sync::Arc;

use crate::flow::types::Flow;

/// Flow 注册表
#[derive(Default)]
pub struct FlowRegistry {
    flows: HashMap<String, Arc<Flow>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self {
            flows: HashMap::new(),
        }
    }

    /// Stores `flow` under its own name and returns the shared handle.
    pub fn register(&mut self, flow: Flow) -> Arc<Flow> {
        let flow = Arc::new(flow);
        self.flows.insert(flow.name().to_string(), Arc::clone(&flow));
        flow
    }

    pub fn get(&self, name: &str) -> Option<Arc<Flow>> {
        self.flows.get(name).cloned()
    }

    pub fn list(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values().map(Arc::as_ref)
    }
}
