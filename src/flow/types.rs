use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::runtime::{execute_flow, FlowExecution};
use crate::state::SharedState;

use super::action::Action;
use super::builder::FlowBuilder;
use super::node::{DynRunnable, Runnable};
use super::transitions::Transitions;

/// Flow 工作流
///
/// A graph of named nodes joined by `(node, action) -> node` edges. Running
/// it starts at the entry node and follows the action each node returns
/// until no edge matches; the last action is the flow's result.
///
/// Cycles are allowed and are not detected. A node that keeps routing back
/// to itself (a supervisor retry loop, say) runs forever unless it
/// eventually returns an unwired action or the flow was built with
/// [`FlowBuilder::with_max_steps`].
#[derive(Clone)]
pub struct Flow {
    pub(crate) name: String,
    pub(crate) start: String,
    pub(crate) nodes: HashMap<String, DynRunnable>,
    pub(crate) transitions: Transitions,
    pub(crate) max_steps: Option<usize>,
}

impl Flow {
    pub fn builder(name: impl Into<String>) -> FlowBuilder {
        FlowBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn node(&self, name: &str) -> Option<&DynRunnable> {
        self.nodes.get(name)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn successor(&self, from: &str, action: &str) -> Option<&str> {
        self.transitions.successor(from, action)
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    /// Runs the flow and reports the path it took.
    pub async fn execute(&self, shared: &mut SharedState) -> Result<FlowExecution> {
        execute_flow(self, shared).await
    }
}

/// A nested flow runs its own graph to completion; its final action is what
/// the parent graph sees.
#[async_trait]
impl Runnable for Flow {
    async fn run(&self, shared: &mut SharedState) -> Result<Action> {
        Ok(self.execute(shared).await?.action)
    }
}
