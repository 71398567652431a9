use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, Instrument};

use crate::error::{FlowError, Result};
use crate::flow::Flow;
use crate::state::SharedState;

use super::types::FlowExecution;

/// Drives `flow` from its entry node until a node returns an action with no
/// outgoing edge. Nodes run strictly one after another.
pub(crate) async fn execute_flow(flow: &Flow, shared: &mut SharedState) -> Result<FlowExecution> {
    let mut current = flow.start().to_string();
    let mut visited: Vec<String> = Vec::new();

    loop {
        if let Some(limit) = flow.max_steps() {
            if visited.len() >= limit {
                return Err(FlowError::MaxStepsExceeded {
                    flow: flow.name().to_string(),
                    limit,
                });
            }
        }

        let node = flow
            .node(&current)
            .ok_or_else(|| FlowError::UnknownNode(current.clone()))?;

        let span = info_span!("node", flow = flow.name(), node = %current);
        let action = node
            .run(shared)
            .instrument(span)
            .await
            .map_err(|error| error.in_node(&current))?;
        visited.push(current.clone());

        match flow.successor(&current, action.as_str()) {
            Some(next) => {
                debug!(flow = flow.name(), from = %current, %action, to = next, "transition");
                current = next.to_string();
            }
            None => {
                debug!(flow = flow.name(), node = %current, %action, "no successor, stopping");
                return Ok(FlowExecution {
                    flow_name: flow.name().to_string(),
                    last_node: current,
                    action,
                    visited,
                });
            }
        }
    }
}

/// Flow 执行器
///
/// Top-level entry point for a flow run: adds start/finish logging around
/// [`Flow::execute`].
#[derive(Clone)]
pub struct FlowExecutor {
    flow: Arc<Flow>,
}

impl FlowExecutor {
    pub fn new(flow: Flow) -> Self {
        Self {
            flow: Arc::new(flow),
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub async fn start(&self, shared: &mut SharedState) -> Result<FlowExecution> {
        let started = Instant::now();
        info!(flow = self.flow.name(), start = self.flow.start(), "flow started");
        match self.flow.execute(shared).await {
            Ok(execution) => {
                info!(
                    flow = self.flow.name(),
                    steps = execution.steps(),
                    action = %execution.action,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "flow finished"
                );
                Ok(execution)
            }
            Err(error) => {
                tracing::error!(flow = self.flow.name(), error = %error, "flow failed");
                Err(error)
            }
        }
    }
}
