use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::utils::validation::ConfigValidator;

use super::action::Action;
use super::node::{DynRunnable, Node, Runnable, Step};
use super::transitions::Transitions;
use super::types::Flow;

/// Flow 构建器
pub struct FlowBuilder {
    name: String,
    start: Option<String>,
    first: Option<String>,
    nodes: HashMap<String, DynRunnable>,
    transitions: Transitions,
    max_steps: Option<usize>,
}

impl FlowBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            start: None,
            first: None,
            nodes: HashMap::new(),
            transitions: Transitions::new(),
            max_steps: None,
        }
    }

    /// Registers a runnable under `name`, replacing any node with that name.
    pub fn add_node<R>(&mut self, name: &str, node: R) -> &mut Self
    where
        R: Runnable + 'static,
    {
        self.add_shared(name, Arc::new(node))
    }

    /// Registers an already shared runnable, e.g. a node reused by several
    /// flows.
    pub fn add_shared(&mut self, name: &str, node: DynRunnable) -> &mut Self {
        if self.first.is_none() {
            self.first = Some(name.to_string());
        }
        self.nodes.insert(name.to_string(), node);
        self
    }

    /// Shorthand for `add_node(name, Step::new(node))`.
    pub fn add_step<N>(&mut self, name: &str, node: N) -> &mut Self
    where
        N: Node + 'static,
    {
        self.add_node(name, Step::new(node))
    }

    pub fn set_start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.to_string());
        self
    }

    /// Unconditional chaining on the `"default"` action.
    pub fn connect(&mut self, from: &str, to: &str) -> &mut Self {
        self.connect_on(from, Action::DEFAULT, to)
    }

    pub fn connect_on(&mut self, from: &str, action: impl Into<Action>, to: &str) -> &mut Self {
        self.transitions.connect(from, action, to);
        self
    }

    pub fn successor(&self, from: &str, action: &str) -> Option<&str> {
        self.transitions.successor(from, action)
    }

    /// Fails the run with [`FlowError::MaxStepsExceeded`] once `limit` nodes
    /// have run. Off by default.
    pub fn with_max_steps(&mut self, limit: usize) -> &mut Self {
        self.max_steps = Some(limit);
        self
    }

    /// Validates the wiring and produces the flow. Without `set_start` the
    /// first node added is the entry.
    pub fn build(&self) -> Result<Flow> {
        let start = self
            .start
            .clone()
            .or_else(|| self.first.clone())
            .ok_or_else(|| FlowError::EmptyFlow(self.name.clone()))?;
        for name in self.nodes.keys() {
            ConfigValidator::validate_node_name(name)?;
        }
        if !self.nodes.contains_key(&start) {
            return Err(FlowError::UnknownNode(start));
        }
        for (from, _, to) in self.transitions.iter() {
            for endpoint in [from, to] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(FlowError::UnknownNode(endpoint.to_string()));
                }
            }
        }
        Ok(Flow {
            name: self.name.clone(),
            start,
            nodes: self.nodes.clone(),
            transitions: self.transitions.clone(),
            max_steps: self.max_steps,
        })
    }
}
