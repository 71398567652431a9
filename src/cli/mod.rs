//! Helpers behind the `researchflow` binary.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{FlowError, Result};
use crate::flow::FlowRegistry;
use crate::llm::{LlmClient, LlmRequest, LlmResponse};

/// Queries used when the binary runs without a subcommand.
pub const SAMPLE_QUERIES: [&str; 3] = [
    "What are the main drivers of electric vehicle adoption in Europe?",
    "How has remote work changed commercial real estate demand since 2020?",
    "What are the current approaches to grid-scale energy storage?",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    pub from: String,
    pub action: String,
    pub to: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub name: String,
    pub start: String,
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeSummary>,
}

/// Registered flows with their wiring, sorted for stable output.
pub fn describe_flows(registry: &FlowRegistry) -> Vec<FlowSummary> {
    let mut flows: Vec<FlowSummary> = registry
        .list()
        .map(|flow| {
            let mut nodes: Vec<String> = flow.node_names().map(str::to_string).collect();
            nodes.sort();
            let mut edges: Vec<EdgeSummary> = flow
                .transitions()
                .iter()
                .map(|(from, action, to)| EdgeSummary {
                    from: from.to_string(),
                    action: action.to_string(),
                    to: to.to_string(),
                })
                .collect();
            edges.sort_by(|a, b| (&a.from, &a.action).cmp(&(&b.from, &b.action)));
            FlowSummary {
                name: flow.name().to_string(),
                start: flow.start().to_string(),
                nodes,
                edges,
            }
        })
        .collect();
    flows.sort_by(|a, b| a.name.cmp(&b.name));
    flows
}

/// Stands in for a model when only the graph shape is needed.
#[derive(Clone, Debug, Default)]
pub struct NoLlm;

#[async_trait]
impl LlmClient for NoLlm {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
        Err(FlowError::Llm("no LLM configured".to_string()))
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}
