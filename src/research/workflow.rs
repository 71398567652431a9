use std::sync::Arc;

use crate::config::ResearchConfig;
use crate::error::Result;
use crate::flow::{BatchFailurePolicy, BatchFlow, Flow, Node, RetryPolicy, Step};
use crate::llm::DynLlmClient;
use crate::state::SharedState;
use crate::tools::Toolkit;

use super::actions;
use super::approval::{AutoApprove, DynApprovalGate};
use super::keys::{FINAL_REPORT, QUERIES, QUERY, RESULTS};
use super::nodes::{
    ApprovalNode, CodeExecutorNode, DataAnalysisNode, PlannerNode, ReporterNode, SupervisorNode,
    VisualizationNode, WebResearchNode,
};

pub const RESEARCH_FLOW: &str = "research";
pub const BATCH_RESEARCH_FLOW: &str = "batch_research";

pub const PLANNER: &str = "planner";
pub const SUPERVISOR: &str = "supervisor";
pub const WEB_RESEARCH: &str = "web_research";
pub const DATA_ANALYSIS: &str = "data_analysis";
pub const CODE_EXECUTOR: &str = "code_executor";
pub const VISUALIZATION: &str = "visualization";
pub const REPORTER: &str = "reporter";
pub const APPROVAL: &str = "approval";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResearchOptions {
    /// Applied to every node's exec phase.
    pub retry: RetryPolicy,
    pub max_revisions: u32,
    pub max_search_results: usize,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self::from_config(&ResearchConfig::default())
    }
}

impl ResearchOptions {
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self {
            retry: RetryPolicy::new(config.max_attempts, config.retry_wait),
            max_revisions: config.max_revisions,
            max_search_results: config.max_search_results,
        }
    }
}

/// Collaborators the research nodes are built from.
#[derive(Clone)]
pub struct ResearchServices {
    pub llm: DynLlmClient,
    pub tools: Toolkit,
    pub approval: DynApprovalGate,
    pub options: ResearchOptions,
}

impl ResearchServices {
    /// Placeholder search, dry-run code, planned charts and auto approval.
    pub fn new(llm: DynLlmClient) -> Self {
        Self {
            llm,
            tools: Toolkit::default(),
            approval: Arc::new(AutoApprove),
            options: ResearchOptions::default(),
        }
    }

    pub fn with_tools(mut self, tools: Toolkit) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_approval(mut self, approval: DynApprovalGate) -> Self {
        self.approval = approval;
        self
    }

    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    fn step<N: Node>(&self, node: N) -> Step<N> {
        Step::new(node).with_policy(self.options.retry)
    }
}

/// 研究流程
///
/// ```text
/// planner -> supervisor
/// supervisor -research-> web_research -> supervisor
/// supervisor -analyze-> data_analysis -> supervisor
/// supervisor -execute_code-> code_executor -> supervisor
/// supervisor -visualize-> visualization -> supervisor
/// supervisor -report-> reporter -> supervisor
/// supervisor -needs_revision-> planner
/// supervisor -review-> approval -rejected-> planner
/// ```
///
/// The run ends when approval returns `approved`. Human rejections bump the
/// same revision counter as supervisor send-backs. Once it reaches the limit
/// the supervisor forwards the next report straight to approval, and a
/// person who keeps rejecting keeps the run going.
pub fn research_flow(services: &ResearchServices) -> Result<Flow> {
    let llm = &services.llm;
    let tools = &services.tools;
    let options = &services.options;

    let mut builder = Flow::builder(RESEARCH_FLOW);
    builder
        .add_node(PLANNER, services.step(PlannerNode::new(llm.clone())))
        .add_node(
            SUPERVISOR,
            services.step(SupervisorNode::new(llm.clone(), options.max_revisions)),
        )
        .add_node(
            WEB_RESEARCH,
            // retried per search term inside the node
            Step::new(
                WebResearchNode::new(tools.search.clone(), options.max_search_results)
                    .with_retry(options.retry),
            ),
        )
        .add_node(DATA_ANALYSIS, services.step(DataAnalysisNode::new(llm.clone())))
        .add_node(
            CODE_EXECUTOR,
            services.step(CodeExecutorNode::new(llm.clone(), tools.code.clone())),
        )
        .add_node(
            VISUALIZATION,
            services.step(VisualizationNode::new(tools.charts.clone())),
        )
        .add_node(REPORTER, services.step(ReporterNode::new(llm.clone())))
        // the gate is not retried: a person answered it
        .add_node(APPROVAL, Step::new(ApprovalNode::new(services.approval.clone())))
        .set_start(PLANNER)
        .connect(PLANNER, SUPERVISOR);

    for (action, worker) in [
        (actions::RESEARCH, WEB_RESEARCH),
        (actions::ANALYZE, DATA_ANALYSIS),
        (actions::EXECUTE_CODE, CODE_EXECUTOR),
        (actions::VISUALIZE, VISUALIZATION),
        (actions::REPORT, REPORTER),
    ] {
        builder
            .connect_on(SUPERVISOR, action, worker)
            .connect(worker, SUPERVISOR);
    }

    builder
        .connect_on(SUPERVISOR, actions::NEEDS_REVISION, PLANNER)
        .connect_on(SUPERVISOR, actions::REVIEW, APPROVAL)
        .connect_on(APPROVAL, actions::REJECTED, PLANNER)
        .build()
}

/// Runs the research flow once per entry of `queries`, collecting each
/// item's `final_report` into `results`.
pub fn batch_research_flow(
    services: &ResearchServices,
    on_failure: BatchFailurePolicy,
) -> Result<BatchFlow> {
    let flow = research_flow(services)?;
    Ok(BatchFlow::new(BATCH_RESEARCH_FLOW, Arc::new(flow))
        .items_key(QUERIES)
        .item_key(QUERY)
        .results_key(RESULTS)
        .result_from(FINAL_REPORT)
        .on_item_failure(on_failure))
}

pub fn initial_state(query: impl Into<String>) -> SharedState {
    let mut shared = SharedState::new();
    shared.insert(QUERY, serde_json::Value::String(query.into()));
    shared
}

pub fn batch_state<S: AsRef<str>>(queries: &[S]) -> SharedState {
    let queries = queries
        .iter()
        .map(|q| serde_json::Value::String(q.as_ref().to_string()))
        .collect();
    let mut shared = SharedState::new();
    shared.insert(QUERIES, serde_json::Value::Array(queries));
    shared
}

#[cfg(feature = "http-clients")]
pub fn llm_from_config(config: &ResearchConfig) -> Result<DynLlmClient> {
    use crate::config::LlmProvider;
    use crate::llm::{ApiFormat, GenericHttpClient};

    let api_key = config.require_api_key()?;
    let client = match (&config.base_url, config.provider) {
        (None, LlmProvider::OpenAI) => GenericHttpClient::openai(api_key, &config.model)?,
        (None, LlmProvider::Anthropic) => GenericHttpClient::anthropic(api_key, &config.model)?,
        (Some(base_url), provider) => {
            let format = match provider {
                LlmProvider::OpenAI => ApiFormat::OpenAI,
                LlmProvider::Anthropic => ApiFormat::Anthropic,
            };
            GenericHttpClient::new(base_url, api_key, &config.model, format)?
        }
    };
    Ok(Arc::new(client))
}

/// Firecrawl when a key is configured, placeholder results otherwise.
#[cfg(feature = "http-clients")]
pub fn toolkit_from_config(config: &ResearchConfig) -> Result<Toolkit> {
    use crate::tools::FirecrawlSearch;
    use tracing::warn;

    match &config.firecrawl_api_key {
        Some(key) => Ok(Toolkit::new(Arc::new(FirecrawlSearch::new(key)?))),
        None => {
            warn!("FIRECRAWL_API_KEY not set, web research uses placeholder results");
            Ok(Toolkit::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::llm::{LlmClient, LlmRequest, LlmResponse};
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl LlmClient for Silent {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
            Err(FlowError::Llm("offline".into()))
        }

        fn describe(&self) -> String {
            "silent".into()
        }
    }

    #[test]
    fn graph_wiring() {
        let flow = research_flow(&ResearchServices::new(Arc::new(Silent))).unwrap();
        assert_eq!(flow.start(), PLANNER);
        assert_eq!(flow.successor(PLANNER, "default"), Some(SUPERVISOR));
        assert_eq!(flow.successor(SUPERVISOR, "research"), Some(WEB_RESEARCH));
        assert_eq!(flow.successor(WEB_RESEARCH, "default"), Some(SUPERVISOR));
        assert_eq!(flow.successor(SUPERVISOR, "needs_revision"), Some(PLANNER));
        assert_eq!(flow.successor(SUPERVISOR, "review"), Some(APPROVAL));
        assert_eq!(flow.successor(APPROVAL, "rejected"), Some(PLANNER));
        assert_eq!(flow.successor(APPROVAL, "approved"), None);
    }

    #[test]
    fn batch_state_lists_queries() {
        let shared = batch_state(&["a", "b"]);
        assert_eq!(
            shared.get(QUERIES),
            Some(&serde_json::json!(["a", "b"]))
        );
        assert_eq!(initial_state("a").get_str(QUERY), Some("a"));
    }
}
