use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::llm::DynLlmClient;
use crate::research::keys::{ANALYSIS_RESULTS, QUERY, WEB_RESEARCH_RESULTS};
use crate::research::model::{Analysis, ResearchFinding, Task, TaskKind};
use crate::research::prompts;
use crate::state::SharedState;

use super::{ask_section, drop_pending, pending_of, summarize_findings};

/// Extracts findings, metrics and chart requests from the research results.
pub struct DataAnalysisNode {
    llm: DynLlmClient,
}

impl DataAnalysisNode {
    pub fn new(llm: DynLlmClient) -> Self {
        Self { llm }
    }
}

pub struct AnalysisInput {
    pub query: String,
    pub research: String,
    pub focus: Vec<Task>,
}

#[async_trait]
impl Node for DataAnalysisNode {
    type Prep = AnalysisInput;
    type Exec = Analysis;

    async fn prep(&self, shared: &SharedState) -> Result<AnalysisInput> {
        let findings: Vec<ResearchFinding> =
            shared.get_as(WEB_RESEARCH_RESULTS)?.unwrap_or_default();
        Ok(AnalysisInput {
            query: shared.require(QUERY)?,
            research: summarize_findings(&findings),
            focus: pending_of(shared, TaskKind::DataAnalysis)?,
        })
    }

    async fn exec(&self, input: &AnalysisInput) -> Result<Analysis> {
        let prompt = prompts::data_analysis(&input.query, &input.research, &input.focus);
        ask_section(self.llm.as_ref(), prompt, "analysis").await
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _input: AnalysisInput,
        analysis: Analysis,
    ) -> Result<Action> {
        info!(
            findings = analysis.key_findings.len(),
            charts = analysis.visualizations.len(),
            "analysis ready"
        );
        shared.set(ANALYSIS_RESULTS, analysis)?;
        drop_pending(shared, TaskKind::DataAnalysis)?;
        Ok(Action::default())
    }
}
