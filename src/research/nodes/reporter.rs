use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::llm::DynLlmClient;
use crate::research::keys::{
    ANALYSIS_RESULTS, CODE_EXECUTION_RESULTS, FINAL_REPORT, QUERY, VISUALIZATIONS,
    WEB_RESEARCH_RESULTS,
};
use crate::research::model::{Analysis, CodeExecutionRecord, Report, ResearchFinding};
use crate::research::prompts;
use crate::state::SharedState;
use crate::tools::Chart;

use super::{ask_section, summarize_findings};

/// Writes the final report from everything gathered so far.
pub struct ReporterNode {
    llm: DynLlmClient,
}

impl ReporterNode {
    pub fn new(llm: DynLlmClient) -> Self {
        Self { llm }
    }
}

pub struct ReporterInput {
    pub query: String,
    pub analysis: Analysis,
    pub research: String,
    pub code_results: String,
    pub charts: Vec<Chart>,
}

#[async_trait]
impl Node for ReporterNode {
    type Prep = ReporterInput;
    type Exec = Report;

    async fn prep(&self, shared: &SharedState) -> Result<ReporterInput> {
        let findings: Vec<ResearchFinding> =
            shared.get_as(WEB_RESEARCH_RESULTS)?.unwrap_or_default();
        let code: Vec<CodeExecutionRecord> =
            shared.get_as(CODE_EXECUTION_RESULTS)?.unwrap_or_default();
        let code_results = if code.is_empty() {
            "(none)".to_string()
        } else {
            serde_yaml::to_string(&code)?
        };
        Ok(ReporterInput {
            query: shared.require(QUERY)?,
            analysis: shared.get_as(ANALYSIS_RESULTS)?.unwrap_or_default(),
            research: summarize_findings(&findings),
            code_results,
            charts: shared.get_as(VISUALIZATIONS)?.unwrap_or_default(),
        })
    }

    async fn exec(&self, input: &ReporterInput) -> Result<Report> {
        let charts = if input.charts.is_empty() {
            "(none)".to_string()
        } else {
            serde_yaml::to_string(&input.charts)?
        };
        let prompt = prompts::reporter(
            &input.query,
            &input.analysis,
            &input.research,
            &input.code_results,
            &charts,
        );
        ask_section(self.llm.as_ref(), prompt, "report").await
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        input: ReporterInput,
        mut report: Report,
    ) -> Result<Action> {
        if report.visualizations.is_empty() {
            report.visualizations = input.charts;
        }
        info!(
            findings = report.detailed_findings.len(),
            sources = report.sources.len(),
            "report written"
        );
        shared.set(FINAL_REPORT, report)?;
        Ok(Action::default())
    }
}
