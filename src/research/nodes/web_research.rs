use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::flow::{Action, Node, RetryPolicy};
use crate::research::keys::WEB_RESEARCH_RESULTS;
use crate::research::model::{ResearchFinding, Task, TaskKind};
use crate::state::SharedState;
use crate::tools::{DynWebSearch, SearchHit};

use super::{drop_pending, pending_of};

/// Runs every search term of the pending web research tasks.
///
/// Each term is retried on its own. A term whose retries run out is
/// recorded with no hits so the report can still be written from the other
/// terms and what the model knows.
pub struct WebResearchNode {
    search: DynWebSearch,
    max_results: usize,
    retry: RetryPolicy,
}

impl WebResearchNode {
    pub fn new(search: DynWebSearch, max_results: usize) -> Self {
        Self {
            search,
            max_results: max_results.max(1),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn search_term(&self, term: &str) -> Result<Vec<SearchHit>> {
        let search = &self.search;
        let max_results = self.max_results;
        self.retry
            .run("web_research", move |_| search.search(term, max_results))
            .await
    }
}

#[async_trait]
impl Node for WebResearchNode {
    type Prep = Vec<Task>;
    type Exec = Vec<ResearchFinding>;

    async fn prep(&self, shared: &SharedState) -> Result<Vec<Task>> {
        pending_of(shared, TaskKind::WebResearch)
    }

    async fn exec(&self, tasks: &Vec<Task>) -> Result<Vec<ResearchFinding>> {
        let mut findings = Vec::new();
        for task in tasks {
            for term in task.search_terms() {
                let hits = match self.search_term(&term).await {
                    Ok(hits) => {
                        info!(term = %term, hits = hits.len(), "search done");
                        hits
                    }
                    Err(error) => {
                        warn!(term = %term, error = %error, "search failed, continuing without hits");
                        Vec::new()
                    }
                };
                findings.push(ResearchFinding {
                    task: task.description.clone(),
                    term,
                    hits,
                });
            }
        }
        Ok(findings)
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _tasks: Vec<Task>,
        findings: Vec<ResearchFinding>,
    ) -> Result<Action> {
        if !shared.contains(WEB_RESEARCH_RESULTS) {
            shared.set(WEB_RESEARCH_RESULTS, Vec::<ResearchFinding>::new())?;
        }
        for finding in findings {
            shared.push(WEB_RESEARCH_RESULTS, finding)?;
        }
        drop_pending(shared, TaskKind::WebResearch)?;
        Ok(Action::default())
    }
}
