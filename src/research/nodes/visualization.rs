use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::flow::{Action, Node};
use crate::research::keys::{ANALYSIS_RESULTS, VISUALIZATIONS};
use crate::research::model::Analysis;
use crate::state::SharedState;
use crate::tools::{Chart, ChartRequest, DynChartRenderer};

/// Renders the charts the analysis asked for, highest priority first.
pub struct VisualizationNode {
    renderer: DynChartRenderer,
}

impl VisualizationNode {
    pub fn new(renderer: DynChartRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Node for VisualizationNode {
    type Prep = Vec<ChartRequest>;
    type Exec = Vec<Chart>;

    async fn prep(&self, shared: &SharedState) -> Result<Vec<ChartRequest>> {
        let analysis: Analysis = shared.get_as(ANALYSIS_RESULTS)?.unwrap_or_default();
        let mut requests = analysis.visualizations;
        requests.sort_by_key(|request| request.priority);
        Ok(requests)
    }

    async fn exec(&self, requests: &Vec<ChartRequest>) -> Result<Vec<Chart>> {
        let mut charts = Vec::with_capacity(requests.len());
        for request in requests {
            match self.renderer.render(request).await {
                Ok(chart) => charts.push(chart),
                Err(error) => warn!(kind = %request.kind, error = %error, "chart skipped"),
            }
        }
        Ok(charts)
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _requests: Vec<ChartRequest>,
        charts: Vec<Chart>,
    ) -> Result<Action> {
        info!(charts = charts.len(), "visualizations ready");
        shared.set(VISUALIZATIONS, charts)?;
        Ok(Action::default())
    }
}
