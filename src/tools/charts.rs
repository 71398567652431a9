use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A chart the analysis asked for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data_source: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    3
}

/// A chart after rendering: where it lives and what it shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, request: &ChartRequest) -> Result<Chart>;
}

pub type DynChartRenderer = Arc<dyn ChartRenderer>;

/// Describes the requested chart without drawing it.
#[derive(Clone, Debug, Default)]
pub struct PlannedCharts;

#[async_trait]
impl ChartRenderer for PlannedCharts {
    async fn render(&self, request: &ChartRequest) -> Result<Chart> {
        let description = if request.data_source.is_empty() {
            request.purpose.clone()
        } else {
            format!("{} (data: {})", request.purpose, request.data_source)
        };
        Ok(Chart {
            kind: request.kind.clone(),
            description,
            location: None,
        })
    }
}
