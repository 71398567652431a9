use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{Chart, ChartRequest, CodeRun, SearchHit};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    WebResearch,
    DataAnalysis,
    CodeExecution,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [
        TaskKind::WebResearch,
        TaskKind::DataAnalysis,
        TaskKind::CodeExecution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::WebResearch => "web_research",
            TaskKind::DataAnalysis => "data_analysis",
            TaskKind::CodeExecution => "code_execution",
        }
    }

    /// Parameter list every task of this kind has to carry.
    pub fn required_parameter(self) -> &'static str {
        match self {
            TaskKind::WebResearch => "search_terms",
            TaskKind::DataAnalysis => "data_sources",
            TaskKind::CodeExecution => "code_requirements",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParameters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_requirements: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub description: String,
    #[serde(default)]
    pub parameters: TaskParameters,
}

impl Task {
    /// Search terms to use, falling back to the description.
    pub fn search_terms(&self) -> Vec<String> {
        if self.parameters.search_terms.is_empty() {
            vec![self.description.clone()]
        } else {
            self.parameters.search_terms.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub task: String,
    pub term: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub implications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visualizations: Vec<ChartRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub code: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodeExecutionRecord {
    pub task: String,
    pub code: String,
    pub explanation: String,
    pub run: CodeRun,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSource {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub executive_summary: String,
    #[serde(default)]
    pub detailed_findings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visualizations: Vec<Chart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ReportSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub approved: bool,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Outcome of the human checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            feedback: None,
        }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: Some(feedback.into()),
        }
    }
}
