use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unknown node `{0}` in flow")]
    UnknownNode(String),
    #[error("flow `{0}` has no nodes")]
    EmptyFlow(String),
    #[error("shared state key `{0}` is missing")]
    MissingState(String),
    #[error("shared state key `{key}` has an unexpected shape: {reason}")]
    InvalidState { key: String, reason: String },
    #[error("node `{node}` failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: Box<FlowError>,
    },
    #[error("flow `{flow}` exceeded {limit} steps")]
    MaxStepsExceeded { flow: String, limit: usize },
    #[error("llm error: {0}")]
    Llm(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Wraps an error with the name of the node it escaped from.
    ///
    /// Errors that already carry a node name are left alone, so a failure
    /// inside a nested flow reports the innermost node.
    pub fn in_node(self, node: &str) -> Self {
        match self {
            FlowError::NodeFailed { .. } | FlowError::MaxStepsExceeded { .. } => self,
            other => FlowError::NodeFailed {
                node: node.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the node that raised this error, if known.
    pub fn node(&self) -> Option<&str> {
        match self {
            FlowError::NodeFailed { node, .. } => Some(node),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for FlowError {
    fn from(err: serde_yaml::Error) -> Self {
        FlowError::Parse(err.to_string())
    }
}
