use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::state::SharedState;

use super::action::Action;
use super::node::{DynRunnable, Runnable};

/// Action a batch returns when at least one item was skipped.
pub const PARTIAL_ACTION: &str = "partial";

/// Key holding the position of the item being processed in a per-item state.
pub const BATCH_INDEX_KEY: &str = "batch_index";

/// What a failing item does to the rest of the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchFailurePolicy {
    /// Stop at the first failing item and return its error.
    #[default]
    AbortBatch,
    /// Record the failure, store `null` as the item's result and continue.
    SkipItem,
}

/// Where an item's result comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchResult {
    /// The item run's final action label, as a string.
    Action,
    /// The value the item run left under this state key.
    StateKey(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchItemOutcome {
    pub index: usize,
    pub item: Value,
    pub action: Option<Action>,
    pub result: Value,
    pub error: Option<String>,
}

impl BatchItemOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 批处理 Flow
///
/// Runs a wrapped runnable once per element of a list in the shared state.
/// Each item gets its own copy of the parent state with the item bound under
/// `item_key`, so items never observe each other's writes. Results land in
/// the parent state as an array under `results_key`, in source order.
pub struct BatchFlow {
    name: String,
    inner: DynRunnable,
    items_key: String,
    item_key: String,
    results_key: String,
    result: BatchResult,
    on_failure: BatchFailurePolicy,
}

impl BatchFlow {
    pub fn new(name: impl Into<String>, inner: DynRunnable) -> Self {
        Self {
            name: name.into(),
            inner,
            items_key: "queries".to_string(),
            item_key: "query".to_string(),
            results_key: "results".to_string(),
            result: BatchResult::Action,
            on_failure: BatchFailurePolicy::default(),
        }
    }

    pub fn items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    pub fn item_key(mut self, key: impl Into<String>) -> Self {
        self.item_key = key.into();
        self
    }

    pub fn results_key(mut self, key: impl Into<String>) -> Self {
        self.results_key = key.into();
        self
    }

    /// Collect the value each item run leaves under `key` instead of its
    /// final action.
    pub fn result_from(mut self, key: impl Into<String>) -> Self {
        self.result = BatchResult::StateKey(key.into());
        self
    }

    pub fn on_item_failure(mut self, policy: BatchFailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run_batch(&self, shared: &mut SharedState) -> Result<Vec<BatchItemOutcome>> {
        let items: Vec<Value> = shared.require(&self.items_key)?;
        info!(batch = %self.name, items = items.len(), "batch started");

        let mut template = shared.clone();
        template.remove(&self.results_key);

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut item_state = template.clone();
            item_state.insert(self.item_key.clone(), item.clone());
            item_state.set(BATCH_INDEX_KEY, index)?;

            match self.inner.run(&mut item_state).await {
                Ok(action) => {
                    let result = match &self.result {
                        BatchResult::Action => Value::String(action.to_string()),
                        BatchResult::StateKey(key) => {
                            item_state.remove(key).unwrap_or(Value::Null)
                        }
                    };
                    outcomes.push(BatchItemOutcome {
                        index,
                        item,
                        action: Some(action),
                        result,
                        error: None,
                    });
                }
                Err(error) => match self.on_failure {
                    BatchFailurePolicy::AbortBatch => {
                        warn!(batch = %self.name, index, error = %error, "item failed, aborting batch");
                        self.store_results(shared, &outcomes);
                        return Err(error);
                    }
                    BatchFailurePolicy::SkipItem => {
                        warn!(batch = %self.name, index, error = %error, "item failed, skipping");
                        outcomes.push(BatchItemOutcome {
                            index,
                            item,
                            action: None,
                            result: Value::Null,
                            error: Some(error.to_string()),
                        });
                    }
                },
            }
        }

        self.store_results(shared, &outcomes);
        info!(
            batch = %self.name,
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            failed = outcomes.iter().filter(|o| !o.is_success()).count(),
            "batch finished"
        );
        Ok(outcomes)
    }

    fn store_results(&self, shared: &mut SharedState, outcomes: &[BatchItemOutcome]) {
        let results = outcomes.iter().map(|o| o.result.clone()).collect();
        shared.insert(self.results_key.clone(), Value::Array(results));
    }
}

#[async_trait]
impl Runnable for BatchFlow {
    async fn run(&self, shared: &mut SharedState) -> Result<Action> {
        let outcomes = self.run_batch(shared).await?;
        if outcomes.iter().all(BatchItemOutcome::is_success) {
            Ok(Action::default())
        } else {
            Ok(Action::new(PARTIAL_ACTION))
        }
    }
}

impl std::fmt::Debug for BatchFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFlow")
            .field("name", &self.name)
            .field("items_key", &self.items_key)
            .field("item_key", &self.item_key)
            .field("results_key", &self.results_key)
            .field("result", &self.result)
            .field("on_failure", &self.on_failure)
            .finish()
    }
}
