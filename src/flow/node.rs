use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FlowError, Result};
use crate::state::SharedState;

use super::action::Action;
use super::retry::RetryPolicy;

/// 节点
///
/// A unit of work run in three phases against the shared state:
///
/// 1. `prep` reads what the node needs. It only gets a shared reference.
/// 2. `exec` performs the domain action (LLM call, search, human prompt).
///    This is the only phase that is retried.
/// 3. `post` writes results back and returns the action label that picks
///    the next node.
///
/// `exec_fallback` runs once `exec` has failed for the last time. Its `Ok`
/// value is used as if `exec` had produced it; the default re-raises.
#[async_trait]
pub trait Node: Send + Sync {
    type Prep: Send + Sync;
    type Exec: Send;

    async fn prep(&self, shared: &SharedState) -> Result<Self::Prep>;

    async fn exec(&self, prep: &Self::Prep) -> Result<Self::Exec>;

    async fn exec_fallback(&self, _prep: &Self::Prep, error: FlowError) -> Result<Self::Exec> {
        Err(error)
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        prep: Self::Prep,
        exec: Self::Exec,
    ) -> Result<Action>;
}

/// Anything a flow can place at a graph position: a wrapped [`Node`], a
/// nested [`Flow`](super::Flow) or a [`BatchFlow`](super::BatchFlow).
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run(&self, shared: &mut SharedState) -> Result<Action>;
}

pub type DynRunnable = Arc<dyn Runnable>;

#[async_trait]
impl<R: Runnable + ?Sized> Runnable for Arc<R> {
    async fn run(&self, shared: &mut SharedState) -> Result<Action> {
        (**self).run(shared).await
    }
}

/// 叶子节点包装
///
/// Drives a [`Node`] through its phases and applies the retry policy to
/// `exec`.
pub struct Step<N> {
    node: N,
    retry: RetryPolicy,
}

impl<N: Node> Step<N> {
    pub fn new(node: N) -> Self {
        Self {
            node,
            retry: RetryPolicy::none(),
        }
    }

    /// `max_attempts` counts the first call too.
    pub fn with_retry(mut self, max_attempts: u32, wait: Duration) -> Self {
        self.retry = RetryPolicy::new(max_attempts, wait);
        self
    }

    pub fn with_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn inner(&self) -> &N {
        &self.node
    }

    fn label() -> &'static str {
        let full = std::any::type_name::<N>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

#[async_trait]
impl<N: Node> Runnable for Step<N> {
    async fn run(&self, shared: &mut SharedState) -> Result<Action> {
        let prep = self.node.prep(shared).await?;
        let node = &self.node;
        let prep_ref = &prep;
        let outcome = self
            .retry
            .run(Self::label(), move |_| node.exec(prep_ref))
            .await;
        let exec = match outcome {
            Ok(exec) => exec,
            Err(error) => self.node.exec_fallback(&prep, error).await?,
        };
        self.node.post(shared, prep, exec).await
    }
}

/// 函数节点
///
/// Glue node built from a synchronous closure over the shared state, for
/// routing and bookkeeping steps that call no collaborator.
pub struct FnNode<F> {
    func: F,
}

pub fn node_fn<F>(func: F) -> FnNode<F>
where
    F: Fn(&mut SharedState) -> Result<Action> + Send + Sync,
{
    FnNode { func }
}

#[async_trait]
impl<F> Runnable for FnNode<F>
where
    F: Fn(&mut SharedState) -> Result<Action> + Send + Sync,
{
    async fn run(&self, shared: &mut SharedState) -> Result<Action> {
        (self.func)(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Flaky {
        failures: u32,
        calls: Mutex<u32>,
        fallback: Option<&'static str>,
    }

    #[async_trait]
    impl Node for Flaky {
        type Prep = String;
        type Exec = String;

        async fn prep(&self, shared: &SharedState) -> Result<String> {
            shared.require("input")
        }

        async fn exec(&self, prep: &String) -> Result<String> {
            let count = {
                let mut calls = self.calls.lock();
                *calls += 1;
                *calls
            };
            if count <= self.failures {
                Err(FlowError::Llm(format!("failure {count}")))
            } else {
                Ok(prep.to_uppercase())
            }
        }

        async fn exec_fallback(&self, prep: &String, error: FlowError) -> Result<String> {
            match self.fallback {
                Some(value) => Ok(format!("{value}:{prep}")),
                None => Err(error),
            }
        }

        async fn post(&self, shared: &mut SharedState, _prep: String, exec: String) -> Result<Action> {
            shared.set("output", exec)?;
            Ok(Action::default())
        }
    }

    fn state() -> SharedState {
        let mut shared = SharedState::new();
        shared.set("input", "abc").unwrap();
        shared
    }

    #[tokio::test]
    async fn retries_until_exec_succeeds() {
        let step = Step::new(Flaky {
            failures: 2,
            calls: Mutex::new(0),
            fallback: None,
        })
        .with_retry(3, Duration::ZERO);
        let mut shared = state();
        let action = step.run(&mut shared).await.unwrap();
        assert!(action.is_default());
        assert_eq!(shared.get_str("output"), Some("ABC"));
        assert_eq!(*step.inner().calls.lock(), 3);
    }

    #[tokio::test]
    async fn fallback_replaces_exhausted_failure() {
        let step = Step::new(Flaky {
            failures: u32::MAX,
            calls: Mutex::new(0),
            fallback: Some("fallback"),
        })
        .with_retry(4, Duration::ZERO);
        let mut shared = state();
        step.run(&mut shared).await.unwrap();
        assert_eq!(*step.inner().calls.lock(), 4);
        assert_eq!(shared.get_str("output"), Some("fallback:abc"));
    }

    #[tokio::test]
    async fn failure_propagates_without_fallback() {
        let step = Step::new(Flaky {
            failures: u32::MAX,
            calls: Mutex::new(0),
            fallback: None,
        });
        let mut shared = state();
        let err = step.run(&mut shared).await.unwrap_err();
        assert!(matches!(err, FlowError::Llm(_)));
        assert_eq!(*step.inner().calls.lock(), 1);
        assert!(!shared.contains("output"));
    }

    #[tokio::test]
    async fn fn_node_mutates_state() {
        let node = node_fn(|shared: &mut SharedState| {
            shared.set("seen", true)?;
            Ok(Action::new("done"))
        });
        let mut shared = SharedState::new();
        assert_eq!(node.run(&mut shared).await.unwrap(), "done");
        assert_eq!(shared.get("seen"), Some(&serde_json::Value::Bool(true)));
    }
}
