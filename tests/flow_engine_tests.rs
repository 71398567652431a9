use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use researchflow::{
    node_fn, Action, Flow, FlowError, FlowExecutor, Node, Runnable, SharedState, Step,
};

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(name: &'static str, log: &Log, action: &'static str) -> impl Runnable {
    let log = Arc::clone(log);
    node_fn(move |_: &mut SharedState| {
        log.lock().push(name.to_string());
        Ok(Action::new(action))
    })
}

/// Fails `failures` times, then succeeds and stores the attempt count.
struct FlakyNode {
    failures: u32,
    calls: Arc<Mutex<u32>>,
}

#[async_trait]
impl Node for FlakyNode {
    type Prep = ();
    type Exec = u32;

    async fn prep(&self, _shared: &SharedState) -> researchflow::Result<()> {
        Ok(())
    }

    async fn exec(&self, _prep: &()) -> researchflow::Result<u32> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };
        if call <= self.failures {
            Err(FlowError::Llm(format!("attempt {call} failed")))
        } else {
            Ok(call)
        }
    }

    async fn post(
        &self,
        shared: &mut SharedState,
        _prep: (),
        attempts: u32,
    ) -> researchflow::Result<Action> {
        shared.set("attempts", attempts)?;
        Ok(Action::default())
    }
}

#[tokio::test]
async fn linear_chain_runs_in_order() {
    let log: Log = Arc::default();
    let mut builder = Flow::builder("chain");
    builder
        .add_node("a", recorder("a", &log, "default"))
        .add_node("b", recorder("b", &log, "default"))
        .add_node("c", recorder("c", &log, "done"))
        .connect("a", "b")
        .connect("b", "c");
    let flow = builder.build().unwrap();

    let mut shared = SharedState::new();
    let execution = FlowExecutor::new(flow).start(&mut shared).await.unwrap();

    assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    assert_eq!(execution.visited, vec!["a", "b", "c"]);
    assert_eq!(execution.last_node, "c");
    assert_eq!(execution.action, "done");
}

#[tokio::test]
async fn unwired_action_stops_the_run() {
    let log: Log = Arc::default();
    let mut builder = Flow::builder("stop");
    builder
        .add_node("a", recorder("a", &log, "elsewhere"))
        .add_node("b", recorder("b", &log, "default"))
        .connect("a", "b");
    let flow = builder.build().unwrap();

    let execution = flow.execute(&mut SharedState::new()).await.unwrap();
    assert_eq!(execution.steps(), 1);
    assert_eq!(execution.action.as_str(), "elsewhere");
    assert_eq!(*log.lock(), vec!["a"]);
}

#[tokio::test]
async fn self_loop_repeats_until_action_changes() {
    let mut builder = Flow::builder("loop");
    builder
        .add_node(
            "a",
            node_fn(|shared: &mut SharedState| {
                let seen = shared.get_as::<u32>("seen")?.unwrap_or(0) + 1;
                shared.set("seen", seen)?;
                Ok(Action::new(if seen < 2 { "again" } else { "next" }))
            }),
        )
        .add_node("b", node_fn(|_: &mut SharedState| Ok(Action::new("end"))))
        .connect_on("a", "again", "a")
        .connect_on("a", "next", "b");
    let flow = builder.build().unwrap();

    let execution = flow.execute(&mut SharedState::new()).await.unwrap();
    assert_eq!(execution.visited, vec!["a", "a", "b"]);
}

#[tokio::test]
async fn later_nodes_see_earlier_writes() {
    let mut builder = Flow::builder("state");
    builder
        .add_node(
            "writer",
            node_fn(|shared: &mut SharedState| {
                shared.set("greeting", "hello")?;
                Ok(Action::default())
            }),
        )
        .add_node(
            "reader",
            node_fn(|shared: &mut SharedState| {
                let greeting: String = shared.require("greeting")?;
                shared.set("echo", format!("{greeting} back"))?;
                Ok(Action::default())
            }),
        )
        .connect("writer", "reader");

    let mut shared = SharedState::new();
    builder.build().unwrap().execute(&mut shared).await.unwrap();
    assert_eq!(shared.get_str("echo"), Some("hello back"));
}

#[tokio::test]
async fn retry_runs_exec_until_success() {
    let calls = Arc::new(Mutex::new(0));
    let mut builder = Flow::builder("retry");
    builder.add_node(
        "flaky",
        Step::new(FlakyNode {
            failures: 2,
            calls: Arc::clone(&calls),
        })
        .with_retry(3, Duration::ZERO),
    );

    let mut shared = SharedState::new();
    builder.build().unwrap().execute(&mut shared).await.unwrap();
    assert_eq!(*calls.lock(), 3);
    assert_eq!(shared.get_as::<u32>("attempts").unwrap(), Some(3));
}

#[tokio::test]
async fn exhausted_retries_fail_with_node_name() {
    let calls = Arc::new(Mutex::new(0));
    let mut builder = Flow::builder("retry");
    builder.add_node(
        "flaky",
        Step::new(FlakyNode {
            failures: 10,
            calls: Arc::clone(&calls),
        })
        .with_retry(3, Duration::from_millis(1)),
    );

    let err = builder
        .build()
        .unwrap()
        .execute(&mut SharedState::new())
        .await
        .unwrap_err();
    assert_eq!(*calls.lock(), 3);
    assert_eq!(err.node(), Some("flaky"));
    assert!(err.to_string().contains("attempt 3 failed"));
}

#[tokio::test]
async fn nested_flow_action_routes_the_parent() {
    let log: Log = Arc::default();
    let mut inner = Flow::builder("inner");
    inner
        .add_node("x", recorder("x", &log, "default"))
        .add_node("y", recorder("y", &log, "finished"))
        .connect("x", "y");
    let inner = inner.build().unwrap();

    let mut outer = Flow::builder("outer");
    outer
        .add_node("sub", inner)
        .add_node("after", recorder("after", &log, "default"))
        .connect_on("sub", "finished", "after");
    let execution = outer
        .build()
        .unwrap()
        .execute(&mut SharedState::new())
        .await
        .unwrap();

    assert_eq!(*log.lock(), vec!["x", "y", "after"]);
    assert_eq!(execution.visited, vec!["sub", "after"]);
}

#[tokio::test]
async fn nested_failure_names_innermost_node() {
    let mut inner = Flow::builder("inner");
    inner.add_node(
        "broken",
        node_fn(|_: &mut SharedState| Err(FlowError::MissingState("input".into()))),
    );
    let mut outer = Flow::builder("outer");
    outer.add_node("sub", inner.build().unwrap());

    let err = outer
        .build()
        .unwrap()
        .execute(&mut SharedState::new())
        .await
        .unwrap_err();
    assert_eq!(err.node(), Some("broken"));
}

#[tokio::test]
async fn max_steps_bounds_a_cycle() {
    let mut builder = Flow::builder("spin");
    builder
        .add_node("a", node_fn(|_: &mut SharedState| Ok(Action::new("again"))))
        .connect_on("a", "again", "a")
        .with_max_steps(5);

    let err = builder
        .build()
        .unwrap()
        .execute(&mut SharedState::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::MaxStepsExceeded { limit: 5, .. }));
}
