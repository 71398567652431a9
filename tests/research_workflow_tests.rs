use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use researchflow::research::keys::{
    APPROVAL, CODE_EXECUTION_RESULTS, FINAL_REPORT, REVISIONS, SUPERVISOR_FEEDBACK,
    VISUALIZATIONS, WEB_RESEARCH_RESULTS,
};
use researchflow::research::{
    batch_state, initial_state, ApprovalDecision, CodeExecutionRecord, ResearchFinding,
};
use researchflow::tools::{Chart, CodeRun, CodeRunner, SearchHit};
use researchflow::{
    batch_research_flow, research_flow, ApprovalGate, BatchFailurePolicy, FlowError,
    FlowExecutor, LlmClient, LlmRequest, LlmResponse, Report, ResearchOptions, ResearchServices,
    RetryPolicy, Toolkit, WebSearch,
};

const PLAN: &str = "Here is the plan:\n```yaml\ntasks:\n  - type: web_research\n    description: Market size\n    parameters:\n      search_terms:\n        - ev sales 2024\n        - ev incentives\n  - type: code_execution\n    description: Plot growth\n    parameters:\n      code_requirements:\n        - line chart of sales\n```";
const EMPTY_PLAN: &str = "```yaml\ntasks: []\n```";
const ANALYSIS: &str = "```yaml\nanalysis:\n  key_findings:\n    - Sales doubled\n  implications:\n    - Grid demand rises\n  visualizations:\n    - type: line\n      data_source: sales\n      purpose: growth trend\n      priority: 1\n```";
const CODE: &str = "```yaml\ncode: |\n  output = 42\nexplanation: computes the answer\n```";
const REPORT: &str = "```yaml\nreport:\n  executive_summary: EVs are growing fast.\n  detailed_findings:\n    - Sales doubled\n  recommendations:\n    - Expand charging\n```";
const APPROVE: &str = "```yaml\ndecision:\n  approved: true\n  confidence: 0.9\n```";
const REJECT: &str = "```yaml\ndecision:\n  approved: false\n  feedback: add sources\n```";

/// Answers by prompt kind. Each kind has a reply queue whose last entry
/// repeats once the others are used up.
struct ScriptedLlm {
    replies: Mutex<HashMap<&'static str, Vec<&'static str>>>,
    prompts: Mutex<Vec<(&'static str, String)>>,
}

impl ScriptedLlm {
    fn new(review: Vec<&'static str>) -> Self {
        Self::with_planner(vec![PLAN], review)
    }

    fn with_planner(planner: Vec<&'static str>, review: Vec<&'static str>) -> Self {
        let replies = HashMap::from([
            ("planner", planner),
            ("analysis", vec![ANALYSIS]),
            ("code", vec![CODE]),
            ("reporter", vec![REPORT]),
            ("review", review),
        ]);
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn kind(prompt: &str) -> &'static str {
        if prompt.starts_with("Break down") {
            "planner"
        } else if prompt.starts_with("Analyze") {
            "analysis"
        } else if prompt.starts_with("Generate Python") {
            "code"
        } else if prompt.starts_with("Write a research report") {
            "reporter"
        } else {
            "review"
        }
    }

    fn prompts_of(&self, kind: &str) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: LlmRequest) -> researchflow::Result<LlmResponse> {
        let kind = Self::kind(&request.user);
        self.prompts.lock().push((kind, request.user.clone()));
        let mut replies = self.replies.lock();
        let queue = replies
            .get_mut(kind)
            .ok_or_else(|| FlowError::Llm(format!("no script for {kind}")))?;
        let reply = if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue[0]
        };
        Ok(LlmResponse {
            content: reply.to_string(),
            metadata: None,
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Default)]
struct RecordingSearch {
    terms: Mutex<Vec<String>>,
}

#[async_trait]
impl WebSearch for RecordingSearch {
    async fn search(&self, query: &str, max_results: usize) -> researchflow::Result<Vec<SearchHit>> {
        self.terms.lock().push(query.to_string());
        Ok((0..max_results.min(2))
            .map(|i| SearchHit {
                title: format!("{query} #{i}"),
                url: format!("https://example.org/{i}"),
                description: "numbers".to_string(),
                content: None,
            })
            .collect())
    }
}

#[derive(Default)]
struct DownSearch {
    calls: Mutex<u32>,
}

#[async_trait]
impl WebSearch for DownSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> researchflow::Result<Vec<SearchHit>> {
        *self.calls.lock() += 1;
        Err(FlowError::Search("503 service unavailable".to_string()))
    }
}

struct CrashingRunner;

#[async_trait]
impl CodeRunner for CrashingRunner {
    async fn run(&self, _language: &str, _code: &str) -> researchflow::Result<CodeRun> {
        Err(FlowError::Other(anyhow::anyhow!("sandbox crashed")))
    }
}

struct ScriptedApproval {
    decisions: Mutex<Vec<ApprovalDecision>>,
}

#[async_trait]
impl ApprovalGate for ScriptedApproval {
    async fn review(&self, _query: &str, _report: &Report) -> researchflow::Result<ApprovalDecision> {
        let mut decisions = self.decisions.lock();
        if decisions.len() > 1 {
            Ok(decisions.remove(0))
        } else {
            Ok(decisions[0].clone())
        }
    }
}

fn options(max_revisions: u32) -> ResearchOptions {
    ResearchOptions {
        retry: RetryPolicy::new(2, Duration::ZERO),
        max_revisions,
        max_search_results: 3,
    }
}

fn services(llm: &Arc<ScriptedLlm>, search: &Arc<RecordingSearch>, max_revisions: u32) -> ResearchServices {
    ResearchServices::new(llm.clone())
        .with_tools(Toolkit::new(search.clone()))
        .with_options(options(max_revisions))
}

#[tokio::test]
async fn full_run_visits_every_stage() {
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let flow = research_flow(&services(&llm, &search, 2)).unwrap();

    let mut shared = initial_state("How fast is EV adoption growing?");
    let execution = FlowExecutor::new(flow).start(&mut shared).await.unwrap();

    assert_eq!(
        execution.visited,
        vec![
            "planner",
            "supervisor",
            "web_research",
            "supervisor",
            "data_analysis",
            "supervisor",
            "code_executor",
            "supervisor",
            "visualization",
            "supervisor",
            "reporter",
            "supervisor",
            "approval",
        ]
    );
    assert_eq!(execution.action, "approved");
    assert_eq!(*search.terms.lock(), vec!["ev sales 2024", "ev incentives"]);

    let findings: Vec<ResearchFinding> = shared.require(WEB_RESEARCH_RESULTS).unwrap();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].hits.len(), 2);

    let code: Vec<CodeExecutionRecord> = shared.require(CODE_EXECUTION_RESULTS).unwrap();
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].code.trim(), "output = 42");
    assert!(!code[0].run.executed);

    let charts: Vec<Chart> = shared.require(VISUALIZATIONS).unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].kind, "line");

    let report: Report = shared.require(FINAL_REPORT).unwrap();
    assert_eq!(report.executive_summary, "EVs are growing fast.");
    assert_eq!(report.visualizations, charts);

    let approval: ApprovalDecision = shared.require(APPROVAL).unwrap();
    assert!(approval.approved);

    let analysis_prompt = &llm.prompts_of("analysis")[0];
    assert!(analysis_prompt.contains("ev sales 2024 #0"));
}

#[tokio::test]
async fn rejected_review_replans_with_feedback() {
    let llm = Arc::new(ScriptedLlm::new(vec![REJECT, APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let flow = research_flow(&services(&llm, &search, 2)).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    let planner_prompts = llm.prompts_of("planner");
    assert_eq!(planner_prompts.len(), 2);
    assert!(!planner_prompts[0].contains("add sources"));
    assert!(planner_prompts[1].contains("add sources"));
    assert_eq!(shared.get_as::<u32>(REVISIONS).unwrap(), Some(1));
    assert!(!shared.contains(SUPERVISOR_FEEDBACK));
    // the second pass searched again from scratch
    let findings: Vec<ResearchFinding> = shared.require(WEB_RESEARCH_RESULTS).unwrap();
    assert_eq!(findings.len(), 2);
}

#[tokio::test]
async fn revision_limit_forwards_the_report() {
    let llm = Arc::new(ScriptedLlm::new(vec![REJECT]));
    let search = Arc::new(RecordingSearch::default());
    let flow = research_flow(&services(&llm, &search, 1)).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    assert_eq!(llm.prompts_of("planner").len(), 2);
    assert_eq!(llm.prompts_of("review").len(), 2);
    assert_eq!(shared.get_as::<u32>(REVISIONS).unwrap(), Some(1));
}

#[tokio::test]
async fn human_rejection_goes_back_to_planner() {
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let gate = Arc::new(ScriptedApproval {
        decisions: Mutex::new(vec![
            ApprovalDecision::reject("needs regional split"),
            ApprovalDecision::approve(),
        ]),
    });
    let flow = research_flow(&services(&llm, &search, 0).with_approval(gate)).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    let approvals = execution
        .visited
        .iter()
        .filter(|node| node.as_str() == "approval")
        .count();
    assert_eq!(approvals, 2);
    assert!(llm.prompts_of("planner")[1].contains("needs regional split"));
    assert_eq!(shared.get_as::<u32>(REVISIONS).unwrap(), Some(1));
}

#[tokio::test]
async fn invalid_plan_is_retried() {
    let llm = Arc::new(ScriptedLlm::with_planner(vec![EMPTY_PLAN, PLAN], vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let flow = research_flow(&services(&llm, &search, 2)).unwrap();

    let execution = flow.execute(&mut initial_state("EV adoption")).await.unwrap();
    assert_eq!(execution.action, "approved");
    assert_eq!(llm.prompts_of("planner").len(), 2);
}

#[tokio::test]
async fn planning_failure_names_the_planner() {
    let llm = Arc::new(ScriptedLlm::with_planner(vec![EMPTY_PLAN], vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let flow = research_flow(&services(&llm, &search, 2)).unwrap();

    let err = flow
        .execute(&mut initial_state("EV adoption"))
        .await
        .unwrap_err();
    assert_eq!(err.node(), Some("planner"));
    assert!(err.to_string().contains("task list is empty"));
    assert_eq!(llm.prompts_of("planner").len(), 2);
}

#[tokio::test]
async fn batch_collects_one_report_per_query() {
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let batch = batch_research_flow(&services(&llm, &search, 2), BatchFailurePolicy::AbortBatch)
        .unwrap();

    let mut shared = batch_state(&["EV adoption", "Heat pumps"]);
    let outcomes = batch.run_batch(&mut shared).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    let reports: Vec<Report> = shared.require("results").unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].executive_summary, "EVs are growing fast.");

    let planner_prompts = llm.prompts_of("planner");
    assert!(planner_prompts[0].contains("EV adoption"));
    assert!(planner_prompts[1].contains("Heat pumps"));
}

#[tokio::test]
async fn search_outage_still_produces_a_report() {
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE]));
    let search = Arc::new(DownSearch::default());
    let services = ResearchServices::new(llm.clone())
        .with_tools(Toolkit::new(search.clone()))
        .with_options(options(2));
    let flow = research_flow(&services).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    // two terms, two attempts each
    assert_eq!(*search.calls.lock(), 4);
    let findings: Vec<ResearchFinding> = shared.require(WEB_RESEARCH_RESULTS).unwrap();
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|finding| finding.hits.is_empty()));
    assert!(shared.contains(FINAL_REPORT));
}

#[tokio::test]
async fn code_runner_error_is_recorded() {
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE]));
    let search = Arc::new(RecordingSearch::default());
    let services = ResearchServices::new(llm.clone())
        .with_tools(Toolkit::new(search.clone()).with_code_runner(Arc::new(CrashingRunner)))
        .with_options(options(2));
    let flow = research_flow(&services).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    let code: Vec<CodeExecutionRecord> = shared.require(CODE_EXECUTION_RESULTS).unwrap();
    assert_eq!(code.len(), 1);
    assert!(!code[0].run.success);
    assert!(!code[0].run.executed);
    assert_eq!(code[0].run.error.as_deref(), Some("sandbox crashed"));
}

#[tokio::test]
async fn human_rejection_counts_toward_revision_limit() {
    // the supervisor approves the first report and rejects every later one
    let llm = Arc::new(ScriptedLlm::new(vec![APPROVE, REJECT]));
    let search = Arc::new(RecordingSearch::default());
    let gate = Arc::new(ScriptedApproval {
        decisions: Mutex::new(vec![
            ApprovalDecision::reject("needs regional split"),
            ApprovalDecision::approve(),
        ]),
    });
    let flow = research_flow(&services(&llm, &search, 1).with_approval(gate)).unwrap();

    let mut shared = initial_state("EV adoption");
    let execution = flow.execute(&mut shared).await.unwrap();

    assert_eq!(execution.action, "approved");
    // the second review is over the limit, so its rejection is forwarded
    assert_eq!(llm.prompts_of("planner").len(), 2);
    assert_eq!(llm.prompts_of("review").len(), 2);
    assert_eq!(shared.get_as::<u32>(REVISIONS).unwrap(), Some(1));
}
