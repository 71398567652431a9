//! Prompt templates. Each builder fills in its template; replies are
//! expected as a fenced YAML block.

use super::model::{Analysis, Report, Task};

pub const SYSTEM: &str = "You are a meticulous research assistant. Answer with the requested YAML only.";

pub fn planner(query: &str, feedback: Option<&str>) -> String {
    let mut prompt = format!(
        r#"Break down this research query into specific tasks. Return ONLY the YAML structure below, replacing the placeholders with actual values.

Query: {query}

```yaml
tasks:
  - type: web_research
    description: <specific research task>
    parameters:
      search_terms:
        - <search term>
  - type: data_analysis
    description: <specific analysis task>
    parameters:
      data_sources:
        - <data source>
  - type: code_execution
    description: <specific code task>
    parameters:
      code_requirements:
        - <requirement>
```

Rules:
1. Every task needs type, description and parameters.
2. Each type carries its own list: search_terms, data_sources or code_requirements.
3. Leave out task types the query does not need.
"#
    );
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\nA previous attempt was sent back with this feedback, address it:\n{feedback}\n"
        ));
    }
    prompt
}

pub fn data_analysis(query: &str, research: &str, focus: &[Task]) -> String {
    let focus = focus
        .iter()
        .map(|task| {
            let sources = task.parameters.data_sources.join(", ");
            format!("- {} (sources: {sources})", task.description)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Analyze these research results for the query "{query}" and extract structured data.

Research results:
{research}

Analysis tasks:
{focus}

```yaml
analysis:
  key_findings:
    - <finding>
  implications:
    - <implication>
  metrics:
    - name: <metric name>
      value: <numeric value>
      unit: <unit>
      source: <where it came from>
      confidence: <0-1>
  visualizations:
    - type: <chart type>
      data_source: <which data to use>
      purpose: <what it shows>
      priority: <1-5>
  next_steps:
    - <next step>
  confidence_score: <0-1>
```

`analysis` with key_findings and implications is required, include other sections only when data supports them.
"#
    )
}

pub fn code_execution(task: &Task, analysis: &str) -> String {
    let requirements = task.parameters.code_requirements.join("\n- ");
    format!(
        r#"Generate Python code for this task: {description}
Requirements:
- {requirements}

Context from analysis:
{analysis}

Return ONLY this YAML:
```yaml
code: |
  # valid Python, set an `output` variable with the result
explanation: |
  <what the code does>
language: python
```
"#,
        description = task.description,
    )
}

pub fn reporter(
    query: &str,
    analysis: &Analysis,
    research: &str,
    code_results: &str,
    charts: &str,
) -> String {
    let analysis = serde_yaml::to_string(analysis).unwrap_or_default();
    format!(
        r#"Write a research report answering: {query}

Analysis:
{analysis}
Code execution results:
{code_results}
Web research:
{research}
Visualizations:
{charts}

```yaml
report:
  executive_summary: |
    <summary>
  detailed_findings:
    - <finding>
  recommendations:
    - <recommendation>
  sources:
    - url: <source url>
      description: <what it provided>
  next_steps:
    - <next step>
```
"#
    )
}

pub fn review(query: &str, report: &Report) -> String {
    let report = serde_yaml::to_string(report).unwrap_or_default();
    format!(
        r#"Review this research report on "{query}" and decide whether it meets quality standards.

{report}
Return your decision:
```yaml
decision:
  approved: true/false
  feedback: <what to fix when not approved>
  confidence: <0-1>
```
"#
    )
}
