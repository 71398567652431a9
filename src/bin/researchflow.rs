use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use researchflow::cli::{describe_flows, render, NoLlm, OutputFormat, SAMPLE_QUERIES};
use researchflow::research::keys::{FINAL_REPORT, RESULTS};
use researchflow::research::{
    batch_research_flow, batch_state, initial_state, llm_from_config, research_flow,
    toolkit_from_config, AutoApprove, ConsoleApproval, DynApprovalGate, Report, ResearchOptions,
    ResearchServices,
};
use researchflow::utils::{ConfigValidator, LoggingConfig};
use researchflow::{
    BatchFailurePolicy, EnvConfig, FlowError, FlowExecutor, FlowRegistry, LlmProvider,
    ResearchConfig,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "researchflow", version, about = "Research workflow runner", author)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Skip the interactive approval prompt.
    #[arg(long, global = true)]
    auto_approve: bool,

    #[arg(long, global = true)]
    max_revisions: Option<u32>,

    #[arg(long, global = true)]
    provider: Option<LlmProvider>,

    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,

    /// Write the output here instead of stdout.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[arg(long, global = true, env = "RESEARCHFLOW_ENV_FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Research a single query.
    Run { query: String },
    /// Research several queries one after another.
    Batch {
        #[arg(required = true)]
        queries: Vec<String>,
        /// Keep going when a query fails.
        #[arg(long)]
        skip_failures: bool,
    },
    /// Print the wiring of the research flows.
    Graph,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    EnvConfig::load_dotenv(cli.env_file.as_deref())?;
    LoggingConfig::init();

    let mut config = ResearchConfig::from_env()?;
    if let Some(provider) = cli.provider {
        config = config.with_provider(provider);
    }
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }
    if let Some(max_revisions) = cli.max_revisions {
        config.max_revisions = max_revisions;
    }
    config.auto_approve |= cli.auto_approve;

    let content = match &cli.command {
        Some(Command::Graph) => handle_graph(&config, cli.format)?,
        Some(Command::Run { query }) => handle_run(&config, query, cli.format).await?,
        Some(Command::Batch {
            queries,
            skip_failures,
        }) => handle_batch(&config, queries, *skip_failures, cli.format).await?,
        None if config.batch_mode => {
            handle_batch(&config, &SAMPLE_QUERIES, true, cli.format).await?
        }
        None => handle_run(&config, SAMPLE_QUERIES[0], cli.format).await?,
    };

    if let Some(path) = cli.output {
        fs::write(&path, content)?;
        eprintln!("Output written to `{}`", path.display());
    } else {
        println!("{content}");
    }
    Ok(())
}

fn services(config: &ResearchConfig, interactive: bool) -> anyhow::Result<ResearchServices> {
    ConfigValidator::validate_research_config(config)?;
    let approval: DynApprovalGate = if config.auto_approve || !interactive {
        Arc::new(AutoApprove)
    } else {
        Arc::new(ConsoleApproval)
    };
    Ok(ResearchServices::new(llm_from_config(config)?)
        .with_tools(toolkit_from_config(config)?)
        .with_approval(approval)
        .with_options(ResearchOptions::from_config(config)))
}

fn handle_graph(config: &ResearchConfig, format: OutputFormat) -> anyhow::Result<String> {
    let services = ResearchServices::new(Arc::new(NoLlm))
        .with_options(ResearchOptions::from_config(config));
    let mut registry = FlowRegistry::new();
    registry.register(research_flow(&services)?);
    Ok(render(&describe_flows(&registry), format)?)
}

async fn handle_run(
    config: &ResearchConfig,
    query: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let executor = FlowExecutor::new(research_flow(&services(config, true)?)?);
    let mut shared = initial_state(query);
    let execution = executor
        .start(&mut shared)
        .await
        .map_err(with_node_context)?;
    let report: Report = shared
        .require(FINAL_REPORT)
        .with_context(|| format!("flow ended with `{}` without a report", execution.action))?;
    Ok(render(&report, format)?)
}

async fn handle_batch<S: AsRef<str>>(
    config: &ResearchConfig,
    queries: &[S],
    skip_failures: bool,
    format: OutputFormat,
) -> anyhow::Result<String> {
    // batch runs never prompt
    let policy = if skip_failures {
        BatchFailurePolicy::SkipItem
    } else {
        BatchFailurePolicy::AbortBatch
    };
    let batch = batch_research_flow(&services(config, false)?, policy)?;
    let mut shared = batch_state(queries);
    let outcomes = batch.run_batch(&mut shared).await.map_err(with_node_context)?;
    for outcome in outcomes.iter().filter(|o| !o.is_success()) {
        eprintln!(
            "query {} failed: {}",
            outcome.index + 1,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    let results = shared.get(RESULTS).cloned().unwrap_or(Value::Null);
    Ok(render(&results, format)?)
}

fn with_node_context(error: FlowError) -> anyhow::Error {
    match error.node() {
        Some(node) => {
            let node = node.to_string();
            anyhow::Error::new(error).context(format!("research failed in node `{node}`"))
        }
        None => anyhow::Error::new(error),
    }
}
