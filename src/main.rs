use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use levelwatch_k8s::KubeClient;
use levelwatch_logs::{LevelAggregator, RunOutcome, lossy_lines};

mod config;

use config::Config;

/// Levelwatch - tail a pod's logs and keep running per-level counts
#[derive(Parser, Debug)]
#[command(name = "levelwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pod to tail (optional with --stdin or when set in the config file)
    #[arg(value_name = "POD")]
    pod: Option<String>,

    /// Namespace of the pod [default: default]
    #[arg(short, long)]
    namespace: Option<String>,

    /// Container to tail [default: first container in the pod]
    #[arg(short, long)]
    container: Option<String>,

    /// Kubernetes context name [default: inferred]
    #[arg(long)]
    context: Option<String>,

    /// Number of historical log lines to start from, -1 for the whole log [default: 100]
    #[arg(long, allow_negative_numbers = true)]
    tail_lines: Option<i64>,

    /// Print what is already logged and exit instead of following
    #[arg(long)]
    no_follow: bool,

    /// Print the totals block every N lines [default: 60]
    #[arg(long, value_name = "N")]
    summary_every: Option<u64>,

    /// Print the totals block once more when the stream ends
    #[arg(long)]
    final_summary: bool,

    /// Read log lines from stdin instead of a pod
    #[arg(long)]
    stdin: bool,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Build the effective settings: defaults, then the config file, then flags
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(pod) = &args.pod {
        config.pod = Some(pod.clone());
    }
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(container) = &args.container {
        config.container = Some(container.clone());
    }
    if let Some(context) = &args.context {
        config.context = Some(context.clone());
    }
    if let Some(tail_lines) = args.tail_lines {
        config.tail_lines = tail_lines;
    }
    if args.no_follow {
        config.follow = false;
    }
    if let Some(summary_every) = args.summary_every {
        config.summary_every = summary_every;
    }
    if args.final_summary {
        config.final_summary = true;
    }

    config.validate(args.stdin)?;
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let aggregator = LevelAggregator::new(io::stdout())
        .with_interval(config.summary_interval()?)
        .with_final_summary(config.final_summary);

    let outcome = if args.stdin {
        tail_stdin(aggregator).await?
    } else {
        tail_pod(&config, aggregator).await?
    };

    tracing::info!(
        end = ?outcome.end,
        lines = outcome.lines,
        malformed = outcome.malformed,
        total = outcome.counts.total(),
        unknown = outcome.counts.unknown,
        "tail finished"
    );

    Ok(())
}

async fn tail_stdin(mut aggregator: LevelAggregator<io::Stdout>) -> Result<RunOutcome> {
    let outcome = tokio::task::spawn_blocking(move || {
        aggregator.run(lossy_lines(io::stdin().lock()))
    })
    .await
    .context("stdin reader task failed")?
    .context("Failed to tally stdin")?;

    Ok(outcome)
}

async fn tail_pod(
    config: &Config,
    mut aggregator: LevelAggregator<io::Stdout>,
) -> Result<RunOutcome> {
    let pod_name = config
        .pod
        .as_deref()
        .context("A pod name is required unless --stdin is given")?;

    let client = KubeClient::connect(config.context.as_deref()).await?;
    let pod = client.get_pod(&config.namespace, pod_name).await?;

    let container = pod
        .resolve_container(config.container.as_deref())
        .with_context(|| match &config.container {
            Some(name) => format!("Container '{}' not found in pod '{}'", name, pod.name),
            None => format!("Pod '{}' has no containers", pod.name),
        })?;

    tracing::debug!(
        pod = %pod.name,
        status = ?pod.status,
        node = ?pod.node_name,
        container = %container.name,
        "pod resolved"
    );

    let lines = client
        .log_lines(&pod, &container.name, &config.tail_options())
        .await?;

    // Stop between lines on Ctrl-C so the final summary can still be written
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                cancel.cancel();
            }
        }
    });

    aggregator
        .run_stream(lines, &cancel)
        .await
        .context(format!("Log stream for pod '{}' failed", pod.name))
}
