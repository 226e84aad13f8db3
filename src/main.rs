use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use futures::stream::{self, StreamExt};
use gcp_inventory::config::Config;
use gcp_inventory::describe::{Channel, Collect, DescribeContext, DescribeError, Describer, Resource};
use gcp_inventory::gcp::{auth, format_gcp_error, projects, GcpClient};
use gcp_inventory::output::{self, OutputFormat};
use gcp_inventory::resource::{get_all_resource_keys, get_resource, DefinedKind, Scope};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Records buffered between describe jobs and the stdout writer
const CHANNEL_CAPACITY: usize = 64;

const DEFAULT_CONCURRENCY: usize = 4;

/// Enumerate GCP resources as uniform inventory records
#[derive(Parser, Debug)]
#[command(name = "gcp-inventory", version, about, long_about = None)]
struct Args {
    /// GCP project to describe
    #[arg(short, long)]
    project: Option<String>,

    /// Region stamped on regional records
    #[arg(short, long)]
    region: Option<String>,

    /// Zone for zonal resource kinds
    #[arg(short, long)]
    zone: Option<String>,

    /// Resource kind to describe (repeatable)
    #[arg(short, long = "kind", value_name = "KIND")]
    kinds: Vec<String>,

    /// Describe every known resource kind
    #[arg(long, conflicts_with = "kinds")]
    all_kinds: bool,

    /// Describe every ACTIVE project the credentials can see
    #[arg(long, conflicts_with = "project")]
    all_projects: bool,

    /// Print the known resource kinds and exit
    #[arg(long)]
    list_kinds: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    format: OutputFormat,

    /// How many describe jobs run at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// OAuth access token to use instead of Application Default Credentials
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// `RUST_LOG` refines the level given on the command line
fn setup_logging(level: LogLevel, log_file: Option<&Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let default = match level.to_tracing_level() {
        Some(level) => LevelFilter::from_level(level),
        None => LevelFilter::OFF,
    };
    if default == LevelFilter::OFF && std::env::var_os("RUST_LOG").is_none() {
        return Ok(None);
    }

    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    let (writer, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcp-inventory started with log level: {:?}", level);
    if let Some(path) = log_file {
        tracing::info!("Log file: {:?}", path);
    }

    Ok(Some(guard))
}

/// One kind in one project
struct Job {
    label: String,
    kind: Arc<dyn Describer>,
    ctx: DescribeContext,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level, args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to set up logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_gcp_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    if args.list_kinds {
        for key in get_all_resource_keys() {
            if let Some(def) = get_resource(key) {
                println!("{}\t{}", key, def.display_name);
            }
        }
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;

    let kinds = if args.all_kinds {
        get_all_resource_keys().into_iter().map(String::from).collect()
    } else if !args.kinds.is_empty() {
        args.kinds.clone()
    } else {
        config.kinds.clone()
    };
    if kinds.is_empty() {
        bail!("No resource kinds selected; pass --kind or --all-kinds (see --list-kinds)");
    }

    let zone = args.zone.clone().or_else(|| config.effective_zone());
    let region = args
        .region
        .clone()
        .or_else(|| args.zone.as_deref().map(auth::region_of_zone))
        .or_else(|| config.effective_region())
        .unwrap_or_default();
    let concurrency = args
        .concurrency
        .or(config.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY)
        .max(1);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    let client = match &args.access_token {
        Some(token) => GcpClient::with_token(token.clone())?,
        None => GcpClient::new().await?,
    }
    .with_endpoints(config.endpoints.clone());

    let projects = if args.all_projects {
        let ctx = DescribeContext::global("").with_cancellation(cancel.clone());
        projects::list_project_ids(&client, &ctx).await?
    } else {
        let Some(project) = args.project.clone().or_else(|| config.effective_project()) else {
            bail!("No project configured; pass --project or set one with 'gcloud config set project'");
        };
        if !auth::validate_project_id(&project) {
            tracing::warn!("Project ID '{}' does not look like a GCP project ID", project);
        }
        vec![project]
    };

    let mut jobs = Vec::with_capacity(projects.len() * kinds.len());
    for key in &kinds {
        let kind: Arc<dyn Describer> = {
            let kind = DefinedKind::resolve(key, client.clone())?;
            check_scope(key, kind.definition().scope, &region, zone.as_deref())?;
            Arc::new(kind)
        };

        for project in &projects {
            let mut ctx = DescribeContext::new(project.clone(), region.clone())
                .with_cancellation(cancel.clone())
                .with_label("kind", key.clone());
            if let Some(zone) = &zone {
                ctx = ctx.with_zone(zone.clone());
            }
            jobs.push(Job {
                label: format!("{} ({})", key, project),
                kind: Arc::clone(&kind),
                ctx,
            });
        }
    }

    tracing::info!(
        "Describing {} kind(s) in {} project(s), concurrency {}",
        kinds.len(),
        projects.len(),
        concurrency
    );

    let result = if args.format.is_streaming() {
        stream_jsonl(jobs, concurrency).await
    } else {
        write_document(args.format, jobs, concurrency).await
    };

    if result.is_err() {
        cancel.cancel();
    }
    result
}

/// Regional and zonal kinds cannot be listed without a location
fn check_scope(key: &str, scope: Scope, region: &str, zone: Option<&str>) -> Result<()> {
    match scope {
        Scope::Zonal if zone.is_none() => bail!("{} is listed per zone; pass --zone", key),
        Scope::Regional if region.is_empty() => bail!("{} is listed per region; pass --region", key),
        _ => Ok(()),
    }
}

fn is_sink_closed(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<DescribeError>(), Some(DescribeError::SinkClosed))
}

/// Cancellation and a closed sink are consequences of another failure
fn report_failure(label: &str, err: &anyhow::Error) {
    if !DescribeError::is_cancelled(err) && !is_sink_closed(err) {
        eprintln!("{} failed", label);
    }
}

/// A job that lost its sink failed because the writer did; report the writer
fn stream_outcome(failure: Option<anyhow::Error>, written: Result<()>) -> Result<()> {
    match (failure, written) {
        (Some(err), Err(write_err)) if is_sink_closed(&err) => Err(write_err),
        (Some(err), _) => Err(err),
        (None, written) => written,
    }
}

/// Records are written as they arrive, in no particular job order
async fn stream_jsonl(jobs: Vec<Job>, concurrency: usize) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Resource>(CHANNEL_CAPACITY);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::BufWriter::new(tokio::io::stdout());
        while let Some(resource) = rx.recv().await {
            stdout.write_all(output::jsonl_line(&resource)?.as_bytes()).await?;
            if rx.is_empty() {
                stdout.flush().await?;
            }
        }
        stdout.flush().await?;
        Ok::<(), anyhow::Error>(())
    });

    let mut results = stream::iter(jobs.into_iter().map(|job| {
        let mut sink = Channel::new(tx.clone());
        async move {
            let result = job.kind.describe_into(&job.ctx, &mut sink).await;
            (job, result)
        }
    }))
    .buffer_unordered(concurrency);

    let mut failure = None;
    while let Some((job, result)) = results.next().await {
        match result {
            Ok(stats) => tracing::debug!("{}: {:?}", job.label, stats),
            Err(err) => {
                report_failure(&job.label, &err);
                failure = Some(err);
                break;
            }
        }
    }
    drop(results);
    drop(tx);

    let written = writer.await?;
    stream_outcome(failure, written)
}

/// Jobs run concurrently; the document lists records in job order
async fn write_document(format: OutputFormat, jobs: Vec<Job>, concurrency: usize) -> Result<()> {
    let mut results = stream::iter(jobs.into_iter().map(|job| async move {
        let mut sink = Collect::new();
        let result = job.kind.describe_into(&job.ctx, &mut sink).await;
        (job, result.map(|_| sink.into_resources()))
    }))
    .buffered(concurrency);

    let mut resources = Vec::new();
    while let Some((job, result)) = results.next().await {
        match result {
            Ok(batch) => resources.extend(batch),
            Err(err) => {
                report_failure(&job.label, &err);
                return Err(err);
            }
        }
    }

    let document = output::render_document(format, &resources)?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(document.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
