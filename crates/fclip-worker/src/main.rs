//! Focus highlight worker binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fclip_media::PrecomputedDetections;
use fclip_models::{AnalysisRequest, TaskId};
use fclip_worker::{
    get_progress, list_rendered_clips, poll_status, CompositeSink, FocusPipeline, MonotonicProgress,
    PipelineInputs, StatusFileSink, TracingSink, WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "focusclip-worker", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root for clips, status records and completion markers
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline for one task
    Run(RunArgs),
    /// Print the state and progress of a task
    Status { task_id: String },
    /// List the clips rendered for a task as JSON
    Clips { task_id: String },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Task identifier; a random one is generated when omitted
    task_id: Option<String>,

    /// Source video
    #[arg(long, required_unless_present = "request")]
    video: Option<PathBuf>,

    /// JSON analysis request naming the source video
    #[arg(long, conflicts_with = "video")]
    request: Option<PathBuf>,

    /// Affect log (CSV)
    #[arg(long)]
    affect_log: PathBuf,

    /// Object log produced by the external detector (JSON)
    #[arg(long)]
    object_log: PathBuf,

    #[arg(long)]
    window_sec: Option<u32>,

    #[arg(long)]
    step_sec: Option<u32>,

    #[arg(long)]
    top_k: Option<usize>,

    /// Root for intermediate logs
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Discard rendered clips smaller than this many bytes
    #[arg(long)]
    min_clip_bytes: Option<u64>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fclip_worker=info,fclip_media=info,fclip_focus=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = WorkerConfig::from_env();
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Command::Run(args) => run(config, args).await,
        Command::Status { task_id } => {
            let task_id = TaskId::from_string(task_id);
            let state = poll_status(&config.output_dir, &task_id);
            let progress = get_progress(&config.output_dir, &task_id);
            println!("{} {} {}%", task_id, state, progress);
            Ok(())
        }
        Command::Clips { task_id } => {
            let clips = list_rendered_clips(&config.output_dir, &task_id)?;
            println!("{}", serde_json::to_string_pretty(&clips)?);
            Ok(())
        }
    }
}

async fn run(mut config: WorkerConfig, args: RunArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.work_dir {
        config.work_dir = dir;
    }
    if let Some(window) = args.window_sec {
        config.window.window_length_seconds = window;
    }
    if let Some(step) = args.step_sec {
        config.window.step_seconds = step;
    }
    if let Some(top_k) = args.top_k {
        config.window.top_k = top_k;
    }
    if args.min_clip_bytes.is_some() {
        config.min_clip_bytes = args.min_clip_bytes;
    }
    info!("Worker config: {:?}", config);

    let (task_id, inputs) = match (args.request, args.video) {
        (Some(request_path), _) => {
            let content = std::fs::read_to_string(&request_path)
                .with_context(|| format!("reading request {}", request_path.display()))?;
            let request: AnalysisRequest = serde_json::from_str(&content)
                .with_context(|| format!("parsing request {}", request_path.display()))?;
            let task_id = match args.task_id {
                Some(id) => TaskId::from_string(id),
                None => request.task_id_or_new(),
            };
            (task_id, PipelineInputs::from_request(&request, args.affect_log)?)
        }
        (None, Some(video)) => {
            let task_id = args.task_id.map(TaskId::from_string).unwrap_or_default();
            (task_id, PipelineInputs::new(video, args.affect_log))
        }
        (None, None) => bail!("either --video or --request is required"),
    };

    let sink = CompositeSink::new()
        .with(Arc::new(StatusFileSink::new(&config.output_dir)))
        .with(Arc::new(TracingSink));
    let pipeline = FocusPipeline::with_ffmpeg(
        config,
        Arc::new(PrecomputedDetections::new(args.object_log)),
        Arc::new(MonotonicProgress::new(sink)),
    );

    let outcome = pipeline
        .run(&task_id, &inputs)
        .await
        .with_context(|| format!("task {} failed", task_id))?;

    info!(
        task_id = %task_id,
        rendered = outcome.render.rendered(),
        requested = outcome.render.requested,
        marker = %outcome.marker.display(),
        "Worker finished"
    );
    for clip in &outcome.render.clips {
        println!("{}", clip.output_path.display());
    }
    Ok(())
}
