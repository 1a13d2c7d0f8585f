use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, prelude::*};

use reelsmith::plan::Narration;
use reelsmith::{CompileInputs, JobQueue, JobState, Plan, ServiceConfig, Storyboard};

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one plan end to end (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the final encoder arguments for a plan without running anything.
    Compile(CompileArgs),
    /// Convert a storyboard document into a plan.
    Storyboard(StoryboardArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input plan JSON.
    #[arg(long)]
    plan: PathBuf,

    /// Output directory (overrides `OUTPUT_DIR`).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input plan JSON.
    #[arg(long)]
    plan: PathBuf,

    /// Directory for generated overlay assets.
    #[arg(long, default_value = "reelsmith_dry_run")]
    work_dir: PathBuf,

    /// Output path written into the argument list.
    #[arg(long, default_value = "out.mp4")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct StoryboardArgs {
    /// Input storyboard JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Write the plan here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Compile(args) => cmd_compile(args),
        Command::Storyboard(args) => cmd_storyboard(args),
    }
}

fn read_plan(path: &Path) -> anyhow::Result<Plan> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("open plan '{}'", path.display()))?;
    Ok(Plan::from_json_str(&raw)?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let plan = read_plan(&args.plan)?;
    let mut cfg = ServiceConfig::from_env();
    if let Some(dir) = args.out_dir {
        cfg.output_dir = dir;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;
    let status = runtime.block_on(async {
        let queue = JobQueue::from_config(&cfg)?;
        let id = queue.enqueue(plan).await?;
        let status = queue
            .wait(id)
            .await
            .with_context(|| format!("job {id} vanished from the status table"))?;
        Ok::<_, anyhow::Error>(status)
    })?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    anyhow::ensure!(
        status.state == JobState::Done,
        "render failed: {}",
        status.error.as_deref().unwrap_or("unknown error")
    );
    Ok(())
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let plan = read_plan(&args.plan)?;
    reelsmith::validate(&plan)?;
    let cfg = ServiceConfig::from_env();
    let defaults = cfg.render_defaults()?;

    std::fs::create_dir_all(&args.work_dir)
        .with_context(|| format!("create work dir '{}'", args.work_dir.display()))?;
    let base_clip = args.work_dir.join(reelsmith::timeline::BASE_CLIP_FILE);
    let music = plan
        .music
        .as_deref()
        .filter(|_| plan.has_music())
        .map(PathBuf::from);
    let voice = plan.narration.as_ref().map(|n| match n {
        Narration::File(f) => PathBuf::from(&f.path),
        Narration::Tts(t) => args.work_dir.join(format!("voice.{}", t.format.extension())),
    });

    let invocation = reelsmith::compile_plan(&CompileInputs {
        plan: &plan,
        work_dir: &args.work_dir,
        base_clip: &base_clip,
        music: music.as_deref(),
        voice: voice.as_deref(),
        subtitles: None,
        total_duration: plan.estimated_duration(),
        defaults: &defaults,
        shapes_enabled: cfg.shapes_enabled,
        output: &args.out,
    })?;

    println!("{}", serde_json::to_string_pretty(&invocation.args)?);
    Ok(())
}

fn cmd_storyboard(args: StoryboardArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("open storyboard '{}'", args.in_path.display()))?;
    let plan = Storyboard::from_json_str(&raw)?.into_plan()?;
    let json = serde_json::to_string_pretty(&plan)?;
    match args.out {
        Some(out) => {
            std::fs::write(&out, json).with_context(|| format!("write plan '{}'", out.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}
