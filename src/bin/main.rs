use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lissajous::{
    core::{config::Config, renderer::Renderer},
    server::Server,
    vis::gif::save_animation,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "lissajous", version)]
struct Cli {
    /// TOML configuration. A missing file means default settings.
    #[arg(long, default_value = "lissajous.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a freshly rendered GIF on every HTTP request (default).
    Serve(ServeArgs),
    /// Render a single GIF to a file.
    Render(RenderArgs),
    /// Write the effective configuration to a TOML file.
    Init(InitArgs),
}

#[derive(Parser, Debug, Default)]
struct ServeArgs {
    /// Override the listen address, e.g. `0.0.0.0:8000`.
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Seed for a reproducible render.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Output TOML path.
    #[arg(long, default_value = "lissajous.toml")]
    out: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("lissajous failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging().context("Failed to set up logging")?;

    let config = Config::load_or_default(&cli.config)?;
    match cli.cmd.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args),
        Command::Render(args) => render(&config, &args),
        Command::Init(args) => config.save(&args.out),
    }
}

#[tracing::instrument(level = "info", skip(config))]
fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let renderer = Renderer::new(config.animation, config.server.seed);
    Server::bind(&config.server, renderer)?.run();
    Ok(())
}

#[tracing::instrument(level = "info", skip(config))]
fn render(config: &Config, args: &RenderArgs) -> Result<()> {
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir '{}'", parent.display()))?;
    }
    let renderer = Renderer::new(config.animation, args.seed.or(config.server.seed));
    let animation = renderer.render();
    save_animation(&animation, &args.out)?;
    info!(
        "Wrote {} frames (freq {:.4}, color index {}) to {}",
        animation.len(),
        animation.freq,
        animation.color_index,
        args.out.display()
    );
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs to stdout and a daily rotating file, or to stdout only if the
/// file appender cannot be created.
fn setup_logging() -> Result<Option<WorkerGuard>> {
    match try_setup_file_logging() {
        Ok(guard) => Ok(Some(guard)),
        Err(e) => {
            eprintln!("Warning: Could not set up file logging ({e}), using stdout only");
            setup_stdout_logging()?;
            Ok(None)
        }
    }
}

fn setup_stdout_logging() -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(env_filter()).with(
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_thread_names(true)
            .with_ansi(true),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set up stdout logging")?;

    Ok(())
}

fn try_setup_file_logging() -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("lissajous")
        .filename_suffix("log")
        .build("./logs")
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_thread_names(true)
                .with_ansi(true),
        )
        .with(
            fmt::Layer::new()
                .with_writer(non_blocking)
                .with_thread_names(true)
                .with_line_number(true)
                .fmt_fields(fmt::format::PrettyFields::new())
                .with_ansi(false),
        );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set up file logging")?;

    Ok(guard)
}
