use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use docrank_core::config_file::{self, ConfigFile};
use docrank_core::refine::ollama::OllamaRefiner;
use docrank_core::refine::{RetryPolicy, RetryingRefiner};
use docrank_core::{Config, Mode, ProgressEvent, Refiner, SnippetRefiner};
use docrank_ingest::{CollectionOutcome, Pipeline, discover_collections, load_collection};
use docrank_parsing::{HeadingConfig, HeadingConfigBuilder};

mod output;

use output::ColorMode;

/// Persona-driven ranking of PDF collections
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the pages or sections of every collection under ROOT
    Analyze(AnalyzeArgs),

    /// List the collections found under ROOT and their documents
    List {
        /// Directory containing collection sub-directories
        root: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Directory containing collection sub-directories
    root: PathBuf,

    /// Ranking granularity: whole pages or heading-bounded sections
    #[arg(long)]
    mode: Option<Mode>,

    /// Write outputs as <DIR>/<collection>.json instead of inside each collection
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of results per collection
    #[arg(long)]
    top_k: Option<usize>,

    /// Snippet length in characters for deterministic refinement
    #[arg(long)]
    snippet_limit: Option<usize>,

    /// Use deterministic snippets instead of the LLM for section refinement
    #[arg(long)]
    no_llm: bool,

    /// Base URL of the Ollama server
    #[arg(long)]
    ollama_url: Option<String>,

    /// Ollama model name
    #[arg(long)]
    model: Option<String>,

    /// Include processing_timestamp in the output metadata
    #[arg(long)]
    timestamp: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Rank and print results without writing output files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => {
            let _guard = init_tracing(args.log_file.as_deref())?;
            analyze(args).await
        }
        Command::List { root, no_color } => {
            let _guard = init_tracing(None)?;
            list(&root, no_color)
        }
    }
}

/// Install the global subscriber. The returned guard flushes the
/// non-blocking writer on drop and must live until exit.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrank=info"));
    let (writer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;
    Ok(guard)
}

fn color_mode(no_color: bool) -> ColorMode {
    ColorMode(!no_color && std::env::var_os("NO_COLOR").is_none())
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(
    args: &AnalyzeArgs,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let mode = args.mode.or_else(|| file.mode()).unwrap_or_default();
    let mut config = file.to_config(mode);

    if let Some(url) = env("DOCRANK_OLLAMA_URL") {
        config.refiner.base_url = url;
    }
    if let Some(model) = env("DOCRANK_OLLAMA_MODEL") {
        config.refiner.model = model;
    }
    if let Some(raw) = env("DOCRANK_TOP_K") {
        config.top_k = raw
            .trim()
            .parse()
            .with_context(|| format!("DOCRANK_TOP_K is not a number: {raw}"))?;
    }

    if let Some(k) = args.top_k {
        config.top_k = k;
    }
    if let Some(limit) = args.snippet_limit {
        config.snippet_limit = limit;
    }
    if let Some(url) = &args.ollama_url {
        config.refiner.base_url = url.clone();
    }
    if let Some(model) = &args.model {
        config.refiner.model = model.clone();
    }
    if args.no_llm {
        config.refiner.enabled = false;
    }
    if args.timestamp {
        config.include_timestamp = true;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }

    if config.top_k == 0 {
        anyhow::bail!("top_k must be at least 1");
    }
    if config.snippet_limit == 0 {
        anyhow::bail!("snippet limit must be at least 1");
    }
    Ok(config)
}

fn heading_config(file: &ConfigFile) -> anyhow::Result<HeadingConfig> {
    let builder = match &file.headings {
        Some(h) => HeadingConfigBuilder::from_file(h)?,
        None => HeadingConfigBuilder::new(),
    };
    Ok(builder.build()?)
}

/// Snippets in page mode or with the LLM disabled, otherwise Ollama behind
/// a timeout and retry policy.
fn build_refiner(config: &Config) -> anyhow::Result<Box<dyn Refiner>> {
    if config.mode == Mode::Pages || !config.refiner.enabled {
        return Ok(Box::new(SnippetRefiner::new(config.snippet_limit)));
    }
    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let ollama = OllamaRefiner::new(
        client,
        config.refiner.base_url.clone(),
        config.refiner.model.clone(),
    );
    let policy = RetryPolicy {
        max_retries: config.refiner.max_retries,
        timeout: Duration::from_secs(config.refiner.timeout_secs),
        ..RetryPolicy::default()
    };
    tracing::info!(url = %ollama.base_url(), model = %ollama.model(), "using Ollama refiner");
    Ok(Box::new(RetryingRefiner::new(ollama, policy)))
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    if !args.root.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.root.display());
    }

    let file = config_file::load_config();
    let config = resolve_config(&args, &file, env_var)?;
    let headings = heading_config(&file)?;
    let refiner = build_refiner(&config)?;
    let backend = docrank_ingest::default_backend()?;
    let color = color_mode(args.no_color);

    let collections = discover_collections(&args.root, &config.config_file_name)?;
    if collections.is_empty() {
        anyhow::bail!(
            "No collections found under {} (looking for {})",
            args.root.display(),
            config.config_file_name
        );
    }
    tracing::info!(
        collections = collections.len(),
        mode = %config.mode,
        refiner = refiner.name(),
        "starting batch"
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));

    let progress = {
        let spinner = spinner.clone();
        move |event: ProgressEvent| {
            if let Some(msg) = output::spinner_message(&event) {
                spinner.set_message(msg);
            }
            spinner.suspend(|| {
                let mut out = std::io::stdout().lock();
                let _ = output::print_progress(&mut out, &event, color);
                let _ = out.flush();
            });
        }
    };

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let pipeline = Pipeline::new(backend.as_ref(), refiner.as_ref(), &config, &headings)
        .dry_run(args.dry_run);
    let summary = pipeline.run_batch(&collections, &progress, &cancel).await;
    spinner.finish_and_clear();

    let mut out = std::io::stdout().lock();
    for outcome in &summary.outcomes {
        if let CollectionOutcome::DryRun { id, output } = outcome {
            writeln!(out)?;
            output::print_dry_run(&mut out, id, output, color)?;
        }
    }
    output::print_summary(&mut out, &summary, color)?;

    if summary.failed() > 0 {
        anyhow::bail!("{} collection(s) failed", summary.failed());
    }
    Ok(())
}

fn list(root: &Path, no_color: bool) -> anyhow::Result<()> {
    let file = config_file::load_config();
    let config = file.to_config(file.mode().unwrap_or_default());
    let color = color_mode(no_color);

    let collections = discover_collections(root, &config.config_file_name)?;
    let mut out = std::io::stdout().lock();
    if collections.is_empty() {
        writeln!(out, "No collections found under {}", root.display())?;
        return Ok(());
    }
    for entry in &collections {
        match load_collection(entry) {
            Ok(collection) => output::print_collection(&mut out, &collection, color)?,
            Err(e) => writeln!(out, "{} (error: {})", entry.name(), e)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrank_core::config_file::{HeadingsConfig, OutputConfig, RankingConfig};

    fn parse_analyze(argv: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["docrank", "analyze"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Analyze(args) => args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_analyze_flags() {
        let args = parse_analyze(&["input", "--mode", "sections", "--top-k", "3", "--no-llm"]);
        assert_eq!(args.root, PathBuf::from("input"));
        assert_eq!(args.mode, Some(Mode::Sections));
        assert_eq!(args.top_k, Some(3));
        assert!(args.no_llm);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["docrank", "analyze", "in", "--mode", "chapters"]).is_err());
    }

    #[test]
    fn cli_overrides_env_overrides_file() {
        let file = ConfigFile {
            ranking: Some(RankingConfig {
                mode: Some("sections".into()),
                top_k: Some(7),
                max_df: None,
            }),
            ..Default::default()
        };
        let env = |key: &str| match key {
            "DOCRANK_TOP_K" => Some("4".to_string()),
            "DOCRANK_OLLAMA_MODEL" => Some("llama3".to_string()),
            _ => None,
        };

        let args = parse_analyze(&["in"]);
        let config = resolve_config(&args, &file, env).unwrap();
        assert_eq!(config.mode, Mode::Sections);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.refiner.model, "llama3");

        let args = parse_analyze(&["in", "--top-k", "2", "--model", "mistral", "--mode", "pages"]);
        let config = resolve_config(&args, &file, env).unwrap();
        assert_eq!(config.mode, Mode::Pages);
        assert_eq!(config.top_k, 2);
        assert_eq!(config.refiner.model, "mistral");
    }

    #[test]
    fn output_dir_and_timestamp_flags() {
        let file = ConfigFile {
            output: Some(OutputConfig {
                include_timestamp: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let args = parse_analyze(&["in", "--output-dir", "out", "--timestamp"]);
        let config = resolve_config(&args, &file, no_env).unwrap();
        assert!(config.include_timestamp);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let args = parse_analyze(&["in", "--top-k", "0"]);
        assert!(resolve_config(&args, &ConfigFile::default(), no_env).is_err());
    }

    #[test]
    fn bad_env_top_k_is_an_error() {
        let env = |key: &str| (key == "DOCRANK_TOP_K").then(|| "many".to_string());
        let args = parse_analyze(&["in"]);
        assert!(resolve_config(&args, &ConfigFile::default(), env).is_err());
    }

    #[test]
    fn refiner_selection() {
        let pages = Config::for_mode(Mode::Pages);
        assert_eq!(build_refiner(&pages).unwrap().name(), "snippet");

        let mut sections = Config::for_mode(Mode::Sections);
        assert_eq!(build_refiner(&sections).unwrap().name(), "ollama");
        sections.refiner.enabled = false;
        assert_eq!(build_refiner(&sections).unwrap().name(), "snippet");
    }

    #[test]
    fn heading_config_from_file() {
        let file = ConfigFile {
            headings: Some(HeadingsConfig {
                max_section_chars: Some(600),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = heading_config(&file).unwrap();
        assert_eq!(config.max_section_chars(), 600);

        let bad = ConfigFile {
            headings: Some(HeadingsConfig {
                strategy: Some("fonts".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(heading_config(&bad).is_err());
    }
}
