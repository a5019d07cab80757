use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lessonkit::{DocumentStore, EngineOpts, LangCode, Lesson, SceneId};

#[derive(Parser, Debug)]
#[command(name = "lessonkit", version)]
struct Cli {
    /// Only log errors.
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug events (overridden by `LESSONKIT_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a lesson and print its issue list. Exits non-zero when errors exist.
    Validate(ValidateArgs),
    /// Print the per-language speech durations of one scene.
    Durations(DurationsArgs),
    /// Print the scene graph edges and unreachable scenes.
    Graph(InputArgs),
    /// Write a new, empty lesson file.
    New(NewArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Input lesson JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Engine options JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print issues as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct DurationsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Scene identity, e.g. `s3`.
    #[arg(long)]
    scene: SceneId,
}

#[derive(Parser, Debug)]
struct NewArgs {
    /// Lesson title.
    #[arg(long)]
    title: String,

    /// Lesson identifier; derived from the title when omitted.
    #[arg(long)]
    id: Option<String>,

    /// Enabled languages. The first one is the primary language.
    #[arg(long = "lang", required = true, num_args = 1..)]
    langs: Vec<LangCode>,

    /// Output lesson JSON.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Durations(args) => cmd_durations(args),
        Command::Graph(args) => cmd_graph(args),
        Command::New(args) => cmd_new(args),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LESSONKIT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;
    Ok(())
}

fn open_store(input: &InputArgs) -> anyhow::Result<DocumentStore> {
    let lesson = read_lesson(&input.in_path)?;
    let opts = match &input.config {
        Some(path) => EngineOpts::from_path(path)
            .with_context(|| format!("load engine options '{}'", path.display()))?,
        None => EngineOpts::default(),
    };
    Ok(DocumentStore::open(lesson, opts)?)
}

fn read_lesson(path: &Path) -> anyhow::Result<Lesson> {
    Lesson::from_path(path).with_context(|| format!("load lesson '{}'", path.display()))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let store = open_store(&args.input)?;
    let summary = store.issue_summary();

    if args.json {
        let out = serde_json::json!({
            "summary": summary,
            "issues": store.issues(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for issue in store.issues() {
            println!("{issue}");
        }
        println!(
            "{} error(s), {} warning(s), {} info",
            summary.errors, summary.warnings, summary.infos
        );
    }

    if summary.has_errors() {
        anyhow::bail!(
            "lesson '{}' has {} validation error(s)",
            args.input.in_path.display(),
            summary.errors
        );
    }
    Ok(())
}

fn cmd_durations(args: DurationsArgs) -> anyhow::Result<()> {
    let store = open_store(&args.input)?;
    let lesson = store.lesson();
    let scene = lesson
        .scene(args.scene)
        .with_context(|| format!("scene {} is not in the lesson", args.scene))?;
    let matrix = store.matrix();
    let row = matrix.row(args.scene).with_context(|| {
        format!(
            "scene {} is a {} scene and has no text",
            args.scene,
            scene.kind().label()
        )
    })?;

    println!(
        "{} ({}, {:.1}s, {})",
        row.scene,
        scene.kind().label(),
        row.scene_secs,
        row.transition
    );
    for cell in &row.cells {
        let secs = cell
            .duration_secs
            .map_or_else(|| "-".to_string(), |d| format!("{:.1}s", lessonkit::round_tenths(d)));
        let delta = cell
            .delta_secs
            .map_or_else(String::new, |d| format!("{d:+.1}s"));
        let flag = if cell.overrun.is_some() { "  OVERRUN" } else { "" };
        println!(
            "  {:<6} {:<18} {:>6} {:>7}{flag}",
            cell.lang.as_str(),
            cell.status.label(),
            secs,
            delta
        );
    }
    Ok(())
}

fn cmd_graph(args: InputArgs) -> anyhow::Result<()> {
    let store = open_store(&args)?;
    let graph = store.graph();
    for edge in graph.edges() {
        println!("{} -> {} ({:?})", edge.from, edge.to, edge.kind);
    }
    let unreachable = graph.reachability_check();
    if !unreachable.is_empty() {
        let names: Vec<String> = unreachable.iter().map(|id| id.to_string()).collect();
        println!("unreachable: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_new(args: NewArgs) -> anyhow::Result<()> {
    let mut langs = args.langs.into_iter();
    let primary = langs.next().context("at least one --lang is required")?;
    let id = args.id.unwrap_or_else(|| slug(&args.title));

    let mut builder = lessonkit::LessonBuilder::new(id, &args.title, primary);
    for lang in langs {
        builder = builder.language(lang)?;
    }
    let lesson = builder.build()?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    lesson
        .to_path(&args.out)
        .with_context(|| format!("write lesson '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "lesson".to_string()
    } else {
        trimmed.to_string()
    }
}
