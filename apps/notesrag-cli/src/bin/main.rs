use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notesrag_core::config::{Config, EmbeddingProvider, LlmProvider, RagConfig};
use notesrag_embed::default_embedder;
use notesrag_pipeline::{default_generator, Answer, PipelineState, RagPipeline};

#[derive(Parser)]
#[command(name = "notesrag", about = "Ask questions about your notes folder", version)]
struct Cli {
    /// Config file (env-specific sibling and APP_* variables are layered on top)
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override notes.dir
    #[arg(long, global = true)]
    notes_dir: Option<String>,

    /// Hash embeddings and an echo generator; no network access
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question and exit
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// List the loaded notes
    Notes,
    /// Answer questions read from stdin, one per line
    Chat,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let pipeline = build_pipeline(settings)?;

    let state = initialize(&pipeline)?;
    match &state {
        PipelineState::Ready => {
            let (documents, chunks) = pipeline.stats();
            eprintln!("✅ Indexed {documents} notes ({chunks} chunks) from {}", pipeline.notes_dir().display());
        }
        PipelineState::DegradedNoDocuments => eprintln!("⚠️  No notes found in {}", pipeline.notes_dir().display()),
        other => eprintln!("❌ Notes unavailable ({other})"),
    }

    match cli.command {
        Command::Ask { question } => print_answer(pipeline.ask(&question.join(" "))),
        Command::Notes => println!("{}", pipeline.corpus_summary()),
        Command::Chat => chat(&pipeline)?,
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> anyhow::Result<RagConfig> {
    let config = Config::load_from(&cli.config).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let mut settings = config.settings()?;
    if let Some(dir) = &cli.notes_dir {
        settings.notes.dir = dir.clone();
    }
    if cli.offline {
        settings.embedding.provider = EmbeddingProvider::Hash;
        settings.llm.provider = LlmProvider::Echo;
    }
    Ok(settings)
}

fn build_pipeline(settings: RagConfig) -> anyhow::Result<RagPipeline> {
    let embedder = default_embedder(&settings.embedding)?;
    let generator = default_generator(&settings.llm)?;
    Ok(RagPipeline::new(settings, embedder, generator)?)
}

fn initialize(pipeline: &RagPipeline) -> anyhow::Result<PipelineState> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Indexing {}", pipeline.notes_dir().display()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let state = pipeline.initialize();
    spinner.finish_and_clear();
    Ok(state)
}

fn print_answer(answer: Answer) {
    println!("{}", answer.text());
    if !answer.sources().is_empty() {
        eprintln!("📚 Sources: {}", answer.sources().join(", "));
    }
}

fn chat(pipeline: &RagPipeline) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "❓ ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            continue;
        }
        print_answer(pipeline.ask(question));
        println!();
    }
    Ok(())
}
