use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use sheet_query_core::config::{DEFAULT_EMBEDDING_ENDPOINT, DEFAULT_EMBEDDING_MODEL};
use sheet_query_core::{
    discover_sheet_files, EmbeddingConfig, EmbeddingMode, FileInput, FileResult, Session,
    SessionConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sheet-query", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Spreadsheet or CSV file to load. Repeat for several files.
    #[arg(long = "file", global = true)]
    files: Vec<PathBuf>,

    /// Folder scanned recursively for spreadsheets.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Similarity backend used for questions without an identifier.
    #[arg(long, env = "EMBEDDING_MODE", value_enum, default_value = "auto", global = true)]
    embedding_mode: ModeArg,

    /// API key for the embedding backend.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Embedding endpoint URL
    #[arg(long, env = "EMBEDDING_ENDPOINT", default_value = DEFAULT_EMBEDDING_ENDPOINT, global = true)]
    embedding_endpoint: String,

    /// Embedding model name
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL, global = true)]
    embedding_model: String,

    /// Print file results and summaries as JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Load the files and print what was found in them.
    Summary,
    /// Load the files and answer the given questions.
    Ask {
        /// Question to answer. Repeat for several questions.
        #[arg(long = "question", short = 'q', required = true)]
        questions: Vec<String>,
    },
    /// Load the files and answer questions read from stdin, one per line.
    Chat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Remote,
    Local,
    Disabled,
}

impl From<ModeArg> for EmbeddingMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Auto => EmbeddingMode::Auto,
            ModeArg::Remote => EmbeddingMode::Remote,
            ModeArg::Local => EmbeddingMode::Local,
            ModeArg::Disabled => EmbeddingMode::Disabled,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "sheet-query boot"
    );

    // Ingestion and remote embedding calls block; keep them off the runtime workers.
    tokio::task::spawn_blocking(move || run(cli))
        .await
        .context("session worker panicked")?
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let inputs = collect_inputs(&cli)?;
    let config = SessionConfig {
        embedding: EmbeddingConfig {
            mode: cli.embedding_mode.into(),
            api_key: cli
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            endpoint: cli.embedding_endpoint.clone(),
            model: cli.embedding_model.clone(),
        },
        ..SessionConfig::default()
    };

    let mut session = Session::new(config)?;
    let results = session.process_files(inputs);
    print_results(results.values(), cli.json)?;

    match cli.command {
        Command::Summary => {
            let summary = session.summary();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }
        Command::Ask { questions } => {
            for question in questions {
                println!("Q: {question}");
                println!("{}\n", session.query(&question));
            }
        }
        Command::Chat => chat(&session)?,
    }

    Ok(())
}

fn collect_inputs(cli: &Cli) -> anyhow::Result<Vec<FileInput>> {
    let mut paths = cli.files.clone();
    if let Some(dir) = &cli.dir {
        let found = discover_sheet_files(dir);
        if found.is_empty() {
            warn!(dir = %dir.display(), "no spreadsheets found in folder");
        }
        paths.extend(found);
    }

    if paths.is_empty() {
        anyhow::bail!("no input files: pass --file or --dir");
    }

    Ok(paths.into_iter().map(FileInput::from_path).collect())
}

fn print_results<'a>(
    results: impl Iterator<Item = &'a FileResult>,
    json: bool,
) -> anyhow::Result<()> {
    let results: Vec<&FileResult> = results.collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in results {
        match result {
            FileResult::Success(file) => println!(
                "[{}] {}: header at row {}, {} records, {} columns",
                file.file_id, file.filename, file.header_row, file.row_count, file.column_count
            ),
            FileResult::Error(file) => {
                println!("[{}] {}: failed: {}", file.file_id, file.filename, file.error)
            }
        }
    }
    println!();
    Ok(())
}

fn chat(session: &Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        writeln!(stdout, "{}\n", session.query(question))?;
    }

    Ok(())
}
