//! `grantspider` command-line entry point.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grantspider::batch::{BatchProcessor, BatchRequest, BatchStatus};
use grantspider::{llm_from_settings, retriever_from_settings, GrantSpider, Settings};

/// Ask questions about AMIF grant documents
#[derive(Parser, Debug)]
#[command(name = "grantspider")]
#[command(version)]
struct Cli {
    /// TOML settings file; environment variables override it
    #[arg(long, global = true, env = "GRANTSPIDER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of .txt/.md documents to index at start-up
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question
    Ask {
        query: String,
        #[arg(long)]
        session: Option<String>,
        /// Print the full turn result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session over stdin
    Chat {
        #[arg(long)]
        session: Option<String>,
    },
    /// Run every line of FILE as an independent query
    Batch {
        file: PathBuf,
        /// Where to write the JSON report
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the agent graph as a mermaid diagram
    Graph,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grantspider=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli {
        config,
        corpus,
        command,
    } = Cli::parse();
    match command {
        Command::Ask {
            query,
            session,
            json,
        } => {
            let (spider, _) = configure(config.as_deref(), corpus).await?;
            ask(&spider, &query, &session_or_new(session), json).await
        }
        Command::Chat { session } => {
            let (spider, _) = configure(config.as_deref(), corpus).await?;
            chat(&spider, &session_or_new(session)).await
        }
        Command::Batch { file, output } => {
            let (spider, settings) = configure(config.as_deref(), corpus).await?;
            batch(spider, &settings, &file, output).await
        }
        Command::Graph => {
            println!("{}", GrantSpider::diagram()?);
            Ok(())
        }
    }
}

async fn configure(
    config: Option<&Path>,
    corpus: Option<PathBuf>,
) -> Result<(GrantSpider, Settings)> {
    let mut settings = Settings::load(config)?;
    if let Some(corpus) = corpus {
        settings.retrieval.corpus_dir = Some(corpus);
    }
    settings.validate()?;
    let spider = build(&settings).await?;
    Ok((spider, settings))
}

async fn build(settings: &Settings) -> Result<GrantSpider> {
    let llm = llm_from_settings(&settings.llm).context("failed to configure the llm client")?;
    let retriever = retriever_from_settings(&settings.retrieval)
        .await
        .context("failed to index the corpus")?;
    Ok(GrantSpider::builder()
        .with_llm(llm)
        .with_retriever(retriever)
        .with_settings(settings.clone())
        .build()?)
}

fn session_or_new(session: Option<String>) -> String {
    session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

async fn ask(spider: &GrantSpider, query: &str, session: &str, json: bool) -> Result<()> {
    let turn = spider.run(query, session).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&turn)?);
    } else {
        println!("{}", turn.cited_response);
    }
    Ok(())
}

async fn chat(spider: &GrantSpider, session: &str) -> Result<()> {
    println!("session {session} (type `exit` to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }
        match spider.run(query, session).await {
            Ok(turn) => println!("{}\n", turn.cited_response),
            Err(error) => eprintln!("error: {error}"),
        }
    }
    Ok(())
}

async fn batch(
    spider: GrantSpider,
    settings: &Settings,
    file: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let queries: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    let request = BatchRequest::from_queries(name, queries)
        .with_settings(&settings.batch)
        .with_report(output.is_some());

    let mut processor = BatchProcessor::new(spider);
    if let Some(dir) = output {
        processor = processor.with_output_dir(dir);
    }
    let result = processor.process(&request).await?;

    for query in &result.results {
        let marker = match query.status {
            BatchStatus::Completed => "ok",
            _ => "failed",
        };
        println!(
            "[{marker}] {} ({} ms)",
            query.query, query.processing_time_ms
        );
        if let Some(error) = &query.error_message {
            println!("    {error}");
        }
    }
    println!(
        "{}/{} queries succeeded ({:.1}%)",
        result.successful_queries, result.total_queries, result.summary.success_rate
    );
    if let Some(path) = &result.report_path {
        println!("report: {}", path.display());
    }
    Ok(())
}
