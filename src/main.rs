use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fdq_assistant::AssistantClient;
use fdq_cli::{
    QaPipeline, display_banner, parse_selection, prompt, render_outcome, render_submissions,
};
use fdq_core::DocumentReference;
use fdq_fetch::{HttpDocumentFetcher, OpenFdaClient};

#[derive(Parser)]
#[command(name = "fdq")]
#[command(about = "FDA drug-submission lookup and document Q&A", long_about = None)]
struct Cli {
    /// Drug brand name to look up
    brand: Option<String>,

    /// Question to ask about the selected documents
    #[arg(short, long)]
    question: Option<String>,

    /// Comma-separated 1-based rows to process (e.g. "1,3")
    #[arg(short, long)]
    select: Option<String>,

    /// Base directory for per-run workspaces
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Maximum number of records to request from openFDA
    #[arg(long, default_value_t = 100)]
    limit: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fdq=info")),
        )
        .init();

    let cli = Cli::parse();
    display_banner();

    let brand = match cli.brand {
        Some(brand) => brand,
        None => prompt("Drug brand name:")?,
    };
    if brand.is_empty() {
        println!("{}", "Please enter a drug brand name.".yellow());
        return Ok(());
    }

    println!("🔎 Fetching submissions for {}...", brand.bold());
    let rows = OpenFdaClient::from_env()?
        .original_submissions(&brand, cli.limit)
        .await?;

    if rows.is_empty() {
        println!("No original submissions found for '{brand}'.");
        return Ok(());
    }

    println!(
        "✅ Found {} original submission document(s) for {}.\n",
        rows.len(),
        brand.bold()
    );
    render_submissions(&rows);

    let selection_input = match cli.select {
        Some(select) => select,
        None => prompt("Rows to process (e.g. 1,3):")?,
    };
    let selection = parse_selection(&selection_input, rows.len());

    let mut references = Vec::new();
    for index in &selection {
        let row = &rows[index - 1];
        match DocumentReference::from_url(&row.url) {
            Some(reference) => references.push(reference),
            None => println!("{} Skipping unsupported document: {}", "⚠️".yellow(), row.url),
        }
    }

    let question = match cli.question {
        Some(question) => question,
        None => prompt("Question about the selected documents:")?,
    };

    let fetcher = HttpDocumentFetcher::new()?;
    let engine = AssistantClient::from_env()?;
    let pipeline = QaPipeline::new(
        fetcher,
        engine,
        cli.workspace.unwrap_or_else(default_workspace_base),
    );

    println!("🤖 Processing {} document reference(s)...", references.len());
    let outcome = pipeline.run(&references, &question).await?;

    println!();
    render_outcome(&outcome);

    Ok(())
}

fn default_workspace_base() -> PathBuf {
    std::env::var_os("FDQ_WORKSPACE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("fdq"))
}
