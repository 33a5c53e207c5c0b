//! Brevis CLI - summarise webpages and videos from the command line
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use std::sync::Arc;

use brevis::agent::OpenAiAgent;
use brevis::extract::{ContentSource, Strategy, WebContentSource};
use brevis::related::ExaClient;
use brevis::storage::StoredSummary;
use brevis::{Config, Pipeline, SearchIndex, Storage};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use tracing::warn;

#[derive(Parser)]
#[command(name = "brevis")]
#[command(author, version, about = "Summarise webpages and videos from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a webpage or video by URL
    Summarise {
        /// URL to summarise
        url: String,
        /// Show raw extracted content instead of a summary
        #[arg(long)]
        raw: bool,
    },
    /// Search stored summaries
    Search {
        /// Search query
        query: String,
    },
    /// List all stored summaries
    List,
    /// Remove the stored summary for a URL
    Forget {
        /// URL to remove
        url: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarise { url, raw } => {
            if raw {
                // Just show the extracted content, picked the same way
                // the pipeline would pick it.
                let strategy = Strategy::for_url(&url);
                let source = WebContentSource::new();
                let content = source.extract(&url, strategy).await?;

                println!("{}", content);
                println!("\n--- Extracted {} characters ---", content.len());
                return Ok(());
            }

            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;
            let agent = OpenAiAgent::new(config.openai_key()?, config.agent.model.clone())?;
            let finder = ExaClient::new(config.exa_key()?)?;

            let pipeline = Pipeline::new(
                Arc::new(storage),
                Arc::new(WebContentSource::new()),
                Arc::new(agent),
                Arc::new(finder),
            );

            println!("Summarising: {}", url);
            let summary = match pipeline.summarize(&url).await {
                Ok(summary) => summary,
                Err(err) => {
                    warn!(%url, error = %err, "summarise pipeline failed");
                    eprintln!(
                        "{}",
                        "Unable to summarise content or fetch related articles.".red()
                    );
                    std::process::exit(1);
                }
            };

            // Index in tantivy for full-text search
            let search_path = config.storage.path.join("search_index");
            if let Ok(search_index) = SearchIndex::open(&search_path) {
                if let Err(e) = search_index.index_summary(&url, &summary) {
                    eprintln!("Warning: Failed to index summary: {}", e);
                }
            }

            println!("\n{}\n", format!("=== {} ===", url).bold());
            println!("{}\n", summary.text);
            println!("🔢 Tokens used: {}", summary.tokens_used);

            if !summary.related.is_empty() {
                println!("\n🔗 Related articles:");
                for article in &summary.related {
                    println!("  • {}", article.title);
                    println!("    {}", article.url.dimmed());
                    if !article.excerpt.trim().is_empty() {
                        println!("    {}", excerpt_line(&article.excerpt));
                    }
                }
            }
        }
        Commands::Search { query } => {
            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;

            // Try tantivy first, fall back to simple search
            let search_path = config.storage.path.join("search_index");
            let results = if let Ok(search_index) = SearchIndex::open(&search_path) {
                match search_index.search(&query, 20) {
                    Ok(urls) if !urls.is_empty() => urls,
                    _ => simple_search(&storage, &query)?,
                }
            } else {
                simple_search(&storage, &query)?
            };

            if results.is_empty() {
                println!("No results found for: {}", query);
            } else {
                println!("Search results for '{}':\n", query);
                for url in &results {
                    if let Ok(Some(stored)) = storage.get(url) {
                        print_entry(&stored);
                    }
                }
            }
        }
        Commands::List => {
            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;
            let summaries = storage.list_all()?;

            if summaries.is_empty() {
                println!("No stored summaries found.");
            } else {
                println!("Stored summaries ({}):\n", storage.count());
                for stored in &summaries {
                    print_entry(stored);
                }
            }
        }
        Commands::Forget { url } => {
            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;

            if storage.delete(&url)? {
                let search_path = config.storage.path.join("search_index");
                if let Ok(search_index) = SearchIndex::open(&search_path) {
                    if let Err(e) = search_index.remove(&url) {
                        eprintln!("Warning: Failed to update search index: {}", e);
                    }
                }
                println!("Removed stored summary for {}", url);
            } else {
                println!("No stored summary for {}", url);
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn print_entry(stored: &StoredSummary) {
    println!(
        "📄 {} ({})",
        stored.url,
        stored.created_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "   {} tokens, {} related",
        stored.summary.tokens_used,
        stored.summary.related.len()
    );
    println!("   {}\n", stored.summary.preview(120));
}

/// One trimmed line of excerpt for the related-articles section
fn excerpt_line(excerpt: &str) -> String {
    let line = excerpt.lines().next().unwrap_or("").trim();
    let mut out: String = line.chars().take(100).collect();
    if line.chars().count() > 100 {
        out.push('…');
    }
    out
}

/// Simple text-based search fallback when tantivy index is not available
fn simple_search(storage: &Storage, query: &str) -> anyhow::Result<Vec<String>> {
    let query_lower = query.to_lowercase();
    let all_summaries = storage.list_all()?;

    let results: Vec<String> = all_summaries
        .into_iter()
        .filter(|stored| {
            let summary = &stored.summary;
            summary.text.to_lowercase().contains(&query_lower)
                || summary
                    .related
                    .iter()
                    .any(|article| article.title.to_lowercase().contains(&query_lower))
        })
        .map(|stored| stored.url)
        .collect();

    Ok(results)
}
