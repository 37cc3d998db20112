use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use datascope::assistant::{DataAssistant, GeminiProvider, LocalProvider};
use datascope::config::AssistantConfig;
use datascope::{ingestion, MatchType};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "datascope")]
#[command(about = "AI-assisted discovery over a data catalog")]
struct Args {
    /// Natural-language query; omit for a catalog overview
    query: Option<String>,

    /// Directory with applications.json / data_sources.json / tables.json
    /// (falls back to the built-in sample catalog)
    #[arg(short, long)]
    catalog_dir: Option<PathBuf>,

    /// Maximum results to print
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// Skip the generative backend and answer locally
    #[arg(long)]
    offline: bool,

    /// Discovery only, no conversational answer
    #[arg(long)]
    no_ai: bool,

    /// Gemini API key (or set GEMINI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let catalog = match &args.catalog_dir {
        Some(dir) => ingestion::load_from_dir(dir)?,
        None => {
            info!("no catalog directory given, using the built-in sample catalog");
            ingestion::sample_catalog()
        }
    };
    let catalog = Arc::new(catalog);

    let mut config = AssistantConfig::from_env();
    if let Some(key) = args.api_key.clone() {
        config = config.with_api_key(key);
    }

    let assistant = DataAssistant::new(
        catalog.clone(),
        Arc::new(GeminiProvider::new(&config)?),
        Arc::new(LocalProvider::new()),
    );
    if args.offline {
        assistant.set_use_gemini(false);
    }

    let query = args.query.clone().unwrap_or_default();
    let reply = assistant.ask(&query).await;

    println!("=== Discovery ===");
    println!("Intent: {}", reply.discovery.intent.intent);
    if reply.discovery.suggestions.is_empty() {
        println!("No matching assets.");
    }
    for (i, result) in reply.discovery.suggestions.iter().take(args.limit).enumerate() {
        let marker = match result.match_type {
            MatchType::Exact => "exact",
            MatchType::Semantic => "semantic",
            MatchType::Related => "related",
        };
        println!(
            "{:2}. [{:>8.1}] {:<12} {}  ({}){}",
            i + 1,
            result.score,
            marker,
            result.path,
            result.reason,
            if result.sensitive { "  [sensitive]" } else { "" },
        );
    }

    for warning in &reply.discovery.warnings {
        println!("! {}", warning);
    }

    if !reply.discovery.alternative_queries.is_empty() {
        println!("\nTry also: {}", reply.discovery.alternative_queries.join(" | "));
    }

    if !args.no_ai {
        println!("\n=== Assistant ({}) ===", assistant.active_provider_name());
        println!("{}", reply.ai.answer);
        println!("\nConfidence: {:.0}%", reply.ai.confidence * 100.0);
        if !reply.ai.suggested_queries.is_empty() {
            println!("Follow-ups: {}", reply.ai.suggested_queries.join(" | "));
        }
    }

    println!("\nRequest {} at {}", reply.request_id, Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}
