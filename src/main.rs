use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use faqrag::config::AppConfig;
use faqrag::database::Database;
use faqrag::embeddings::backfill_embeddings;
use faqrag::embeddings::EmbeddingService;
use faqrag::language::LanguageHint;
use faqrag::llm::LlmService;
use faqrag::pipeline::QueryOptions;
use faqrag::pipeline::QueryPipeline;
use faqrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "faqrag")]
#[command(about = "FAQRAG CLI for serving and querying the FAQ retrieval pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Answer a single question from the command line
    Ask {
        /// The question to answer
        question: String,
        /// Language code (kk, ru) or "auto"
        #[arg(short, long, default_value = "auto")]
        language: String,
        /// Skip the result cache
        #[arg(long)]
        no_cache: bool,
        /// Skip reranking
        #[arg(long)]
        no_rerank: bool,
    },
    /// Backfill embeddings for FAQ entries that have none
    Backfill,
    /// Create database tables and indexes
    InitSchema,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    faqrag::logging::init_logging_with_config(Some(&config))?;

    match cli.command {
        Commands::Serve => {
            faqrag::api::serve_api(&config).await?;
        }
        Commands::Ask {
            question,
            language,
            no_cache,
            no_rerank,
        } => {
            handle_ask(&config, &question, &language, no_cache, no_rerank).await?;
        }
        Commands::Backfill => {
            let database = Database::from_config(&config).await?;
            let embedding_service = EmbeddingService::new(&config)?;
            let processed = backfill_embeddings(&database, &embedding_service).await?;
            println!("Backfilled {} embeddings", processed);
        }
        Commands::InitSchema => {
            let database = Database::from_config(&config).await?;
            database.init_schema(config.embedding_dimension()).await?;
            println!("Schema initialized");
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| faqrag::FaqRagError::Custom(e.to_string()))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

async fn handle_ask(
    config: &AppConfig,
    question: &str,
    language: &str,
    no_cache: bool,
    no_rerank: bool,
) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let embedding_service = EmbeddingService::new(config)?;
    let llm_service = Arc::new(LlmService::new(config)?);
    let pipeline = QueryPipeline::new(database, embedding_service, llm_service, config);

    let hint = LanguageHint::parse(language)?;
    let options = QueryOptions {
        use_cache: !no_cache,
        use_rerank: !no_rerank,
    };

    info!("Asking: {}", question);
    let outcome = pipeline.process_query(question, hint, options).await?;

    println!("language:   {}", outcome.language);
    println!("intent:     {}", outcome.intent.as_str());
    println!("action:     {}", outcome.decision.action.as_str());
    println!("score:      {:.3}", outcome.decision.score);
    println!("from_cache: {}", outcome.from_cache);

    if let Some(best) = &outcome.decision.best {
        println!("\nBest match (faq {}):", best.entry.id);
        println!("  Q: {}", best.entry.question);
        println!("  A: {}", best.entry.answer_text);
    }

    if !outcome.decision.supporting.is_empty() {
        println!("\nSupporting candidates:");
        for candidate in &outcome.decision.supporting {
            println!(
                "  [{:.3}] {} (faq {})",
                candidate.score, candidate.entry.question, candidate.entry.id
            );
        }
    }

    Ok(())
}
