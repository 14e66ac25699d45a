use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use knowlex::analysis::enrich_item;
use knowlex::cache::MemoryCache;
use knowlex::extract::{ExtractOptions, ExtractRequest, KnowledgeExtractor, SchemaType};
use knowlex::llm::{CircuitBreaker, OllamaClient};
use knowlex::{schema, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "knowlex", version, about = "Extract structured knowledge from project documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract knowledge items from a text document
    Extract {
        /// Path to the document to extract from
        file: PathBuf,

        /// Knowledge shape to extract (business_rule, entity, api_contract,
        /// user_journey, glossary)
        #[arg(long, default_value = "business_rule")]
        schema_type: SchemaType,

        /// Chunk the document and merge per-chunk results
        #[arg(long)]
        batch: bool,

        /// Skip the LLM path and use only the regex fallback
        #[arg(long)]
        no_llm: bool,

        /// Fail instead of falling back to regex extraction when the LLM
        /// path errors
        #[arg(long)]
        no_fallback: bool,
    },

    /// Validate a knowledge item JSON document against the canonical schema
    Validate {
        /// Path to the JSON document
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file,
            schema_type,
            batch,
            no_llm,
            no_fallback,
        } => run_extract(file, schema_type, batch, no_llm, no_fallback).await,
        Command::Validate { file } => run_validate(file),
    }
}

async fn run_extract(
    file: PathBuf,
    schema_type: SchemaType,
    batch: bool,
    no_llm: bool,
    no_fallback: bool,
) -> Result<()> {
    let config = Config::load()?;

    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;

    let llm = Arc::new(OllamaClient::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm_timeout(),
    ));
    let cache = Arc::new(MemoryCache::new(config.cache.capacity, config.cache_ttl()));
    let _sweeper = cache.spawn_sweeper();
    let breaker = Arc::new(CircuitBreaker::new(
        config.breaker.failure_threshold,
        config.breaker_reset_timeout(),
    ));

    let extractor = KnowledgeExtractor::new(llm, cache, breaker)
        .with_max_retries(config.extraction.max_retries)
        .with_chunk_size(config.extraction.chunk_size);

    let req = ExtractRequest {
        text,
        source: file.display().to_string(),
        schema_type,
        options: ExtractOptions {
            use_llm: config.extraction.use_llm && !no_llm,
            use_fallback: config.extraction.use_fallback && !no_fallback,
        },
    };

    // Ctrl-C aborts cleanly during retry backoff waits.
    let cancel = CancellationToken::new();
    let ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc.cancel();
        }
    });

    let result = if batch {
        extractor.extract_batch(&req, &cancel).await?
    } else {
        extractor.extract(&req, &cancel).await?
    };

    log::info!(
        "extracted with confidence {:.2} via {:?} ({} tokens, {}ms)",
        result.confidence,
        result.source,
        result.metadata.tokens_used,
        result.metadata.processing_ms
    );
    for err in &result.errors {
        log::warn!("{}: {}", err.code, err.message);
    }

    let mut items = result.into_items();
    for item in &mut items {
        enrich_item(item);
        if let Err(e) = schema::validate_item(item, &config.schema.path) {
            log::warn!("item '{}' fails schema validation: {}", item.id, e);
        }
    }

    println!("{}", serde_json::to_string_pretty(&items)?);

    Ok(())
}

fn run_validate(file: PathBuf) -> Result<()> {
    let config = Config::load()?;

    schema::validate_value(
        &serde_json::from_str(
            &std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read document: {}", file.display()))?,
        )
        .context("Failed to parse document as JSON")?,
        &config.schema.path,
    )?;

    log::info!("{} is valid", file.display());
    println!("valid");

    Ok(())
}
