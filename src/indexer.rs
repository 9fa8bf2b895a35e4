//! Offline index build: `indexer [--query "<text>"]`.
//!
//! Ingests the configured corpus, embeds every chunk, writes the index and
//! optionally runs one top-3 search against the fresh index.

use ai_tutor::application::{CorpusIngestor, IndexingService, Retriever};
use ai_tutor::infrastructure::{embedding_service, AppConfig, FlatIndex};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SMOKE_TOP_K: usize = 3;

fn query_arg() -> anyhow::Result<Option<String>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--query") => match args.next() {
            Some(query) => Ok(Some(query)),
            None => anyhow::bail!("--query needs a value"),
        },
        Some(other) => anyhow::bail!("unknown argument '{other}'; usage: indexer [--query \"<text>\"]"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indexer=info,ai_tutor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let query = query_arg()?;
    let config = AppConfig::load()?;
    let cfg = &config.config;

    let embedding = embedding_service(&cfg.embedding);
    let ingestor = CorpusIngestor::new(cfg.ingest.chunk_size, cfg.ingest.chunk_overlap)
        .with_extensions(cfg.ingest.extensions.iter().cloned());
    let indexer = IndexingService::new(ingestor, embedding.clone(), cfg.embedding.batch_size);

    info!(
        corpus = %cfg.ingest.corpus_dir.display(),
        model = embedding.model_id(),
        "Building index"
    );
    let report = indexer
        .rebuild(&cfg.ingest.corpus_dir, &cfg.index.path)
        .await?;
    info!(
        chunks = report.chunks,
        sources = report.sources,
        dimension = report.dimension,
        path = %cfg.index.path.display(),
        "Index written"
    );

    if let Some(query) = query {
        let index = FlatIndex::load(&cfg.index.path, embedding.model_id(), embedding.dimension())?;
        let retriever = Retriever::new(embedding, Arc::new(index), SMOKE_TOP_K)?;
        let results = retriever.retrieve_with_scores(&query, SMOKE_TOP_K).await?;
        for (rank, result) in results.iter().enumerate() {
            let preview: String = result.chunk.text.chars().take(120).collect();
            println!(
                "{}. [{} p.{}] d={:.4} {}",
                rank + 1,
                result.chunk.source_name(),
                result.chunk.locator,
                result.distance,
                preview.replace('\n', " ")
            );
        }
    }

    Ok(())
}
