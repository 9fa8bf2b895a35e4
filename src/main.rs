use ai_tutor::api::{create_router, AppState};
use ai_tutor::application::{ChatService, Retriever, SessionRegistry};
use ai_tutor::domain::ports::VectorStore;
use ai_tutor::infrastructure::{
    embedding_service, message_store, prompt_template, AppConfig, FlatIndex, KeywordFilter, RigLlm,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api=debug,ai_tutor=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load()?;
    let cfg = &config.config;

    let embedding = embedding_service(&cfg.embedding);
    let index = FlatIndex::load(&cfg.index.path, embedding.model_id(), embedding.dimension())?;
    info!(
        path = %cfg.index.path.display(),
        chunks = index.len(),
        model = embedding.model_id(),
        "Index loaded"
    );
    let retriever = Arc::new(Retriever::new(embedding, Arc::new(index), cfg.rag.top_k)?);

    let llm = Arc::new(RigLlm::new(&cfg.llm));
    info!(provider = ?cfg.llm.provider, model = llm.model(), "Completion client configured");

    let template = Arc::new(prompt_template(&config.prompts.tutor));
    let sessions =
        SessionRegistry::new(retriever, llm, template).with_max_sessions(cfg.store.max_sessions);
    let store = message_store(&cfg.store).await?;
    let filter = Arc::new(KeywordFilter::new(config.prompts.messages.disclaimer.clone()));

    let chat = ChatService::new(sessions, store, filter)
        .with_history_limit(cfg.store.history_limit)
        .with_unavailable_message(config.prompts.messages.unavailable.clone());

    let addr = SocketAddr::new(cfg.server.host.parse()?, cfg.server.port);
    if cfg.auth.api_key.is_none() {
        info!("No API key configured, /api/v1 is open");
    }

    let app = create_router(AppState::new(chat, config));

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
