//! Concierge Gateway: guest chat endpoint backed by the FAQ store with generation fallback.
//! Bind address, storage and LLM settings come from `ConciergeConfig` (file + CONCIERGE__* env).

mod routes;

use concierge_core::{AnswerRouter, ChatCompletionsClient, ConciergeConfig, FaqStore};
use routes::AppState;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[concierge-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ConciergeConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[concierge-gateway] config load failed: {}", e);
            std::process::exit(1);
        }
    };

    let store = match FaqStore::open(Some(config.storage_path.as_str())) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[concierge-gateway] FAQ store at {} failed to open: {}", config.storage_path, e);
            std::process::exit(1);
        }
    };

    if let Some(seed) = config.seed_path.as_deref() {
        if store.is_empty() {
            match store.seed_from_jsonl(Path::new(seed)) {
                Ok(n) => tracing::info!("Seeded {} FAQ entries from {}", n, seed),
                Err(e) => tracing::warn!("FAQ seed {} skipped: {}", seed, e),
            }
        }
    }

    let api_key = config.api_key();
    if api_key.is_none() {
        tracing::warn!(
            "No LLM API key (CONCIERGE__LLM_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY); \
             unmatched questions will fail until one is set"
        );
    }
    let generator = ChatCompletionsClient::new(&config.llm_api_url, api_key, config.generation_timeout());
    let router = AnswerRouter::new(
        Arc::new(store.clone()),
        Arc::new(generator),
        config.router_settings(),
    );

    let state = Arc::new(AppState {
        router,
        store: store.clone(),
    });

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[concierge-gateway] bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "{} v{} listening on {} (model {})",
        config.app_name,
        concierge_core::version(),
        addr,
        config.llm_model
    );

    let server = axum::serve(
        listener,
        routes::app(state).into_make_service_with_connect_info::<SocketAddr>(),
    );

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested (Ctrl+C)");
        }
    }

    if let Err(e) = store.flush() {
        tracing::error!("FAQ store flush on shutdown failed: {}", e);
    }
}
