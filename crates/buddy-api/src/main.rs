use std::sync::Arc;

use anyhow::Context as _;
use buddy_api::{
    app::build_router,
    config::{Config, StorageBackend},
    gateway::GatewayWorker,
    service::{ConversationService, ResponderSettings},
    state::AppState,
};
use buddy_context::{ContextStrategy, DefaultContextStrategy};
use buddy_llm::{ChatClient, OpenAIClient, OpenAIConfig};
use buddy_persist::{InMemoryPersistenceClient, MongoPersistenceClient, PersistenceClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting chat buddy");
    tracing::info!(
        model = %config.model(),
        prompt_tokens = config.budget().prompt_tokens(),
        "Config loaded: {}:{}",
        config.server.host,
        config.server.port
    );

    // LLM client
    let mut llm_config = OpenAIConfig::new(config.openai_api_key.clone()).with_timeout_secs(config.llm.timeout_secs);
    if let Some(base_url) = &config.llm.base_url {
        llm_config = llm_config.with_base_url(base_url.clone());
    }
    let llm_client: Arc<dyn ChatClient> = Arc::new(OpenAIClient::from_config(&llm_config)?);

    // Storage
    let persist_client: Arc<dyn PersistenceClient> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, history is lost on restart");
            Arc::new(InMemoryPersistenceClient::new())
        }
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let uri = config.mongodb_uri.as_deref().context("MONGODB_URI is not set")?;
            let client = MongoPersistenceClient::connect(uri, &config.storage.database).await?;
            tracing::info!("MongoDB connected");
            Arc::new(client)
        }
    };

    // Context strategy
    let estimator = config.context.estimator.build(config.context.block_overhead)?;
    let context_strategy: Arc<dyn ContextStrategy> = Arc::new(DefaultContextStrategy::new(estimator, config.budget()));

    let conversations = Arc::new(ConversationService::new(
        persist_client.clone(),
        llm_client,
        context_strategy,
        ResponderSettings::from_config(&config),
    ));

    let gateway = GatewayWorker::new(config.discord_bot_token.clone(), conversations.clone());
    let state = Arc::new(AppState::new(config.clone(), persist_client, conversations, gateway));

    if config.discord.autostart {
        if let Err(e) = state.gateway.start().await {
            tracing::warn!("Discord gateway not started: {:#}", e);
        }
    }

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.gateway.stop().await;
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
