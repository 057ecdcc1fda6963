use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use agentdesk::app;
use agentdesk::config::AppConfig;
use agentdesk::external::yahoofinance::YahooFinanceProvider;
use agentdesk::logging::{init_logging, LoggingConfig};
use agentdesk::services::llm_service::{LlmService, OpenAiCompatibleProvider};
use agentdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let config = AppConfig::from_env();
    if config.llm.default_api_key.is_none() {
        info!("GROQ_API_KEY not set; sessions must supply their own API key");
    }

    let provider = OpenAiCompatibleProvider::from_config(&config.llm)
        .context("failed to build completion client")?;
    let llm = LlmService::new(config.llm.clone(), Arc::new(provider));
    info!("🤖 Completion API: {} (model: {})", config.llm.base_url, config.llm.model);

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, llm, Arc::new(YahooFinanceProvider::new()));
    let app = app::create_app(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("🚀 agentdesk backend running at http://{}/", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
