use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::llm_service::LlmService;
use crate::services::session_store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub llm: Arc<LlmService>,
    pub price_provider: Arc<dyn PriceProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, llm: LlmService, price_provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            llm: Arc::new(llm),
            price_provider,
        }
    }
}
