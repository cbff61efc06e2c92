use std::sync::Arc;

use buddy_persist::PersistenceClient;

use crate::config::Config;
use crate::gateway::GatewayWorker;
use crate::service::ConversationService;

/// Shared application state passed to all handlers
///
/// Built once in `main`; the gateway worker and the HTTP handlers share the
/// same conversation service.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub conversations: Arc<ConversationService>,
    pub gateway: Arc<GatewayWorker>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        conversations: Arc<ConversationService>,
        gateway: GatewayWorker,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            conversations,
            gateway: Arc::new(gateway),
        }
    }
}
