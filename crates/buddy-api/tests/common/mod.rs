#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use buddy_api::config::Config;
use buddy_api::gateway::GatewayWorker;
use buddy_api::service::{ConversationService, ResponderSettings};
use buddy_api::state::AppState;
use buddy_context::{CharRatioEstimator, ContextBudget, DefaultContextStrategy};
use buddy_llm::{ChatClient, ChatRequest, ChatResponse};
use buddy_persist::InMemoryPersistenceClient;

pub const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [bot]
    name = "Buddy"
    personality = "friendly"

    [discord]
    autostart = false
"#;

/// Chat backend that replays scripted outcomes and records requests
#[derive(Default)]
pub struct FakeChatClient {
    outcomes: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(anyhow!(error.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()));
        outcome.map(ChatResponse::text)
    }
}

pub fn config() -> Config {
    Config::from_toml_str(CONFIG, |_| None).unwrap()
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub persist: Arc<InMemoryPersistenceClient>,
    pub llm: Arc<FakeChatClient>,
}

/// App wired with in-memory storage, the char estimator and `budget`
pub fn harness_with_budget(llm: FakeChatClient, budget: ContextBudget) -> Harness {
    let config = config();
    let persist = Arc::new(InMemoryPersistenceClient::new());
    let llm = Arc::new(llm);
    let strategy = Arc::new(DefaultContextStrategy::new(Arc::new(CharRatioEstimator::default()), budget));

    let conversations = Arc::new(ConversationService::new(
        persist.clone(),
        llm.clone(),
        strategy,
        ResponderSettings::from_config(&config),
    ));
    let gateway = GatewayWorker::new(None, conversations.clone());
    let state = Arc::new(AppState::new(config, persist.clone(), conversations, gateway));

    Harness { state, persist, llm }
}

pub fn harness(llm: FakeChatClient) -> Harness {
    let budget = config().budget();
    harness_with_budget(llm, budget)
}
