use std::sync::Arc;

use crate::application::{ChatService, Retriever};
use crate::domain::ports::MessageStore;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(chat: ChatService, config: AppConfig) -> Self {
        Self {
            chat: Arc::new(chat),
            config: Arc::new(config),
        }
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        self.chat.sessions().retriever()
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        self.chat.store()
    }
}
