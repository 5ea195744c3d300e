use std::sync::Arc;

use active_context_core::adapters::DatabaseAdapter;
use active_context_core::config::ContextConfig;

use crate::session::SessionMaterializer;

/// Shared state handed to every active-context action.
pub struct ApiContext<DB: DatabaseAdapter> {
    pub config: Arc<ContextConfig>,
    pub database: Arc<DB>,
}

impl<DB: DatabaseAdapter> ApiContext<DB> {
    pub fn new(config: Arc<ContextConfig>, database: Arc<DB>) -> Self {
        Self { config, database }
    }

    pub fn session_materializer(&self) -> SessionMaterializer<DB> {
        SessionMaterializer::new(self.config.clone(), self.database.clone())
    }
}

impl<DB: DatabaseAdapter> Clone for ApiContext<DB> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            database: self.database.clone(),
        }
    }
}
