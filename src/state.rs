use std::sync::Arc;

use crate::{
    auth::{AuthGate, TokenService},
    config::Config,
    errors::AppError,
    store::{MemoryStore, MongoStore, RevocationLedger, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub revocations: Arc<dyn RevocationLedger>,
    pub tokens: TokenService,
    pub gate: AuthGate,
    pub cfg: Arc<Config>,
}

impl AppState {
    pub fn new(
        cfg: Config,
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationLedger>,
    ) -> Self {
        let tokens = TokenService::from_config(&cfg);
        let gate = AuthGate::new(tokens.clone(), revocations.clone());
        Self {
            users,
            revocations,
            tokens,
            gate,
            cfg: Arc::new(cfg),
        }
    }

    pub fn in_memory(cfg: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(cfg, store.clone(), store)
    }

    /// Picks the backend from config: MongoDB when a URI is set, memory otherwise.
    pub async fn connect(cfg: Config) -> Result<Self, AppError> {
        match cfg.mongodb_uri.clone() {
            Some(uri) => {
                let store = Arc::new(MongoStore::connect(&uri, &cfg.db_name).await?);
                Ok(Self::new(cfg, store.clone(), store))
            }
            None => {
                tracing::warn!("MONGODB_URI not set; users and revocations live in memory only");
                Ok(Self::in_memory(cfg))
            }
        }
    }
}
