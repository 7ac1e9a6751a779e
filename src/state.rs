use crate::{
    config::AppConfig,
    services::sessions::{EvictionPolicy, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let sessions = SessionStore::new(EvictionPolicy {
            ttl: config.session_ttl,
            max_sessions: config.max_sessions,
        });
        Self { config, sessions }
    }
}
