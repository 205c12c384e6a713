use crate::auth::TokenKeys;
use crate::config::Config;
use crate::db::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Present only when a `SECRET` is configured.
    pub tokens: Option<TokenKeys>,
    pub admin_password: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            tokens: config
                .secret
                .as_deref()
                .map(|secret| TokenKeys::new(secret.as_bytes(), config.token_ttl)),
            admin_password: config.admin_password.as_deref().map(Arc::from),
        }
    }
}
