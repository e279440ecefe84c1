use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenKeys;
use crate::db::Database;
use crate::settings::{Settings, Uploads};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState<D> {
    pub db: D,
    pub tokens: Arc<TokenKeys>,
    pub uploads: Arc<Uploads>,
}

impl<D: Database> AppState<D> {
    pub fn new(db: D, settings: &Settings) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenKeys::new(
                &settings.auth.jwt_secret,
                settings.auth.token_ttl_days,
            )),
            uploads: Arc::new(settings.uploads.clone()),
        }
    }
}

impl<D> FromRef<AppState<D>> for Arc<TokenKeys> {
    fn from_ref(state: &AppState<D>) -> Self {
        state.tokens.clone()
    }
}
