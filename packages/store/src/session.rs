//! The signed-in account as remembered on the device.
//!
//! | Key | Value |
//! |-----|-------|
//! | `user` | JSON [`UserInfo`] |
//! | `token` | bearer token, raw string |
//! | `surveyCompleted` | `"true"` once the onboarding survey was submitted |
//! | `surveyData` | JSON survey answers |
//!
//! Logging out forgets the account and the survey flag but keeps the survey answers,
//! which also personalise the signed-out screens.

use api::models::{AuthResponse, UserInfo};
use serde_json::Value;

use crate::error::StoreError;
use crate::kv::{set_json, KeyValueStore};

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";
pub const SURVEY_COMPLETED_KEY: &str = "surveyCompleted";
pub const SURVEY_DATA_KEY: &str = "surveyData";

#[derive(Clone, Debug)]
pub struct ClientSession<S> {
    store: S,
}

impl<S: KeyValueStore> ClientSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Remember the account returned by signup or login.
    pub async fn login(&self, auth: &AuthResponse) -> Result<(), StoreError> {
        set_json(&self.store, USER_KEY, &auth.user).await?;
        self.store.set(TOKEN_KEY, auth.token.clone()).await?;
        tracing::info!(user_id = auth.user.id, "signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), StoreError> {
        for key in [TOKEN_KEY, USER_KEY, SURVEY_COMPLETED_KEY] {
            self.store.remove(key).await?;
        }
        tracing::info!("signed out");
        Ok(())
    }

    pub async fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|token| !token.is_empty()))
    }

    pub async fn is_signed_in(&self) -> Result<bool, StoreError> {
        Ok(self.token().await?.is_some())
    }

    /// The cached user; an unreadable record counts as signed out.
    pub async fn user(&self) -> Result<Option<UserInfo>, StoreError> {
        let Some(raw) = self.store.get(USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable cached user");
                Ok(None)
            }
        }
    }

    /// Replace the cached user after a profile change.
    pub async fn set_user(&self, user: &UserInfo) -> Result<(), StoreError> {
        set_json(&self.store, USER_KEY, user).await
    }

    pub async fn complete_survey(&self, data: &Value) -> Result<(), StoreError> {
        set_json(&self.store, SURVEY_DATA_KEY, data).await?;
        self.store.set(SURVEY_COMPLETED_KEY, "true".into()).await
    }

    pub async fn survey_completed(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(SURVEY_COMPLETED_KEY).await?.as_deref() == Some("true"))
    }

    pub async fn survey_data(&self) -> Result<Option<Value>, StoreError> {
        let Some(raw) = self.store.get(SURVEY_DATA_KEY).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }
}
