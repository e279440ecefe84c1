//! # HTTP client for the backend
//!
//! [`ApiClient`] wraps `reqwest` with the backend's routes and wire types from the
//! `api` crate. Protected calls send the stored bearer token; calling one without a
//! token fails with [`ClientError::SignedOut`] before any request is made.
//!
//! Non-2xx answers become [`ClientError::Status`] carrying the server's `error`
//! message, so the UI can show it as is.

use api::models::{
    AuthResponse, LikeResponse, LikedPosts, LoginRequest, MessageResponse, NewPost, PostInfo,
    PostPage, PostQuery, ProfileUpdate, SaveResponse, SavedPosts, SignupRequest,
    SurveyResponse, SurveySaved, UserInfo, UserPosts,
};
use reqwest::{multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not signed in")]
    SignedOut,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::SignedOut => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/api{path}", self.base_url))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::SignedOut)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: Option<Value> = response.json().await.ok();
        let message = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        tracing::debug!(status = status.as_u16(), %message, "request rejected");
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    /// `GET /health`; `false` when the server answers but its database does not.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        Ok(body.get("ok").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Create an account and keep its token for later calls.
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        let auth: AuthResponse =
            Self::send(self.request(Method::POST, "/signup").json(&body)).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Log in and keep the token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let auth: AuthResponse =
            Self::send(self.request(Method::POST, "/login").json(&body)).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn profile(&self) -> Result<UserInfo, ClientError> {
        Self::send(self.authed(Method::GET, "/user/profile")?).await
    }

    pub async fn update_profile(&self, name: &str) -> Result<UserInfo, ClientError> {
        let body = ProfileUpdate { name: name.into() };
        Self::send(self.authed(Method::PUT, "/user/profile")?.json(&body)).await
    }

    pub async fn upload_photo(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UserInfo, ClientError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("photo", part);
        Self::send(self.authed(Method::POST, "/user/profile-photo")?.multipart(form)).await
    }

    pub async fn delete_photo(&self) -> Result<UserInfo, ClientError> {
        Self::send(self.authed(Method::DELETE, "/user/profile-photo")?).await
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, ClientError> {
        Self::send(self.request(Method::GET, "/posts").query(query)).await
    }

    pub async fn get_post(&self, id: i64) -> Result<PostInfo, ClientError> {
        Self::send(self.request(Method::GET, &format!("/posts/{id}"))).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<PostInfo, ClientError> {
        Self::send(self.authed(Method::POST, "/posts")?.json(post)).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<MessageResponse, ClientError> {
        Self::send(self.authed(Method::DELETE, &format!("/posts/{id}"))?).await
    }

    pub async fn like(&self, id: i64) -> Result<LikeResponse, ClientError> {
        Self::send(self.authed(Method::POST, &format!("/posts/{id}/like"))?).await
    }

    pub async fn save(&self, id: i64) -> Result<SaveResponse, ClientError> {
        Self::send(self.authed(Method::POST, &format!("/posts/{id}/save"))?).await
    }

    pub async fn liked_posts(&self) -> Result<Vec<i64>, ClientError> {
        let liked: LikedPosts = Self::send(self.authed(Method::GET, "/user/likes")?).await?;
        Ok(liked.liked_posts)
    }

    pub async fn saved_posts(&self) -> Result<Vec<PostInfo>, ClientError> {
        let saved: SavedPosts = Self::send(self.authed(Method::GET, "/user/saves")?).await?;
        Ok(saved.saved_posts)
    }

    pub async fn user_posts(&self) -> Result<Vec<PostInfo>, ClientError> {
        let posts: UserPosts = Self::send(self.authed(Method::GET, "/user/posts")?).await?;
        Ok(posts.user_posts)
    }

    pub async fn submit_survey(&self, data: &Value) -> Result<(), ClientError> {
        let _: SurveySaved = Self::send(self.authed(Method::POST, "/survey")?.json(data)).await?;
        Ok(())
    }

    pub async fn survey(&self) -> Result<Option<Value>, ClientError> {
        let survey: SurveyResponse = Self::send(self.authed(Method::GET, "/survey")?).await?;
        Ok(survey.data)
    }
}
