//! API client for communicating with the Design Twitter REST API.
//!
//! This module provides the `ApiClient` struct. Signup and login are sent
//! without credentials; every other call goes through the shared
//! `SessionManager` for its header and for 401 handling.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::SessionManager;
use crate::config::Config;
use crate::models::{
    AuthResponse, FeedItem, FollowRequest, LoginRequest, MessageResponse, Profile, SearchHit,
    SignupRequest, TweetRequest,
};

use super::ApiError;

/// API client for the Design Twitter backend.
/// Clone is cheap - reqwest::Client and the session are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &Config, session: Arc<SessionManager>) -> Result<Self, ApiError> {
        Self::with_timeout(
            config.api_base(),
            Duration::from_secs(config.request_timeout_secs),
            session,
        )
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionManager>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Credentials =====

    /// Register a new account. If the backend answers with a token the user
    /// is logged in straight away; otherwise they must call `login`.
    pub async fn signup(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<String, ApiError> {
        let body = SignupRequest {
            username: username.to_string(),
            email: email.map(str::to_string),
            password: password.to_string(),
        };
        let auth: AuthResponse = Self::execute(self.client.post(self.url("signup")).json(&body)).await?;

        match auth.token {
            Some(token) => self.session.store(token, username),
            None => debug!(username, "Signup response carried no token"),
        }
        info!(username, "Signup successful");
        Ok(auth.message)
    }

    /// Log in and replace any current session.
    ///
    /// Bad credentials come back as `Unauthorized` with the server's
    /// message; an existing session is left alone in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = Self::execute(self.client.post(self.url("login")).json(&body)).await?;

        let token = auth
            .token
            .ok_or_else(|| ApiError::InvalidResponse("Login response missing token".to_string()))?;
        self.session.store(token, email);
        info!(email, "Login successful");
        Ok(auth.message)
    }

    /// Forget the session locally. The backend keeps no logout state.
    pub fn logout(&self) {
        self.session.clear();
    }

    // ===== Authorized calls =====

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.send_authorized(self.client.get(self.url("profile"))).await
    }

    pub async fn feed(&self) -> Result<Vec<FeedItem>, ApiError> {
        self.send_authorized(self.client.get(self.url("feed"))).await
    }

    /// Profile and feed together, as the home view shows them.
    /// Both requests carry the same token; a 401 on either ends the session.
    pub async fn home(&self) -> Result<(Profile, Vec<FeedItem>), ApiError> {
        futures::try_join!(self.profile(), self.feed())
    }

    pub async fn search(&self, prefix: &str) -> Result<Vec<SearchHit>, ApiError> {
        let request = self.client.get(self.url("search")).query(&[("prefix", prefix)]);
        self.send_authorized(request).await
    }

    pub async fn tweet(&self, content: &str) -> Result<String, ApiError> {
        let body = TweetRequest {
            content: content.to_string(),
        };
        self.post_message("tweet", &body).await
    }

    pub async fn follow(&self, target_username: &str) -> Result<String, ApiError> {
        let body = FollowRequest {
            target_username: target_username.to_string(),
        };
        self.post_message("follow", &body).await
    }

    pub async fn unfollow(&self, target_username: &str) -> Result<String, ApiError> {
        let body = FollowRequest {
            target_username: target_username.to_string(),
        };
        self.post_message("unfollow", &body).await
    }

    // ===== Plumbing =====

    async fn post_message<B: Serialize>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .send_authorized(self.client.post(self.url(path)).json(body))
            .await?;
        Ok(response.message)
    }

    /// Attach the session header, send, and apply the expiry policy.
    /// Without a session this fails before anything goes on the wire.
    async fn send_authorized<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let headers = self.session.authorized_header()?;
        let result = Self::execute(request.headers(headers)).await;
        self.session.handle_response(result)
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        debug!(url = %response.url(), status = %response.status(), "Response received");
        let response = Self::check_response(response).await?;
        Self::parse(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}
