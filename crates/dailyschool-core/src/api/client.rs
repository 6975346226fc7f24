//! API client for the Daily School REST API.
//!
//! All authorized traffic goes through [`ApiClient::execute`], which attaches
//! the stored access token as a bearer credential and, on a 401, refreshes the
//! token once and reissues the request. Sign-up, sign-in and refresh are sent
//! without credentials and are never retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::TokenStore;
use crate::config::Config;
use crate::models::{ApiEnvelope, RefreshPayload, TokenPayload};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const SIGN_UP_PATH: &str = "/auth/sign-up";
const SIGN_IN_PATH: &str = "/auth/sign-in";
const REFRESH_PATH: &str = "/refresh";
const POST_PATH: &str = "/post";

/// Longest non-JSON body echoed back in a fallback envelope.
const MAX_FALLBACK_MESSAGE_LENGTH: usize = 200;

/// What to do when an authorized request comes back 401.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Refresh the access token and reissue the request one time.
    #[default]
    RefreshOnce,
    /// Surface the 401 immediately.
    Never,
}

/// API client for Daily School.
/// Clone is cheap: the connection pool, token store and refresh lock are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    school: String,
    tokens: Arc<dyn TokenStore>,
    retry: RetryPolicy,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new API client reading and writing credentials through `tokens`
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            school: config.school.clone(),
            tokens,
            retry: RetryPolicy::default(),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Auth Endpoints =====

    /// Create an account. Does not sign in and never touches the token store.
    pub async fn sign_up(&self, email: &str, name: &str, password: &str) -> Result<ApiEnvelope, ApiError> {
        let url = self.url(SIGN_UP_PATH);
        debug!(url = %url, email = email, "Sending sign-up request");

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "email": email,
                "name": name,
                "password": password,
                "school": self.school,
            }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::read_envelope(response).await
    }

    /// Sign in and persist the returned token pair.
    ///
    /// A response without both tokens fails with [`ApiError::MissingTokens`]
    /// and leaves the token store untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ApiEnvelope, ApiError> {
        let url = self.url(SIGN_IN_PATH);
        debug!(url = %url, email = email, "Sending sign-in request");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let envelope = Self::read_envelope(response).await?;

        let Some((access_token, refresh_token)) = envelope
            .data_as::<TokenPayload>()
            .and_then(TokenPayload::into_pair)
        else {
            warn!(email = email, "Sign-in succeeded without a token pair");
            return Err(ApiError::MissingTokens);
        };

        self.tokens.save(&access_token, &refresh_token)?;
        info!(email = email, "Signed in");
        Ok(envelope)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Fails fast with [`ApiError::NoRefreshToken`] when nothing is stored.
    /// Any other failure clears both tokens and is returned as
    /// [`ApiError::RefreshFailed`].
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<String, ApiError> {
        let refresh_token = self.tokens.refresh_token()?.ok_or(ApiError::NoRefreshToken)?;

        match self.request_access_token(&refresh_token).await {
            Ok(access_token) => {
                self.tokens.set_access_token(&access_token)?;
                info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing stored tokens");
                if let Err(clear_err) = self.tokens.remove() {
                    warn!(error = %clear_err, "Failed to clear tokens after refresh failure");
                }
                Err(ApiError::RefreshFailed(Box::new(e)))
            }
        }
    }

    async fn request_access_token(&self, refresh_token: &str) -> Result<String, ApiError> {
        let url = self.url(REFRESH_PATH);
        debug!(url = %url, "Sending refresh request");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let envelope = Self::read_envelope(response).await?;

        envelope
            .data_as::<RefreshPayload>()
            .and_then(|payload| payload.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("refresh response missing data.accessToken".to_string()))
    }

    // ===== Application Endpoints =====

    /// Publish an announcement. Title and content travel as query parameters
    /// with an empty body.
    pub async fn create_post(&self, title: &str, content: &str) -> Result<ApiEnvelope, ApiError> {
        let url = self.url(POST_PATH);
        let response = self
            .execute(|client| client.post(&url).query(&[("title", title), ("content", content)]))
            .await?;
        Self::read_envelope(response).await
    }

    // ===== Request Pipeline =====

    /// Send an authorized request built by `build`.
    ///
    /// The builder runs once per attempt so the request can be reissued with
    /// a fresh credential. Per request: a 401 on the first attempt triggers
    /// one refresh and one retry; a 401 on the retry is returned as
    /// [`ApiError::Unauthorized`]. When the refresh itself fails its error is
    /// returned instead of the 401.
    pub async fn execute<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retried = false;

        loop {
            let (request, sent_token) = self.authorize(build(&self.client))?;
            let response = request.send().await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::check_response(response).await;
            }

            if retried || self.retry == RetryPolicy::Never {
                debug!(url = %response.url(), retried = retried, "Request unauthorized, not retrying");
                return Err(ApiError::Unauthorized);
            }

            debug!(url = %response.url(), "Request unauthorized, refreshing access token");
            self.refresh_after_unauthorized(sent_token.as_deref()).await?;
            retried = true;
        }
    }

    /// Attach the stored access token, if any. Returns the token that was sent.
    fn authorize(&self, request: RequestBuilder) -> Result<(RequestBuilder, Option<String>), ApiError> {
        match self.tokens.access_token()? {
            Some(token) => {
                let request = request.bearer_auth(&token);
                Ok((request, Some(token)))
            }
            None => Ok((request, None)),
        }
    }

    /// Refresh on behalf of a request that was rejected while carrying
    /// `sent_token`. If another request already replaced that token while we
    /// waited for the lock, the new one is reused without a second refresh.
    async fn refresh_after_unauthorized(&self, sent_token: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.access_token()? {
            if sent_token != Some(current.as_str()) {
                debug!("Access token changed while waiting, reusing it");
                return Ok(());
            }
        }

        self.refresh_locked().await.map(|_| ())
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

    /// Decode a response envelope. Empty bodies become an empty envelope and
    /// non-JSON bodies are kept as the envelope message.
    async fn read_envelope(response: Response) -> Result<ApiEnvelope, ApiError> {
        let body = response.text().await?;
        Ok(Self::parse_envelope(&body))
    }

    fn parse_envelope(body: &str) -> ApiEnvelope {
        if body.trim().is_empty() {
            return ApiEnvelope::default();
        }
        match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Response body is not an API envelope");
                ApiEnvelope {
                    message: Some(body.chars().take(MAX_FALLBACK_MESSAGE_LENGTH).collect()),
                    ..ApiEnvelope::default()
                }
            }
        }
    }
}
