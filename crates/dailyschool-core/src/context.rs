//! Application context shared by every front-end screen.
//!
//! `AppContext` owns the API client, the announcement board and, between
//! [`AppContext::mount`] and [`AppContext::unmount`], the auth session. Screens
//! receive it explicitly instead of reaching for global state; asking for the
//! session while unmounted is a usage error.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthSession, TokenStore};
use crate::config::Config;
use crate::models::{ApiEnvelope, NewsDraft, NewsItem, SessionUser};
use crate::news::{BoardError, NewsBoard, Newsletter};

/// Name given to a user who signs in; the sign-in response carries no profile.
pub const DEFAULT_USER_NAME: &str = "사용자";

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Auth session used outside a mounted app context")]
    NotMounted,

    #[error("Sign in to post announcements")]
    NotAuthenticated,

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Token storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub struct AppContext {
    config: Config,
    api: ApiClient,
    session: Option<AuthSession>,
    board: NewsBoard,
}

impl AppContext {
    pub fn new(config: Config, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, tokens)?;
        Ok(Self::with_client(config, api))
    }

    /// Build around an existing client (custom retry policy, shared pool).
    pub fn with_client(config: Config, api: ApiClient) -> Self {
        Self {
            config,
            api,
            session: None,
            board: NewsBoard::new(),
        }
    }

    /// Restore the auth session from stored tokens using the configured policy.
    /// Mounting again replaces the current session.
    pub async fn mount(&mut self) -> Result<(), ContextError> {
        let session = AuthSession::restore(&self.api, self.config.session_restore).await?;
        info!(
            authenticated = session.is_authenticated(),
            policy = ?self.config.session_restore,
            "App context mounted"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Drop the session state. Stored tokens and announcements are kept.
    pub fn unmount(&mut self) {
        if self.session.take().is_some() {
            info!("App context unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<&AuthSession, ContextError> {
        self.session.as_ref().ok_or(ContextError::NotMounted)
    }

    fn session_mut(&mut self) -> Result<&mut AuthSession, ContextError> {
        self.session.as_mut().ok_or(ContextError::NotMounted)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn board(&self) -> &NewsBoard {
        &self.board
    }

    // ===== Auth =====

    pub async fn sign_up(&self, email: &str, name: &str, password: &str) -> Result<ApiEnvelope, ContextError> {
        self.session()?;
        Ok(self.api.sign_up(email, name, password).await?)
    }

    /// Sign in and mark the session authenticated. The session only changes
    /// once the token pair has been stored.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&SessionUser, ContextError> {
        self.session()?;
        self.api.sign_in(email, password).await?;

        let session = self.session_mut()?;
        session.set_user(Some(SessionUser::new(email, DEFAULT_USER_NAME)));
        session.user().ok_or(ContextError::NotAuthenticated)
    }

    pub fn logout(&mut self) -> Result<(), ContextError> {
        self.session_mut()?.logout()?;
        Ok(())
    }

    // ===== Announcements =====

    /// Publish a draft to the API, then add it to the local board.
    ///
    /// Nothing is added when the API call fails. A failed token refresh also
    /// signs the session out, since the stored tokens are gone.
    pub async fn submit(&mut self, draft: NewsDraft) -> Result<&NewsItem, ContextError> {
        if !self.session()?.is_authenticated() {
            return Err(ContextError::NotAuthenticated);
        }
        NewsBoard::validate(&draft)?;

        if let Err(e) = self.api.create_post(&draft.title, &draft.content).await {
            if e.is_session_expired() {
                warn!("Session expired while posting, signing out");
                self.session_mut()?.set_user(None);
            }
            return Err(e.into());
        }

        Ok(self.board.add(draft)?)
    }

    pub fn newsletter(&self, date: NaiveDate) -> Newsletter<'_> {
        Newsletter::for_day(self.board.items(), date)
    }
}
