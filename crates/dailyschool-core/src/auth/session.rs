use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::SessionRestore;
use crate::models::SessionUser;

use super::TokenStore;

/// Identity shown for a session restored from stored tokens. The API has no
/// profile endpoint, so the real email and name are unknown until sign-in.
pub const PLACEHOLDER_EMAIL: &str = "authenticated@user.com";
pub const PLACEHOLDER_NAME: &str = "인증된 사용자";

/// The signed-in user, if any, plus the token store backing it.
pub struct AuthSession {
    tokens: Arc<dyn TokenStore>,
    user: Option<SessionUser>,
}

impl AuthSession {
    /// A signed-out session.
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens, user: None }
    }

    /// Rebuild the session from stored tokens according to `policy`.
    ///
    /// Only token-store failures are returned as errors. A failed verification
    /// leaves the session signed out.
    pub async fn restore(api: &ApiClient, policy: SessionRestore) -> Result<Self, ApiError> {
        let mut session = Self::new(api.tokens().clone());

        match policy {
            SessionRestore::Never => {
                debug!("Session restore disabled, starting signed out");
            }
            SessionRestore::Optimistic => {
                if session.tokens.access_token()?.is_some() {
                    debug!("Access token present, restoring session without verification");
                    session.user = Some(Self::placeholder_user());
                }
            }
            SessionRestore::Verify => {
                if session.tokens.access_token()?.is_some() {
                    match api.refresh_access_token().await {
                        Ok(_) => {
                            info!("Stored session verified");
                            session.user = Some(Self::placeholder_user());
                        }
                        Err(e) => {
                            warn!(error = %e, "Stored session could not be verified");
                        }
                    }
                }
            }
        }

        Ok(session)
    }

    pub fn placeholder_user() -> SessionUser {
        SessionUser::new(PLACEHOLDER_EMAIL, PLACEHOLDER_NAME)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn set_user(&mut self, user: Option<SessionUser>) {
        self.user = user;
    }

    /// Forget the user and delete both stored tokens.
    ///
    /// The user is cleared even when the token store fails; the error is then
    /// returned so the caller can report it.
    pub fn logout(&mut self) -> Result<()> {
        self.user = None;
        self.tokens.remove()?;
        info!("Logged out");
        Ok(())
    }
}
