//! Explicit session state. One instance is built at startup from the
//! gateway's persisted session and passed by reference to whatever needs the
//! current user; there is no ambient global lookup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::gateway::AuthGateway;
use crate::task::User;

pub struct Session {
    auth: Arc<dyn AuthGateway>,
    user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

impl Session {
    /// Restores the persisted session, if any. A restore failure leaves the
    /// session signed out with the failure message captured.
    #[tracing::instrument(skip(auth))]
    pub fn restore(auth: Arc<dyn AuthGateway>) -> Self {
        let mut session = Self {
            auth,
            user: None,
            loading: true,
            error: None,
        };

        match session.auth.get_session() {
            Ok(user) => {
                if let Some(user) = &user {
                    info!(user_id = %user.id, "restored session");
                }
                session.user = user;
            }
            Err(err) => {
                warn!(error = %err, "failed to restore session");
                session.error = Some(err.to_string());
            }
        }

        session.loading = false;
        session
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Option<User> {
        self.begin();
        match self.auth.sign_up(name, email, password) {
            Ok(user) => {
                self.user = Some(user.clone());
                self.loading = false;
                Some(user)
            }
            Err(err) => self.fail(err),
        }
    }

    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub fn login(&mut self, email: &str, password: &str) -> Option<User> {
        self.begin();
        match self.auth.sign_in_with_password(email, password) {
            Ok(user) => {
                self.user = Some(user.clone());
                self.loading = false;
                Some(user)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Tears the session down. The local user is cleared even when the
    /// gateway call fails; the failure message is still captured.
    #[tracing::instrument(skip(self))]
    pub fn logout(&mut self) -> bool {
        self.begin();
        let result = self.auth.sign_out();
        self.user = None;
        self.loading = false;
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "sign-out reported failure");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    #[tracing::instrument(skip(self), fields(email = %email))]
    pub fn request_password_reset(&mut self, email: &str) -> bool {
        self.begin();
        match self.auth.reset_password_for_email(email) {
            Ok(()) => {
                self.loading = false;
                true
            }
            Err(err) => {
                self.fail::<()>(err);
                false
            }
        }
    }

    #[tracing::instrument(skip(self, new_password))]
    pub fn change_password(&mut self, new_password: &str) -> Option<User> {
        self.begin();
        match self.auth.update_user_password(new_password) {
            Ok(user) => {
                self.user = Some(user.clone());
                self.loading = false;
                Some(user)
            }
            Err(err) => self.fail(err),
        }
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn fail<T>(&mut self, err: anyhow::Error) -> Option<T> {
        warn!(error = %err, "auth operation failed");
        self.error = Some(err.to_string());
        self.loading = false;
        None
    }
}
