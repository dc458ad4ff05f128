//! The session store: the single source of truth for auth state.
//!
//! The store is a cheap-clone handle; every clone sees the same state.
//! Every change of session identity bumps a generation counter, and a
//! profile fetch only applies its outcome if the generation it started
//! under is still current. A fetch in flight during `logout` is not
//! aborted, but its late result is dropped.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::AuthApi;
use crate::models::{LoginRequest, Session, UserProfile};

use super::{HostContext, StorageTier, TOKEN_KEY};

/// Route the host is sent to after logout
const LOGOUT_ROUTE: &str = "/";

#[derive(Debug, Default)]
struct State {
    token: Option<String>,
    user: Option<UserProfile>,
    generation: u64,
}

struct Inner<A> {
    api: A,
    host: Option<HostContext>,
    state: Mutex<State>,
}

pub struct SessionStore<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for SessionStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AuthApi> SessionStore<A> {
    /// Create an empty (anonymous) store. Without a host, tokens are kept
    /// in memory only and logout does not navigate.
    pub fn new(api: A, host: Option<HostContext>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                host,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn has_host(&self) -> bool {
        self.inner.host.is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.lock().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.lock().user.clone()
    }

    /// An empty token counts as no token.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .lock()
            .token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn snapshot(&self) -> Session {
        let state = self.inner.state.lock();
        Session {
            user: state.user.clone(),
            token: state.token.clone(),
        }
    }

    /// Set the token and persist it to the tier selected by `remember`,
    /// clearing the other tier. Storage errors are returned after the
    /// in-memory token has been updated.
    pub fn set_token(&self, token: impl Into<String>, remember: bool) -> Result<()> {
        let token = token.into();
        {
            let mut state = self.inner.state.lock();
            state.token = Some(token.clone());
            state.generation += 1;
        }
        debug!(remember, "Session token set");

        if let Some(ref host) = self.inner.host {
            host.persist(StorageTier::for_remember(remember), TOKEN_KEY, &token)?;
        }
        Ok(())
    }

    /// Load the current user's profile. Without a token (or with an empty
    /// one) this does nothing.
    /// Any failure ends the session as if `logout` had been called.
    pub async fn fetch_user(&self) {
        let (token, generation) = {
            let state = self.inner.state.lock();
            let Some(token) = state.token.as_deref().filter(|token| !token.is_empty()) else {
                return;
            };
            (token.to_string(), state.generation)
        };

        match self.inner.api.fetch_me(&token).await {
            Ok(user) => {
                let mut state = self.inner.state.lock();
                if state.generation == generation {
                    debug!(user_id = user.id, "User profile loaded");
                    state.user = Some(user);
                } else {
                    debug!("Discarding profile fetched for a superseded session");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch user profile, ending session");
                if let Err(e) = self.end_session(Some(generation)) {
                    error!(error = %e, "Failed to clear persisted token");
                }
            }
        }
    }

    /// Clear token and profile, remove the persisted token from both tiers
    /// and navigate to the root route.
    pub fn logout(&self) -> Result<()> {
        self.end_session(None)
    }

    /// Read a persisted token (durable tier first) into memory and start
    /// loading the profile in the background. Returns the handle of the
    /// background fetch, or `None` when there is no host or no token.
    pub fn initialize(&self) -> Result<Option<JoinHandle<()>>> {
        let Some(ref host) = self.inner.host else {
            return Ok(None);
        };
        let Some(token) = host.load(TOKEN_KEY)? else {
            debug!("No persisted session token");
            return Ok(None);
        };

        {
            let mut state = self.inner.state.lock();
            state.token = Some(token);
            state.generation += 1;
        }
        debug!("Restored persisted session token");

        let store = self.clone();
        Ok(Some(tokio::spawn(async move { store.fetch_user().await })))
    }

    /// Exchange credentials for a token, store it and load the profile.
    /// A rejected login leaves the current state untouched.
    pub async fn login(&self, request: &LoginRequest) -> Result<()> {
        let response = self.inner.api.login(request).await?;
        info!(email = %request.email, remember = response.remember, "Logged in");

        self.set_token(response.token, response.remember)?;
        self.fetch_user().await;
        Ok(())
    }

    /// Clear the session if its generation still matches `expected`
    /// (`None` clears unconditionally).
    fn end_session(&self, expected: Option<u64>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if expected.is_some_and(|generation| generation != state.generation) {
                debug!("Ignoring failure from a superseded session");
                return Ok(());
            }
            state.token = None;
            state.user = None;
            state.generation += 1;
        }
        info!("Session ended");

        if let Some(ref host) = self.inner.host {
            let cleared = host.clear(TOKEN_KEY);
            host.navigate_to(LOGOUT_ROUTE);
            cleared?;
        }
        Ok(())
    }
}
