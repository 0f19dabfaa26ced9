//! Session store: the single source of truth for authentication state.
//!
//! Tokens and the cached profile live in memory and are mirrored into the
//! durable key-value store on every mutation (write-through). The store also
//! owns the token refresh protocol; it talks to the refresh endpoint
//! directly rather than through the gateway, so a refresh can never recurse
//! into another refresh.

use std::sync::Arc;
use std::time::Duration;

use client_core::error::ClientError;
use client_core::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::observer::SessionObserver;
use super::push;
use crate::config::ApiSettings;
use crate::models::{select_current_role, Club, MeResponse, RoleAssignment, UserProfile};

/// Durable storage keys. Values are JSON documents except the two raw token
/// strings.
pub mod keys {
    pub const ACCESS: &str = "access";
    pub const REFRESH: &str = "refresh";
    pub const USER_ROLES: &str = "userRoles";
    pub const USER_CATEGORIES: &str = "userCategories";
    pub const USER_CLUB: &str = "userClub";
    pub const USER_DETAILS: &str = "userDetails";
    pub const CURRENT_ROLE: &str = "currentRole";

    pub const ALL: [&str; 7] = [
        ACCESS,
        REFRESH,
        USER_ROLES,
        USER_CATEGORIES,
        USER_CLUB,
        USER_DETAILS,
        CURRENT_ROLE,
    ];
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    profile: Option<UserProfile>,
    roles: Vec<RoleAssignment>,
    categories: Vec<String>,
    club: Option<Club>,
    current_role: Option<RoleAssignment>,
    /// True until `initialize` has read the persisted state, so the UI can
    /// tell "unknown yet" apart from "known to be logged out".
    loading: bool,
}

/// Read-only copy of the session state for UI rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub profile: Option<UserProfile>,
    pub roles: Vec<RoleAssignment>,
    pub categories: Vec<String>,
    pub club: Option<Club>,
    pub current_role: Option<RoleAssignment>,
    /// `None` while persisted state is still loading.
    pub is_logged_in: Option<bool>,
}

/// Credentials and denormalized profile data handed over by a successful
/// sign-in flow. Obtaining these is the sign-in screen's job.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub access_token: String,
    pub refresh_token: String,
    pub club: Option<Club>,
    pub roles: Vec<RoleAssignment>,
    pub categories: Vec<String>,
    pub profile: UserProfile,
    /// OS push token, when the platform handed one out.
    pub device_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

pub struct SessionStore {
    http: reqwest::Client,
    api: ApiSettings,
    storage: Arc<dyn KeyValueStore>,
    observer: Arc<dyn SessionObserver>,
    state: RwLock<SessionState>,
    /// Serializes refresh attempts so concurrent 401s coalesce on one
    /// request instead of racing writes to storage.
    refresh_gate: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        api: ApiSettings,
        storage: Arc<dyn KeyValueStore>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api,
            storage,
            observer,
            state: RwLock::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Loads persisted state, then attempts one proactive token refresh to
    /// catch tokens that expired while the app was closed.
    ///
    /// Each key is parsed independently; a corrupt value resets only that
    /// key to its empty default and never aborts the rest of the load. If a
    /// token was found but no cached profile, the profile is fetched from
    /// `GET /me/` best-effort.
    pub async fn initialize(&self) {
        let (access, refresh, roles, categories, club, profile, current_role) = tokio::join!(
            self.load_raw(keys::ACCESS),
            self.load_raw(keys::REFRESH),
            self.load_json::<Vec<RoleAssignment>>(keys::USER_ROLES),
            self.load_json::<Vec<String>>(keys::USER_CATEGORIES),
            self.load_json::<Club>(keys::USER_CLUB),
            self.load_json::<UserProfile>(keys::USER_DETAILS),
            self.load_json::<RoleAssignment>(keys::CURRENT_ROLE),
        );

        let fetch_profile = access.is_some() && profile.is_none();

        {
            let mut state = self.state.write().await;
            state.access_token = access;
            state.refresh_token = refresh;
            state.roles = roles.unwrap_or_default();
            state.categories = categories.unwrap_or_default();
            state.club = club;
            state.profile = profile;
            state.current_role = current_role;
            state.loading = false;
        }

        if fetch_profile {
            if let Err(e) = self.reload_profile().await {
                tracing::warn!(error = %e, "Profile fetch during initialization failed");
            }
        }

        if let Err(e) = self.refresh_access_token().await {
            tracing::debug!(error = %e, "Proactive token refresh failed");
        }
    }

    /// Installs fresh credentials from a successful sign-in.
    ///
    /// Persists every field, selects the current role, and kicks off push
    /// registration as a detached task so its failure cannot roll back the
    /// login.
    pub async fn login(&self, login: LoginSession) -> Result<(), ClientError> {
        let current_role =
            select_current_role(&login.roles, login.profile.preferred_role.as_deref());

        // All keys land or none do: a half-written login must not come
        // back as a live session after a restart.
        if let Err(e) = self.persist_login(&login, current_role.as_ref()).await {
            if let Err(cleanup) = self.storage.remove_many(&keys::ALL).await {
                tracing::warn!(error = %cleanup, "Failed to roll back partial login");
            }
            return Err(e);
        }

        {
            let mut state = self.state.write().await;
            state.access_token = Some(login.access_token.clone());
            state.refresh_token = Some(login.refresh_token);
            state.roles = login.roles;
            state.categories = login.categories;
            state.club = login.club;
            state.profile = Some(login.profile);
            state.current_role = current_role;
            state.loading = false;
        }

        tracing::info!("User logged in");

        if let Some(device_token) = login.device_token {
            let http = self.http.clone();
            let base_url = self.api.base_url.clone();
            let access = login.access_token;
            tokio::spawn(async move {
                if let Err(e) =
                    push::register_device_token(&http, &base_url, &access, &device_token).await
                {
                    tracing::warn!(error = %e, "Push token registration failed");
                }
            });
        }

        Ok(())
    }

    async fn persist_login(
        &self,
        login: &LoginSession,
        current_role: Option<&RoleAssignment>,
    ) -> Result<(), ClientError> {
        self.persist_raw(keys::ACCESS, Some(&login.access_token))
            .await?;
        self.persist_raw(keys::REFRESH, Some(&login.refresh_token))
            .await?;
        self.persist_json(keys::USER_ROLES, Some(&login.roles))
            .await?;
        self.persist_json(keys::USER_CATEGORIES, Some(&login.categories))
            .await?;
        self.persist_json(keys::USER_CLUB, login.club.as_ref())
            .await?;
        self.persist_json(keys::USER_DETAILS, Some(&login.profile))
            .await?;
        self.persist_json(keys::CURRENT_ROLE, current_role).await?;
        Ok(())
    }

    /// Clears persisted and in-memory state and routes the user to sign-in.
    ///
    /// Idempotent; calling it while logged out only re-navigates.
    pub async fn logout(&self) {
        if let Err(e) = self.storage.remove_many(&keys::ALL).await {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }

        {
            let mut state = self.state.write().await;
            *state = SessionState::default();
        }

        tracing::info!("Session cleared");
        self.observer.redirect_to_sign_in();
    }

    /// Runs the token refresh protocol.
    ///
    /// Returns the new access token on success, the previous token on any
    /// transient or ambiguous failure (5xx, 403, 404, offline) so a flaky
    /// network never costs the user their session, and `None` only when no
    /// refresh token is held or the refresh credential was explicitly
    /// rejected. The rejected case is the single path that tears the
    /// session down.
    pub async fn refresh_access_token(&self) -> Result<Option<String>, ClientError> {
        let (entry_access, refresh_token) = {
            let state = self.state.read().await;
            (state.access_token.clone(), state.refresh_token.clone())
        };

        let Some(refresh_token) = refresh_token else {
            // No credential to exchange: already logged out, nothing to
            // tear down.
            tracing::warn!("Refresh requested without a refresh token");
            return Ok(None);
        };

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have rotated the token while we queued.
        {
            let state = self.state.read().await;
            if state.access_token != entry_access {
                return Ok(state.access_token.clone());
            }
        }

        let url = format!("{}/token/refresh/", self.api.base_url);
        let response = match self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh request failed, keeping session");
                return Ok(entry_access);
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::info!("Refresh token rejected, logging out");
            self.logout().await;
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "Token refresh returned an error, keeping session");
            return Ok(entry_access);
        }

        let body: RefreshResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed refresh response, keeping session");
                return Ok(entry_access);
            }
        };

        self.persist_raw(keys::ACCESS, Some(&body.access)).await?;
        {
            let mut state = self.state.write().await;
            state.access_token = Some(body.access.clone());
        }
        tracing::debug!("Access token refreshed");

        if let Err(e) = self.reload_profile().await {
            tracing::warn!(error = %e, "Profile reload after refresh failed");
        }

        Ok(Some(body.access))
    }

    /// Fetches `GET /me/` with the current token and replaces the cached
    /// profile, roles, categories and club.
    async fn reload_profile(&self) -> Result<(), ClientError> {
        let access = {
            let state = self.state.read().await;
            state.access_token.clone()
        };
        let Some(access) = access else {
            return Err(ClientError::Unauthenticated);
        };

        let url = format!("{}/me/", self.api.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&access)
            .send()
            .await?
            .error_for_status()?;
        let me: MeResponse = response.json().await?;

        self.persist_json(keys::USER_DETAILS, Some(&me.user)).await?;
        self.persist_json(keys::USER_ROLES, Some(&me.roles)).await?;
        self.persist_json(keys::USER_CATEGORIES, Some(&me.categories))
            .await?;
        self.persist_json(keys::USER_CLUB, me.club.as_ref()).await?;

        let mut state = self.state.write().await;
        state.profile = Some(me.user);
        state.roles = me.roles;
        state.categories = me.categories;
        state.club = me.club;

        // A role removed server-side must not linger as the active role.
        let still_valid = state
            .current_role
            .as_ref()
            .is_some_and(|cur| state.roles.contains(cur));
        if !still_valid {
            let preferred = state
                .profile
                .as_ref()
                .and_then(|p| p.preferred_role.clone());
            let reselected = select_current_role(&state.roles, preferred.as_deref());
            self.persist_json(keys::CURRENT_ROLE, reselected.as_ref())
                .await?;
            state.current_role = reselected;
        }

        Ok(())
    }

    pub async fn set_user_roles(
        &self,
        roles: Option<Vec<RoleAssignment>>,
    ) -> Result<(), ClientError> {
        self.persist_json(keys::USER_ROLES, roles.as_ref()).await?;

        let mut state = self.state.write().await;
        state.roles = roles.unwrap_or_default();

        let still_valid = state
            .current_role
            .as_ref()
            .is_some_and(|cur| state.roles.contains(cur));
        if !still_valid {
            let preferred = state
                .profile
                .as_ref()
                .and_then(|p| p.preferred_role.clone());
            let reselected = select_current_role(&state.roles, preferred.as_deref());
            self.persist_json(keys::CURRENT_ROLE, reselected.as_ref())
                .await?;
            state.current_role = reselected;
        }

        Ok(())
    }

    pub async fn set_user_categories(
        &self,
        categories: Option<Vec<String>>,
    ) -> Result<(), ClientError> {
        self.persist_json(keys::USER_CATEGORIES, categories.as_ref())
            .await?;
        self.state.write().await.categories = categories.unwrap_or_default();
        Ok(())
    }

    pub async fn set_user_club(&self, club: Option<Club>) -> Result<(), ClientError> {
        self.persist_json(keys::USER_CLUB, club.as_ref()).await?;
        self.state.write().await.club = club;
        Ok(())
    }

    pub async fn set_user_details(&self, profile: Option<UserProfile>) -> Result<(), ClientError> {
        self.persist_json(keys::USER_DETAILS, profile.as_ref())
            .await?;
        self.state.write().await.profile = profile;
        Ok(())
    }

    pub async fn set_current_role(
        &self,
        role: Option<RoleAssignment>,
    ) -> Result<(), ClientError> {
        self.persist_json(keys::CURRENT_ROLE, role.as_ref()).await?;
        self.state.write().await.current_role = role;
        Ok(())
    }

    /// `None` while persisted state is still loading, else whether an access
    /// token is held.
    pub async fn is_logged_in(&self) -> Option<bool> {
        let state = self.state.read().await;
        if state.loading {
            None
        } else {
            Some(state.access_token.is_some())
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    pub async fn current_role(&self) -> Option<RoleAssignment> {
        self.state.read().await.current_role.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            access_token: state.access_token.clone(),
            refresh_token: state.refresh_token.clone(),
            profile: state.profile.clone(),
            roles: state.roles.clone(),
            categories: state.categories.clone(),
            club: state.club.clone(),
            current_role: state.current_role.clone(),
            is_logged_in: if state.loading {
                None
            } else {
                Some(state.access_token.is_some())
            },
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.api.base_url
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn observer(&self) -> &Arc<dyn SessionObserver> {
        &self.observer
    }

    /// Writes or removes one raw string key. Every in-memory mutation pairs
    /// with one of these persist calls (write-through, never write-back).
    async fn persist_raw(&self, key: &str, value: Option<&str>) -> Result<(), ClientError> {
        let result = match value {
            Some(v) => self.storage.set(key, v).await,
            None => self.storage.remove(key).await,
        };
        result.map_err(ClientError::Storage)
    }

    async fn persist_json<T: Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
    ) -> Result<(), ClientError> {
        match value {
            Some(v) => {
                let json = serde_json::to_string(v)?;
                self.storage
                    .set(key, &json)
                    .await
                    .map_err(ClientError::Storage)
            }
            None => self
                .storage
                .remove(key)
                .await
                .map_err(ClientError::Storage),
        }
    }

    async fn load_raw(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted key");
                None
            }
        }
    }

    /// Reads and parses one persisted key. A parse failure resets only this
    /// key and never aborts loading of the others.
    async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.load_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt persisted value, resetting key");
                if let Err(e) = self.storage.remove(key).await {
                    tracing::warn!(key, error = %e, "Failed to reset corrupt key");
                }
                None
            }
        }
    }
}
