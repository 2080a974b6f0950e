//! HTTP client for a Supabase-style identity backend.
//!
//! Auth calls go to the GoTrue endpoints under `/auth/v1`, profile reads to
//! PostgREST under `/rest/v1`. The session is persisted in the local session
//! store under `sb-<project-ref>-auth-token`, the same key the official
//! client libraries use.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::errors::AuthError;
use super::events::{EventHub, Subscription};
use super::types::{AuthEvent, AuthSession, Profile, Session, SignOutScope, User};
use super::{AuthResult, IdentityBackend};
use crate::config::BackendConfig;
use crate::store::SessionStore;

/// Standard User-Agent header for authgate requests.
pub const USER_AGENT: &str = concat!("authgate/", env!("CARGO_PKG_VERSION"));

const PROFILE_COLUMNS: &str =
    "privacy_accepted,terms_accepted,user_type,admin_role,verification_status";

/// Identity backend speaking the GoTrue + PostgREST wire formats.
pub struct SupabaseBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    storage_key: String,
    store: Arc<dyn SessionStore>,
    events: EventHub,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl SupabaseBackend {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        store: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {base_url}"))?;
        let storage_key = storage_key_for(&parsed);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            storage_key,
            store,
            events: EventHub::new(),
        })
    }

    pub fn from_config(config: &BackendConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let url = config.resolve_url()?;
        let anon_key = config.resolve_anon_key()?;
        Self::new(&url, &anon_key, store, config.timeout())
    }

    /// Store key holding the persisted session.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Reads the persisted session. Unreadable entries count as no session.
    async fn load_session(&self) -> Option<Session> {
        let raw = match self.store.get(&self.storage_key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to read persisted session");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(error = %err, "persisted session is not valid JSON; ignoring");
                None
            }
        }
    }

    async fn persist_session(&self, session: &Session) {
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to serialize session");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.storage_key, raw).await {
            warn!(error = %format!("{err:#}"), "failed to persist session");
        }
    }

    async fn forget_session(&self) {
        if let Err(err) = self.store.remove_many(&[self.storage_key.clone()]).await {
            warn!(error = %format!("{err:#}"), "failed to remove persisted session");
        }
    }

    async fn error_from(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AuthError::from_response(status, &body)
    }
}

/// `sb-<first host label>-auth-token`, matching the official clients.
fn storage_key_for(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or("local");
    let project_ref = host.split('.').next().unwrap_or(host);
    format!("sb-{project_ref}-auth-token")
}

fn session_from(token: TokenResponse) -> Session {
    let expires_at = token.expires_at.or_else(|| {
        token
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + secs)
    });
    Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_type: token.token_type,
        expires_at,
        user: token.user,
    }
}

#[async_trait]
impl IdentityBackend for SupabaseBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::new(format!("Failed to parse token response: {e}")))?;
        let session = session_from(token);
        let user = session.user.clone();

        self.persist_session(&session).await;
        info!(user_id = %user.id, "signed in");
        self.events.publish(AuthEvent::SignedIn(user.clone()));

        Ok(AuthSession { user, session })
    }

    async fn sign_out(&self, scope: SignOutScope) -> AuthResult<()> {
        let Some(session) = self.load_session().await else {
            debug!("sign out without a session; nothing to revoke");
            return Ok(());
        };

        let result = self
            .client
            .post(self.auth_url("logout"))
            .query(&[("scope", scope.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        // The local session goes away whatever the server says.
        self.forget_session().await;
        self.events.publish(AuthEvent::SignedOut);

        let response = result?;
        let status = response.status().as_u16();
        if response.status().is_success() || matches!(status, 401 | 403 | 404) {
            info!(scope = scope.as_str(), "signed out");
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn reset_password_for_email(&self, email: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(self.auth_url("recover"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    async fn current_user(&self) -> Option<User> {
        let session = self.load_session().await?;
        let expired = session
            .expires_at
            .is_some_and(|at| at <= chrono::Utc::now().timestamp());
        if expired {
            debug!("persisted session expired");
            return None;
        }
        Some(session.user)
    }

    async fn fetch_profile(&self, user_id: &str) -> AuthResult<Profile> {
        let bearer = match self.load_session().await {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        };

        let response = self
            .client
            .get(format!("{}/rest/v1/profiles", self.base_url))
            .query(&[
                ("select", PROFILE_COLUMNS.to_string()),
                ("user_id", format!("eq.{user_id}")),
            ])
            .header("apikey", &self.anon_key)
            .header("Accept", "application/vnd.pgrst.object+json")
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::new(format!("Failed to parse profile: {e}")))
    }
}
