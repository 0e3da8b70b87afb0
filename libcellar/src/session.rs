//! Persisted authentication state
//!
//! `SessionStore` holds the signed-in user and the token pair. It is loaded
//! once at startup and written back to the `auth-storage` file after every
//! mutation. Handles are cheap to clone and share one state.
//!
//! State is only replaced after a successful backend call, so a failed login
//! leaves whatever session was stored before untouched.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{Backend, LoginRequest, RegisterRequest};
use crate::config::{resolve_session_path, Config};
use crate::error::{ApiError, Result, SessionError};
use crate::service::events::{Event, EventBus};
use crate::types::{AuthResponse, User};

/// Serialized form of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl From<AuthResponse> for AuthState {
    fn from(response: AuthResponse) -> Self {
        Self {
            user: Some(response.user),
            access_token: Some(response.access_token),
            refresh_token: Some(response.refresh_token),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    state: Arc<RwLock<AuthState>>,
    events: EventBus,
}

impl SessionStore {
    /// Open the store at the location named by the config
    pub fn from_config(config: &Config, events: EventBus) -> Result<Self> {
        let path = resolve_session_path(config.session.path.as_deref())?;
        Self::load(path, events)
    }

    /// Open the store backed by `path`
    ///
    /// A missing file yields an empty session. A file that cannot be parsed
    /// is logged and treated as empty as well; it is overwritten on the next
    /// mutation.
    pub fn load(path: PathBuf, events: EventBus) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(SessionError::Io)?;
            match serde_json::from_str::<AuthState>(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        "Corrupted session file {}, starting signed out: {}",
                        path.display(),
                        e
                    );
                    AuthState::default()
                }
            }
        } else {
            AuthState::default()
        };

        debug!(
            path = %path.display(),
            authenticated = state.is_authenticated(),
            "Loaded session"
        );

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    /// The access token as of now; read at call time by the submission flows
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    /// Access token, or an authentication error when signed out
    pub fn require_access_token(&self) -> Result<String> {
        self.access_token().ok_or_else(|| {
            ApiError::Authentication("Not signed in. Run `cellar-auth login` first.".to_string())
                .into()
        })
    }

    pub async fn login(&self, backend: &dyn Backend, request: &LoginRequest) -> Result<User> {
        let response = backend.login(request).await?;
        let user = response.user.clone();
        self.replace(AuthState::from(response))?;
        info!("Signed in as {}", user.nickname);
        Ok(user)
    }

    pub async fn register(&self, backend: &dyn Backend, request: &RegisterRequest) -> Result<User> {
        let response = backend.register(request).await?;
        let user = response.user.clone();
        self.replace(AuthState::from(response))?;
        info!("Registered and signed in as {}", user.nickname);
        Ok(user)
    }

    /// Clear user and both tokens
    pub fn logout(&self) -> Result<()> {
        self.replace(AuthState::default())?;
        info!("Signed out");
        Ok(())
    }

    /// Replace the access token, leaving user and refresh token as they are
    pub fn set_access_token(&self, access_token: impl Into<String>) -> Result<()> {
        let mut next = self.state();
        next.access_token = Some(access_token.into());
        self.replace(next)
    }

    /// Exchange the stored refresh token for a new access token
    pub async fn refresh(&self, backend: &dyn Backend) -> Result<String> {
        let refresh_token = self.state().refresh_token.ok_or_else(|| {
            ApiError::Authentication("No refresh token stored. Sign in again.".to_string())
        })?;

        let response = backend.refresh_token(&refresh_token).await?;
        self.set_access_token(response.access_token.clone())?;
        debug!("Access token refreshed");
        Ok(response.access_token)
    }

    /// Persist `next`, then make it the live state
    fn replace(&self, next: AuthState) -> Result<()> {
        self.save(&next)?;

        let authenticated = next.is_authenticated();
        let nickname = next.user.as_ref().map(|u| u.nickname.clone());
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;

        self.events.emit(Event::SessionChanged {
            authenticated,
            nickname,
        });
        Ok(())
    }

    fn save(&self, state: &AuthState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(SessionError::Io)?;
        }

        let content = serde_json::to_string_pretty(state).map_err(SessionError::Serialize)?;
        std::fs::write(&self.path, content).map_err(SessionError::Io)?;

        // Tokens are credentials: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(SessionError::Io)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockCall, MockOperation};
    use crate::error::CellarError;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> SessionStore {
        SessionStore::load(
            temp_dir.path().join("auth-storage.json"),
            EventBus::new(16),
        )
        .unwrap()
    }

    fn signed_in_store(temp_dir: &TempDir) -> SessionStore {
        let store = open_store(temp_dir);
        store
            .replace(AuthState {
                user: Some(User {
                    id: 9,
                    email: "old@example.com".to_string(),
                    nickname: "old".to_string(),
                    image: None,
                }),
                access_token: Some("old-access".to_string()),
                refresh_token: Some("old-refresh".to_string()),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_missing_file_starts_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert_eq!(store.state(), AuthState::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupted_file_starts_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("auth-storage.json"), "{not json").unwrap();

        let store = open_store(&temp_dir);
        assert_eq!(store.state(), AuthState::default());
    }

    #[tokio::test]
    async fn test_login_overwrites_state_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);
        let backend = MockBackend::new();

        let user = store
            .login(&backend, &LoginRequest::new("somm@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(user.nickname, "somm");

        let state = store.state();
        assert_eq!(state.user.unwrap().id, 1);
        assert_eq!(state.access_token.as_deref(), Some("mock-access"));
        assert_eq!(state.refresh_token.as_deref(), Some("mock-refresh"));

        let reloaded = open_store(&temp_dir);
        assert_eq!(reloaded.state(), store.state());
    }

    #[tokio::test]
    async fn test_register_behaves_like_login() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let backend = MockBackend::new();

        let request = RegisterRequest {
            email: "new@example.com".to_string(),
            nickname: "newbie".to_string(),
            password: "pw12345678".to_string().into(),
            password_confirmation: "pw12345678".to_string().into(),
        };
        store.register(&backend, &request).await.unwrap();

        assert!(store.state().is_authenticated());
        assert_eq!(
            backend.calls(),
            vec![MockCall::Register {
                email: "new@example.com".to_string(),
                nickname: "newbie".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_login_leaves_previous_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);
        let before = store.state();

        let backend = MockBackend::new();
        backend.fail(
            MockOperation::Login,
            ApiError::Authentication("bad password".to_string()),
        );

        let result = store
            .login(&backend, &LoginRequest::new("somm@example.com", "wrong"))
            .await;
        assert!(matches!(
            result,
            Err(CellarError::Api(ApiError::Authentication(_)))
        ));

        assert_eq!(store.state(), before);
        assert_eq!(open_store(&temp_dir).state(), before);
    }

    #[test]
    fn test_logout_clears_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);

        store.logout().unwrap();

        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.access_token.is_none());
        assert!(state.refresh_token.is_none());
        assert_eq!(open_store(&temp_dir).state(), AuthState::default());
    }

    #[test]
    fn test_set_access_token_touches_only_access_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);
        let before = store.state();

        store.set_access_token("fresh-access").unwrap();

        let after = store.state();
        assert_eq!(after.access_token.as_deref(), Some("fresh-access"));
        assert_eq!(after.user, before.user);
        assert_eq!(after.refresh_token, before.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails_without_call() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let backend = MockBackend::new();

        let result = store.refresh(&backend).await;
        assert!(matches!(
            result,
            Err(CellarError::Api(ApiError::Authentication(_)))
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_patches_access_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);
        let backend = MockBackend::new();

        let token = store.refresh(&backend).await.unwrap();
        assert_eq!(token, "mock-access-refreshed");
        assert_eq!(
            backend.calls(),
            vec![MockCall::RefreshToken {
                refresh_token: "old-refresh".to_string()
            }]
        );

        let state = store.state();
        assert_eq!(state.access_token.as_deref(), Some("mock-access-refreshed"));
        assert_eq!(state.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(state.user.unwrap().nickname, "old");
    }

    #[test]
    fn test_require_access_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(store.require_access_token().is_err());

        store.set_access_token("t").unwrap();
        assert_eq!(store.require_access_token().unwrap(), "t");
    }

    #[tokio::test]
    async fn test_mutations_notify_subscribers() {
        let temp_dir = TempDir::new().unwrap();
        let events = EventBus::new(16);
        let store = SessionStore::load(temp_dir.path().join("auth-storage.json"), events.clone())
            .unwrap();
        let mut receiver = events.subscribe();

        store
            .login(&MockBackend::new(), &LoginRequest::new("somm@example.com", "pw"))
            .await
            .unwrap();
        store.logout().unwrap();

        match receiver.recv().await.unwrap() {
            Event::SessionChanged {
                authenticated,
                nickname,
            } => {
                assert!(authenticated);
                assert_eq!(nickname.as_deref(), Some("somm"));
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(matches!(
            receiver.recv().await.unwrap(),
            Event::SessionChanged {
                authenticated: false,
                ..
            }
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let other = store.clone();

        store.set_access_token("shared").unwrap();
        assert_eq!(other.access_token().as_deref(), Some("shared"));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = signed_in_store(&temp_dir);
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
