use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::engine::LoadingGuard;
use crate::engine::routing::{ScreenSet, route};
use crate::error::StoreError;
use crate::models::session::Session;
use crate::models::user::{User, UserRole};
use crate::observability::metrics::Metrics;
use crate::store::{
    AUTH_TOKEN_KEY, Durability, KeyValueStore, USER_DATA_KEY, USER_DATABASE_KEY, get_json,
    set_json,
};

/// The one-time code every login accepts.
pub const DEMO_OTP: &str = "123456";

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    session: ArcSwap<Session>,
    loading: AtomicBool,
    login_gate: Mutex<()>,
    metrics: Metrics,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Metrics) -> Self {
        Self {
            store,
            session: ArcSwap::from_pointee(Session::default()),
            loading: AtomicBool::new(true),
            login_gate: Mutex::new(()),
            metrics,
        }
    }

    /// Restores the session persisted by the last login. Any read problem
    /// leaves the session signed out; `loading` is cleared either way.
    pub async fn load_session(&self) -> Arc<Session> {
        let _loading = LoadingGuard::start(&self.loading);

        match self.read_persisted().await {
            Ok(Some(session)) => {
                info!(
                    user_id = session.user.as_ref().map(|u| u.id.as_str()).unwrap_or_default(),
                    "session restored"
                );
                self.session.store(Arc::new(session));
            }
            Ok(None) => info!("no persisted session"),
            Err(err) => {
                warn!(error = %err, "failed to restore session");
                self.metrics
                    .store_failures_total
                    .with_label_values(&["load_session"])
                    .inc();
            }
        }

        self.session.load_full()
    }

    /// Signs in with the demo one-time code, creating the user on the first
    /// login for this phone number and role. Returns false on a wrong code
    /// or any store failure, leaving the session as it was.
    pub async fn login(&self, phone_number: &str, code: &str, role: UserRole) -> bool {
        if code != DEMO_OTP {
            info!(role = %role, "login refused: wrong one-time code");
            self.metrics
                .login_attempts_total
                .with_label_values(&["invalid_code"])
                .inc();
            return false;
        }

        let _gate = self.login_gate.lock().await;
        match self.sign_in(phone_number, role).await {
            Ok(session) => {
                if let Some(user) = &session.user {
                    info!(user_id = %user.id, role = %role, "logged in");
                }
                self.session.store(Arc::new(session));
                self.metrics
                    .login_attempts_total
                    .with_label_values(&["success"])
                    .inc();
                true
            }
            Err(err) => {
                error!(error = %err, role = %role, "login failed");
                self.metrics
                    .store_failures_total
                    .with_label_values(&["login"])
                    .inc();
                self.metrics
                    .login_attempts_total
                    .with_label_values(&["store_error"])
                    .inc();
                false
            }
        }
    }

    /// Clears the persisted token and signs out. The in-memory session is
    /// reset even when the store deletion fails; the returned value says
    /// whether the store still holds the old token.
    pub async fn logout(&self) -> Durability {
        let _gate = self.login_gate.lock().await;

        let token_removed = self.store.remove(AUTH_TOKEN_KEY).await;
        let user_removed = self.store.remove(USER_DATA_KEY).await;

        self.session.store(Arc::new(Session::default()));

        match token_removed.and(user_removed) {
            Ok(()) => {
                info!("logged out");
                Durability::Persisted
            }
            Err(err) => {
                error!(error = %err, "logout could not clear the persisted session");
                self.metrics
                    .store_failures_total
                    .with_label_values(&["logout"])
                    .inc();
                Durability::Unpersisted {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.load_full()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.load().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Screens the UI should offer right now.
    pub fn screens(&self) -> ScreenSet {
        if self.is_loading() {
            return ScreenSet::Loading;
        }
        route(&self.session.load())
    }

    async fn read_persisted(&self) -> Result<Option<Session>, StoreError> {
        let token = self.store.get(AUTH_TOKEN_KEY).await?;
        let user = get_json::<User>(self.store.as_ref(), USER_DATA_KEY).await?;

        Ok(match (token, user) {
            (Some(token), Some(user)) => Some(Session::authenticated(user, token)),
            _ => None,
        })
    }

    async fn sign_in(&self, phone_number: &str, role: UserRole) -> Result<Session, StoreError> {
        let mut users: Vec<User> = get_json(self.store.as_ref(), USER_DATABASE_KEY)
            .await?
            .unwrap_or_default();

        let existing = users
            .iter()
            .find(|user| user.phone_number == phone_number && user.role == role)
            .cloned();

        let user = match existing {
            Some(user) => user,
            None => {
                let user = User::first_login(phone_number, role, Utc::now().timestamp_millis());
                info!(user_id = %user.id, "creating user on first login");
                users.push(user.clone());
                set_json(self.store.as_ref(), USER_DATABASE_KEY, &users).await?;
                user
            }
        };

        let token = format!("token_{}", Utc::now().timestamp_millis());
        self.store.set(AUTH_TOKEN_KEY, token.clone()).await?;
        set_json(self.store.as_ref(), USER_DATA_KEY, &user).await?;

        Ok(Session::authenticated(user, token))
    }
}
