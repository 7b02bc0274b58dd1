//! # Application Context
//!
//! Owns every long-lived collaborator the front end needs, with explicit
//! setup and teardown.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   AppContext::builder(config)                                          │
//! │       .with_storage(kv)          ← FileKeyValueStore / Memory          │
//! │       .with_service(service)     ← record service (optional offline)   │
//! │       .build()?                                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   init()      load theme, start coordinator (hydrate or first pull)    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   ... screens use coordinator(), accounts(), handle_deep_link() ...    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   shutdown()  detach change listener                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deferred Deep Links
//! A link opened while logged out is parked under `pendingDeepLink` and the
//! user is sent to login. After login, [`AppContext::take_pending_route`]
//! hands the route back exactly once.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use storefront_core::deeplink::resolve_deep_link;
use storefront_core::{Route, Theme};

use crate::account::{AccountService, UserSession};
use crate::config::StorefrontConfig;
use crate::coordinator::{
    RefreshOutcome, SyncCoordinator, SyncCoordinatorBuilder, SyncEventEmitter,
};
use crate::error::{SyncError, SyncResult};
use crate::persistence::{keys, read_json, read_or_absent, KeyValueStore, MemoryKeyValueStore};
use crate::preferences;
use crate::service::RecordService;

// =============================================================================
// App Context
// =============================================================================

pub struct AppContext {
    config: Arc<StorefrontConfig>,
    kv: Arc<dyn KeyValueStore>,
    service: Option<Arc<dyn RecordService>>,
    coordinator: SyncCoordinator,
    accounts: Option<AccountService>,
    theme: RwLock<Theme>,
}

impl AppContext {
    pub fn builder(config: StorefrontConfig) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }

    /// Loads preferences and starts the coordinator.
    pub async fn init(&self) -> RefreshOutcome {
        let theme = preferences::load_theme(&*self.kv).await;
        *self.theme.write() = theme;

        let outcome = self.coordinator.start().await;
        info!(mode = %self.config.mode(), %theme, ?outcome, "App context initialized");
        outcome
    }

    /// Stops background work.
    pub async fn shutdown(&self) {
        self.coordinator.detach().await;
        info!("App context shut down");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    pub fn service(&self) -> Option<&Arc<dyn RecordService>> {
        self.service.as_ref()
    }

    /// Account operations. Needs a record service.
    pub fn accounts(&self) -> SyncResult<&AccountService> {
        self.accounts
            .as_ref()
            .ok_or_else(|| SyncError::NotConfigured("record service for accounts".into()))
    }

    // =========================================================================
    // Theme
    // =========================================================================

    pub fn theme(&self) -> Theme {
        *self.theme.read()
    }

    pub async fn set_theme(&self, theme: Theme) -> SyncResult<()> {
        preferences::save_theme(&*self.kv, theme).await?;
        *self.theme.write() = theme;
        Ok(())
    }

    pub async fn toggle_theme(&self) -> SyncResult<Theme> {
        let next = self.theme().toggled();
        self.set_theme(next).await?;
        Ok(next)
    }

    // =========================================================================
    // Session & Deep Links
    // =========================================================================

    pub async fn current_session(&self) -> Option<UserSession> {
        read_json(&*self.kv, keys::USER_DATA).await
    }

    /// Routes an incoming link.
    ///
    /// Links that don't parse go to login. Valid links opened without a
    /// session are parked for after login.
    pub async fn handle_deep_link(&self, url: &str) -> Route {
        let route = resolve_deep_link(url);
        if route == Route::Login {
            debug!(url, "Unroutable deep link");
            return Route::Login;
        }

        if self.current_session().await.is_none() {
            if let Err(e) = self.kv.set(keys::PENDING_DEEP_LINK, url.to_string()).await {
                warn!(error = %e, "Failed to park deep link");
            } else {
                info!(url, "Deep link parked until login");
            }
            return Route::Login;
        }

        route
    }

    /// Returns the parked route, if any, and forgets it.
    pub async fn take_pending_route(&self) -> Option<Route> {
        let url = read_or_absent(&*self.kv, keys::PENDING_DEEP_LINK).await?;
        if let Err(e) = self.kv.remove(keys::PENDING_DEEP_LINK).await {
            warn!(error = %e, "Failed to clear parked deep link");
        }
        Some(resolve_deep_link(&url))
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("mode", &self.config.mode())
            .field("theme", &self.theme())
            .field("has_service", &self.service.is_some())
            .finish()
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

pub struct AppContextBuilder {
    config: StorefrontConfig,
    kv: Option<Arc<dyn KeyValueStore>>,
    service: Option<Arc<dyn RecordService>>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl AppContextBuilder {
    pub fn new(config: StorefrontConfig) -> Self {
        AppContextBuilder {
            config,
            kv: None,
            service: None,
            emitter: None,
        }
    }

    pub fn with_storage(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn with_service(mut self, service: Arc<dyn RecordService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn build(self) -> SyncResult<AppContext> {
        let kv: Arc<dyn KeyValueStore> = self
            .kv
            .unwrap_or_else(|| Arc::new(MemoryKeyValueStore::new()));

        let mut coordinator = SyncCoordinatorBuilder::new(self.config.clone())
            .with_storage(Arc::clone(&kv));
        if let Some(ref service) = self.service {
            coordinator = coordinator.with_service(Arc::clone(service));
        }
        if let Some(emitter) = self.emitter {
            coordinator = coordinator.with_emitter(emitter);
        }
        let coordinator = coordinator.build()?;

        let accounts = self.service.as_ref().map(|service| {
            AccountService::new(
                Arc::clone(service),
                Arc::clone(&kv),
                self.config.request_timeout(),
            )
        });

        Ok(AppContext {
            config: Arc::new(self.config),
            kv,
            service: self.service,
            coordinator,
            accounts,
            theme: RwLock::new(Theme::default()),
        })
    }
}
