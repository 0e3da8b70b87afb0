//! Service layer for Cellar
//!
//! `CellarService` is the single entry point the command-line tools build
//! on. It owns the HTTP backend, the persisted session and the event bus,
//! and hands out the specialized sub-services:
//!
//! - `SessionStore`: sign-in state, persisted to `auth-storage.json`
//! - `ReviewService`: create, edit and delete reviews
//! - `WineService`: register wines and look up wine details
//! - `EventBus`: notifications about session and submission changes
//!
//! # Example
//!
//! ```no_run
//! use libcellar::service::CellarService;
//! use libcellar::service::review::ReviewModal;
//! use libcellar::Aroma;
//!
//! # async fn example() -> libcellar::Result<()> {
//! let service = CellarService::new()?;
//!
//! let mut modal = ReviewModal::new();
//! modal.open_add(7);
//! let draft = modal.draft_mut();
//! draft.set_rating(4)?;
//! draft.set_content("Dark fruit, long finish");
//! draft.select_tag(Aroma::Cherry);
//!
//! let review = service.reviews().submit(&mut modal).await?;
//! println!("Saved review {}", review.id);
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod review;
pub mod wine;

use std::sync::Arc;

use self::events::{EventBus, EventReceiver};
use self::review::ReviewService;
use self::wine::WineService;
use crate::api::Backend;
use crate::client::ApiClient;
use crate::session::SessionStore;
use crate::{Config, Result};

/// Main service facade
///
/// All sub-services share one backend, one session store and one event bus,
/// so a token obtained through `session()` is seen by the next review
/// submission without any re-wiring.
pub struct CellarService {
    config: Arc<Config>,
    backend: Arc<dyn Backend>,
    session: SessionStore,
    reviews: ReviewService,
    wines: WineService,
    event_bus: EventBus,
}

impl CellarService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the HTTP
    /// client cannot be built or the session file cannot be read.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service talking HTTP to `config.api.base_url`
    pub fn from_config(config: Config) -> Result<Self> {
        let client = ApiClient::new(&config.api)?;
        Self::with_backend(config, Arc::new(client))
    }

    /// Create a service on top of any backend
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let event_bus = EventBus::new(100);
        let session = SessionStore::from_config(&config, event_bus.clone())?;

        let reviews = ReviewService::new(Arc::clone(&backend), session.clone(), event_bus.clone());
        let wines = WineService::new(Arc::clone(&backend), session.clone(), event_bus.clone());

        Ok(Self {
            config: Arc::new(config),
            backend,
            session,
            reviews,
            wines,
            event_bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backend shared by every sub-service; passed to the session store
    /// for sign-in calls
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Access the session store
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Access the review service
    pub fn reviews(&self) -> &ReviewService {
        &self.reviews
    }

    /// Access the wine service
    pub fn wines(&self) -> &WineService {
        &self.wines
    }

    /// Subscribe to service events
    ///
    /// Events emitted before subscribing are not replayed.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}
