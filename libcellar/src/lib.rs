//! Cellar - a wine catalogue and review client
//!
//! This library provides the session handling, draft stores and request
//! flows shared by the `cellar-*` command-line tools.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::Config;
pub use error::{CellarError, Result};
pub use session::{AuthState, SessionStore};
pub use types::{Aroma, Review, TasteValues, User, WineDetail, WineType};
