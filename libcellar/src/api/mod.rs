//! REST API calls and the backend abstraction
//!
//! Each submodule holds thin functions mapping one user action to one HTTP
//! request on an [`ApiClient`]. Failures are logged and returned unchanged;
//! callers decide what to show the user.
//!
//! The [`Backend`] trait groups those calls so that the session store and the
//! submission flows can run against the real HTTP client or against
//! [`mock::MockBackend`] in tests.
//!
//! # Example
//!
//! ```no_run
//! use libcellar::api::{Backend, LoginRequest};
//! use libcellar::{ApiClient, Config};
//!
//! # async fn example() -> libcellar::Result<()> {
//! let config = Config::load()?;
//! let client = ApiClient::new(&config.api)?;
//!
//! let detail = client.wine_detail(7).await?;
//! println!("{} ({} reviews)", detail.name, detail.review_count);
//!
//! let auth = client
//!     .login(&LoginRequest::new("somm@example.com", "hunter22"))
//!     .await?;
//! println!("Signed in as {}", auth.user.nickname);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{
    Aroma, AuthResponse, ImageFile, RefreshResponse, Review, Wine, WineDetail, WineType,
};

pub mod auth;
pub mod reviews;
pub mod wines;

// Available outside tests so integration tests and downstream tools can use it
pub mod mock;

/// Email/password pair for signing in
#[derive(Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Fields of the sign-up form
#[derive(Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

/// Body of `PATCH /reviews/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub rating: u8,
    pub light_bold: u8,
    pub smooth_tannic: u8,
    pub dry_sweet: u8,
    pub soft_acidic: u8,
    pub aroma: Vec<Aroma>,
    pub content: String,
}

/// Body of `POST /reviews`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    #[serde(flatten)]
    pub review: ReviewUpdate,
    pub wine_id: u64,
}

/// Body of `POST /wines`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinePayload {
    pub name: String,
    pub region: String,
    pub image: String,
    pub price: u64,
    #[serde(rename = "type")]
    pub wine_type: WineType,
}

/// Operations the client needs from the wine backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Sign in; returns the user and a fresh token pair
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;

    /// Create an account; returns the user and a fresh token pair
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// Trade a refresh token for a new access token
    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse>;

    async fn post_review(&self, access_token: &str, review: &NewReview) -> Result<Review>;

    async fn update_review(
        &self,
        access_token: &str,
        review_id: u64,
        review: &ReviewUpdate,
    ) -> Result<Review>;

    async fn delete_review(&self, access_token: &str, review_id: u64) -> Result<()>;

    /// Upload a wine picture; returns the URL the backend stored it under
    async fn upload_image(&self, access_token: Option<&str>, image: &ImageFile) -> Result<String>;

    async fn post_wine(&self, access_token: Option<&str>, wine: &WinePayload) -> Result<Wine>;

    async fn wine_detail(&self, wine_id: u64) -> Result<WineDetail>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        auth::login(self, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        auth::register(self, request).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse> {
        auth::refresh_token(self, refresh_token).await
    }

    async fn post_review(&self, access_token: &str, review: &NewReview) -> Result<Review> {
        reviews::post_wine_review(self, access_token, review).await
    }

    async fn update_review(
        &self,
        access_token: &str,
        review_id: u64,
        review: &ReviewUpdate,
    ) -> Result<Review> {
        reviews::update_wine_review(self, access_token, review_id, review).await
    }

    async fn delete_review(&self, access_token: &str, review_id: u64) -> Result<()> {
        reviews::delete_wine_review(self, access_token, review_id).await
    }

    async fn upload_image(&self, access_token: Option<&str>, image: &ImageFile) -> Result<String> {
        wines::upload_wine_image(self, access_token, image).await
    }

    async fn post_wine(&self, access_token: Option<&str>, wine: &WinePayload) -> Result<Wine> {
        wines::post_wine(self, access_token, wine).await
    }

    async fn wine_detail(&self, wine_id: u64) -> Result<WineDetail> {
        wines::get_wine_detail(self, wine_id).await
    }
}
