//! In-process backend for tests
//!
//! `MockBackend` answers every call with canned data, records the calls it
//! received in order, and can be told to fail specific operations. It lets
//! the session store and the submission flows be exercised without a server.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{Backend, LoginRequest, NewReview, RegisterRequest, ReviewUpdate, WinePayload};
use crate::error::{ApiError, Result};
use crate::types::{AuthResponse, ImageFile, RefreshResponse, Review, User, Wine, WineDetail, WineType};

/// Backend operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Login,
    Register,
    RefreshToken,
    PostReview,
    UpdateReview,
    DeleteReview,
    UploadImage,
    PostWine,
    WineDetail,
}

/// A call received by the mock, with the arguments that matter for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Login { email: String },
    Register { email: String, nickname: String },
    RefreshToken { refresh_token: String },
    PostReview { access_token: String, review: NewReview },
    UpdateReview { access_token: String, review_id: u64, review: ReviewUpdate },
    DeleteReview { access_token: String, review_id: u64 },
    UploadImage { access_token: Option<String>, file_name: String },
    PostWine { access_token: Option<String>, wine: WinePayload },
    WineDetail { wine_id: u64 },
}

pub struct MockBackend {
    auth_response: AuthResponse,
    refreshed_token: String,
    upload_url: String,
    failures: Mutex<HashMap<MockOperation, ApiError>>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            auth_response: AuthResponse {
                user: User {
                    id: 1,
                    email: "somm@example.com".to_string(),
                    nickname: "somm".to_string(),
                    image: None,
                },
                access_token: "mock-access".to_string(),
                refresh_token: "mock-refresh".to_string(),
            },
            refreshed_token: "mock-access-refreshed".to_string(),
            upload_url: "https://images.example.com/mock.png".to_string(),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer login and register with this payload
    pub fn with_auth_response(mut self, response: AuthResponse) -> Self {
        self.auth_response = response;
        self
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Make `operation` fail with `error` from now on
    pub fn fail(&self, operation: MockOperation, error: ApiError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, error);
    }

    /// Let `operation` succeed again
    pub fn succeed(&self, operation: MockOperation) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&operation);
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, operation: MockOperation, call: MockCall) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operation)
        {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}

fn review_from_update(id: u64, update: &ReviewUpdate, wine_id: Option<u64>) -> Review {
    Review {
        id,
        rating: update.rating,
        light_bold: update.light_bold,
        smooth_tannic: update.smooth_tannic,
        dry_sweet: update.dry_sweet,
        soft_acidic: update.soft_acidic,
        aroma: update.aroma.iter().map(|a| a.as_str().to_string()).collect(),
        content: update.content.clone(),
        created_at: None,
        updated_at: None,
        user: None,
        wine_id,
        is_liked: None,
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.record(
            MockOperation::Login,
            MockCall::Login {
                email: request.email.clone(),
            },
        )?;
        Ok(self.auth_response.clone())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.record(
            MockOperation::Register,
            MockCall::Register {
                email: request.email.clone(),
                nickname: request.nickname.clone(),
            },
        )?;
        Ok(self.auth_response.clone())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse> {
        self.record(
            MockOperation::RefreshToken,
            MockCall::RefreshToken {
                refresh_token: refresh_token.to_string(),
            },
        )?;
        Ok(RefreshResponse {
            access_token: self.refreshed_token.clone(),
        })
    }

    async fn post_review(&self, access_token: &str, review: &NewReview) -> Result<Review> {
        self.record(
            MockOperation::PostReview,
            MockCall::PostReview {
                access_token: access_token.to_string(),
                review: review.clone(),
            },
        )?;
        Ok(review_from_update(100, &review.review, Some(review.wine_id)))
    }

    async fn update_review(
        &self,
        access_token: &str,
        review_id: u64,
        review: &ReviewUpdate,
    ) -> Result<Review> {
        self.record(
            MockOperation::UpdateReview,
            MockCall::UpdateReview {
                access_token: access_token.to_string(),
                review_id,
                review: review.clone(),
            },
        )?;
        Ok(review_from_update(review_id, review, None))
    }

    async fn delete_review(&self, access_token: &str, review_id: u64) -> Result<()> {
        self.record(
            MockOperation::DeleteReview,
            MockCall::DeleteReview {
                access_token: access_token.to_string(),
                review_id,
            },
        )
    }

    async fn upload_image(&self, access_token: Option<&str>, image: &ImageFile) -> Result<String> {
        self.record(
            MockOperation::UploadImage,
            MockCall::UploadImage {
                access_token: access_token.map(str::to_string),
                file_name: image.file_name.clone(),
            },
        )?;
        Ok(self.upload_url.clone())
    }

    async fn post_wine(&self, access_token: Option<&str>, wine: &WinePayload) -> Result<Wine> {
        self.record(
            MockOperation::PostWine,
            MockCall::PostWine {
                access_token: access_token.map(str::to_string),
                wine: wine.clone(),
            },
        )?;
        Ok(Wine {
            id: 42,
            name: wine.name.clone(),
            region: wine.region.clone(),
            image: wine.image.clone(),
            price: wine.price,
            wine_type: wine.wine_type,
            avg_rating: 0.0,
            review_count: 0,
        })
    }

    async fn wine_detail(&self, wine_id: u64) -> Result<WineDetail> {
        self.record(MockOperation::WineDetail, MockCall::WineDetail { wine_id })?;
        Ok(WineDetail {
            id: wine_id,
            name: "Mock Cabernet".to_string(),
            region: "Napa".to_string(),
            image: String::new(),
            price: 30000,
            wine_type: WineType::Red,
            avg_rating: 0.0,
            avg_ratings: Default::default(),
            reviews: Vec::new(),
            review_count: 0,
            recent_review: None,
        })
    }
}
