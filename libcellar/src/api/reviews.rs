//! Review calls

use reqwest::Method;
use serde::Deserialize;
use tracing::error;

use super::{NewReview, ReviewUpdate};
use crate::client::ApiClient;
use crate::error::Result;
use crate::types::Review;

pub async fn update_wine_review(
    client: &ApiClient,
    access_token: &str,
    review_id: u64,
    review: &ReviewUpdate,
) -> Result<Review> {
    let http = client
        .request(Method::PATCH, &format!("/reviews/{}", review_id))
        .bearer_auth(access_token)
        .json(review);

    client.send_json(http, "update review").await.map_err(|e| {
        error!("Failed to update review {}: {}", review_id, e);
        e
    })
}

pub async fn post_wine_review(
    client: &ApiClient,
    access_token: &str,
    review: &NewReview,
) -> Result<Review> {
    let http = client
        .request(Method::POST, "/reviews")
        .bearer_auth(access_token)
        .json(review);

    client.send_json(http, "post review").await.map_err(|e| {
        error!("Failed to post review for wine {}: {}", review.wine_id, e);
        e
    })
}

#[derive(Deserialize)]
struct DeletedReview {
    id: u64,
}

pub async fn delete_wine_review(client: &ApiClient, access_token: &str, review_id: u64) -> Result<()> {
    let http = client
        .request(Method::DELETE, &format!("/reviews/{}", review_id))
        .bearer_auth(access_token);

    let deleted: DeletedReview = client.send_json(http, "delete review").await.map_err(|e| {
        error!("Failed to delete review {}: {}", review_id, e);
        e
    })?;

    tracing::debug!("Deleted review {}", deleted.id);
    Ok(())
}
