//! Review modal state and the review submission flow
//!
//! [`ReviewModal`] is the in-memory store behind the review form: the draft
//! being edited plus the open/closed flag and add/edit mode. It lives only as
//! long as the front end holds it and is reset on close or after a
//! successful submit.
//!
//! [`ReviewService`] turns a submittable draft into exactly one request
//! (`POST /reviews` when adding, `PATCH /reviews/{id}` when editing).

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info};

use super::events::{Event, EventBus, SubmissionKind};
use crate::api::{Backend, NewReview, ReviewUpdate};
use crate::error::{CellarError, Result};
use crate::session::SessionStore;
use crate::types::{Aroma, Review, TasteAxis, TasteValues};

/// Lowest and highest star rating
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// In-progress review fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    rating: Option<u8>,
    taste_values: TasteValues,
    selected_tags: BTreeSet<Aroma>,
    content: String,
    wine_id: Option<u64>,
}

impl ReviewDraft {
    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    pub fn taste_values(&self) -> TasteValues {
        self.taste_values
    }

    pub fn selected_tags(&self) -> &BTreeSet<Aroma> {
        &self.selected_tags
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn wine_id(&self) -> Option<u64> {
        self.wine_id
    }

    pub fn set_rating(&mut self, rating: u8) -> Result<()> {
        if !RATING_RANGE.contains(&rating) {
            return Err(CellarError::InvalidInput(format!(
                "Rating must be between 1 and 5 (got {})",
                rating
            )));
        }
        self.rating = Some(rating);
        Ok(())
    }

    pub fn set_taste_value(&mut self, axis: TasteAxis, value: u8) -> Result<()> {
        self.taste_values.set(axis, value)
    }

    pub fn set_taste_values(&mut self, values: TasteValues) {
        self.taste_values = values;
    }

    /// Flip a tag's selection; returns whether it is selected afterwards
    pub fn toggle_tag(&mut self, tag: Aroma) -> bool {
        if self.selected_tags.remove(&tag) {
            false
        } else {
            self.selected_tags.insert(tag);
            true
        }
    }

    pub fn select_tag(&mut self, tag: Aroma) {
        self.selected_tags.insert(tag);
    }

    pub fn deselect_tag(&mut self, tag: Aroma) {
        self.selected_tags.remove(&tag);
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_wine_id(&mut self, wine_id: u64) {
        self.wine_id = Some(wine_id);
    }

    /// Restore every field to its initial value
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rating chosen, content written and at least one aroma picked
    pub fn can_submit(&self) -> bool {
        self.rating.is_some() && !self.content.trim().is_empty() && !self.selected_tags.is_empty()
    }

    /// Explain the first unmet submit condition, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.rating.is_none() {
            Some("a rating")
        } else if self.content.trim().is_empty() {
            Some("review text")
        } else if self.selected_tags.is_empty() {
            Some("at least one aroma")
        } else {
            None
        }
    }

    /// Assemble the update body; fails if the draft is not submittable
    pub fn to_update(&self) -> Result<ReviewUpdate> {
        if let Some(missing) = self.missing_field() {
            return Err(CellarError::InvalidInput(format!(
                "Review is incomplete: {} is required",
                missing
            )));
        }

        let [light_bold, smooth_tannic, dry_sweet, soft_acidic] = self.taste_values.as_array();
        Ok(ReviewUpdate {
            rating: self.rating.unwrap_or_default(),
            light_bold,
            smooth_tannic,
            dry_sweet,
            soft_acidic,
            aroma: self.selected_tags.iter().copied().collect(),
            content: self.content.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewMode {
    #[default]
    Add,
    Edit {
        review_id: u64,
    },
}

/// Review form store: draft plus modal flags
#[derive(Debug, Clone, Default)]
pub struct ReviewModal {
    open: bool,
    mode: ReviewMode,
    draft: ReviewDraft,
}

impl ReviewModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> ReviewMode {
        self.mode
    }

    /// Id of the review being edited, if in edit mode
    pub fn editing_review_id(&self) -> Option<u64> {
        match self.mode {
            ReviewMode::Add => None,
            ReviewMode::Edit { review_id } => Some(review_id),
        }
    }

    pub fn draft(&self) -> &ReviewDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ReviewDraft {
        &mut self.draft
    }

    /// Open with an empty draft for a new review of `wine_id`
    pub fn open_add(&mut self, wine_id: u64) {
        self.draft.reset();
        self.draft.set_wine_id(wine_id);
        self.mode = ReviewMode::Add;
        self.open = true;
    }

    /// Open prefilled with an existing review
    pub fn open_edit(&mut self, wine_id: u64, review: &Review) {
        self.draft = ReviewDraft {
            rating: RATING_RANGE.contains(&review.rating).then_some(review.rating),
            taste_values: review.taste_values(),
            selected_tags: review.known_aromas().into_iter().collect(),
            content: review.content.clone(),
            wine_id: Some(wine_id),
        };
        self.mode = ReviewMode::Edit {
            review_id: review.id,
        };
        self.open = true;
    }

    /// Close and discard the draft
    pub fn close(&mut self) {
        self.open = false;
        self.mode = ReviewMode::Add;
        self.draft.reset();
    }

    pub fn reset_review(&mut self) {
        self.draft.reset();
    }

    pub fn can_submit(&self) -> bool {
        self.draft.can_submit()
    }
}

/// Sends review drafts and deletions to the backend
#[derive(Clone)]
pub struct ReviewService {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    events: EventBus,
}

impl ReviewService {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore, events: EventBus) -> Self {
        Self {
            backend,
            session,
            events,
        }
    }

    /// Submit the modal's draft
    ///
    /// On success the draft is reset and the modal closed. On failure the
    /// modal is left open with the draft untouched so it can be resubmitted.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the modal is closed or the draft is incomplete
    ///   (no request is made)
    /// - `ApiError::Authentication` if no access token is stored
    /// - any error returned by the backend
    pub async fn submit(&self, modal: &mut ReviewModal) -> Result<Review> {
        if !modal.is_open() {
            return Err(CellarError::InvalidInput(
                "Review form is not open".to_string(),
            ));
        }

        let update = modal.draft().to_update()?;
        let access_token = self.session.require_access_token()?;

        let result = match modal.mode() {
            ReviewMode::Add => {
                let wine_id = modal.draft().wine_id().ok_or_else(|| {
                    CellarError::InvalidInput("No wine selected for this review".to_string())
                })?;
                self.backend
                    .post_review(
                        &access_token,
                        &NewReview {
                            review: update,
                            wine_id,
                        },
                    )
                    .await
            }
            ReviewMode::Edit { review_id } => {
                self.backend
                    .update_review(&access_token, review_id, &update)
                    .await
            }
        };

        match result {
            Ok(review) => {
                let edited = modal.editing_review_id().is_some();
                let wine_id = modal.draft().wine_id();
                modal.close();

                info!(review_id = review.id, edited, "Review submitted");
                self.events.emit(Event::ReviewSubmitted {
                    review_id: review.id,
                    wine_id,
                    edited,
                });
                Ok(review)
            }
            Err(e) => {
                error!("Review submission failed, keeping draft: {}", e);
                self.events.emit(Event::SubmissionFailed {
                    kind: SubmissionKind::Review,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn delete(&self, review_id: u64) -> Result<()> {
        let access_token = self.session.require_access_token()?;
        self.backend.delete_review(&access_token, review_id).await?;

        info!(review_id, "Review deleted");
        self.events.emit(Event::ReviewDeleted { review_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockCall, MockOperation};
    use crate::error::ApiError;
    use tempfile::TempDir;

    fn complete_draft() -> ReviewDraft {
        let mut draft = ReviewDraft::default();
        draft.set_rating(4).unwrap();
        draft.set_content("nice");
        draft.select_tag(Aroma::Cherry);
        draft
    }

    struct Fixture {
        backend: Arc<MockBackend>,
        session: SessionStore,
        service: ReviewService,
        events: EventBus,
        _temp_dir: TempDir,
    }

    fn fixture(signed_in: bool) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let events = EventBus::new(16);
        let session =
            SessionStore::load(temp_dir.path().join("auth-storage.json"), events.clone()).unwrap();
        if signed_in {
            session.set_access_token("token-123").unwrap();
        }
        let backend = Arc::new(MockBackend::new());
        let service = ReviewService::new(backend.clone(), session.clone(), events.clone());
        Fixture {
            backend,
            session,
            service,
            events,
            _temp_dir: temp_dir,
        }
    }

    #[test]
    fn test_can_submit_requires_all_three_conditions() {
        assert!(complete_draft().can_submit());

        let mut no_rating = complete_draft();
        no_rating.rating = None;
        assert!(!no_rating.can_submit());

        let mut no_content = complete_draft();
        no_content.set_content("");
        assert!(!no_content.can_submit());

        let mut blank_content = complete_draft();
        blank_content.set_content("   ");
        assert!(!blank_content.can_submit());

        let mut no_tags = complete_draft();
        no_tags.deselect_tag(Aroma::Cherry);
        assert!(!no_tags.can_submit());
    }

    #[test]
    fn test_rating_range_enforced() {
        let mut draft = ReviewDraft::default();
        assert!(draft.set_rating(0).is_err());
        assert!(draft.set_rating(6).is_err());
        assert_eq!(draft.rating(), None);
        draft.set_rating(5).unwrap();
        assert_eq!(draft.rating(), Some(5));
    }

    #[test]
    fn test_toggle_tag() {
        let mut draft = ReviewDraft::default();
        assert!(draft.toggle_tag(Aroma::Oak));
        assert!(draft.selected_tags().contains(&Aroma::Oak));
        assert!(!draft.toggle_tag(Aroma::Oak));
        assert!(draft.selected_tags().is_empty());
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut modal = ReviewModal::new();
        modal.open_add(7);
        let draft = modal.draft_mut();
        draft.set_rating(3).unwrap();
        draft.set_taste_values(TasteValues::new([1, 2, 3, 4]).unwrap());
        draft.select_tag(Aroma::Vanilla);
        draft.set_content("smooth");

        modal.reset_review();

        let draft = modal.draft();
        assert_eq!(draft.rating(), None);
        assert_eq!(draft.taste_values().as_array(), [0, 0, 0, 0]);
        assert!(draft.selected_tags().is_empty());
        assert_eq!(draft.content(), "");
        assert_eq!(draft.wine_id(), None);
        assert_eq!(*draft, ReviewDraft::default());
    }

    #[test]
    fn test_to_update_reports_missing_field() {
        let mut draft = complete_draft();
        draft.set_content("");
        let err = draft.to_update().unwrap_err();
        assert!(err.to_string().contains("review text"));
    }

    #[test]
    fn test_open_edit_prefills_draft() {
        let review = Review {
            id: 55,
            rating: 3,
            light_bold: 6,
            smooth_tannic: 5,
            dry_sweet: 4,
            soft_acidic: 3,
            aroma: vec!["OAK".to_string(), "BERRY".to_string(), "PLUM".to_string()],
            content: "old text".to_string(),
            created_at: None,
            updated_at: None,
            user: None,
            wine_id: None,
            is_liked: None,
        };

        let mut modal = ReviewModal::new();
        modal.open_edit(7, &review);

        assert!(modal.is_open());
        assert_eq!(modal.editing_review_id(), Some(55));
        assert_eq!(modal.draft().rating(), Some(3));
        assert_eq!(modal.draft().taste_values().as_array(), [6, 5, 4, 3]);
        assert_eq!(modal.draft().content(), "old text");
        assert_eq!(modal.draft().wine_id(), Some(7));
        // PLUM is outside the vocabulary and is dropped
        assert_eq!(
            modal.draft().selected_tags().iter().copied().collect::<Vec<_>>(),
            vec![Aroma::Berry, Aroma::Oak]
        );
        assert!(modal.can_submit());

        modal.close();
        assert!(!modal.is_open());
        assert_eq!(modal.mode(), ReviewMode::Add);
        assert_eq!(*modal.draft(), ReviewDraft::default());
    }

    #[tokio::test]
    async fn test_submit_add_posts_once_and_clears_draft() {
        let fx = fixture(true);
        let mut receiver = fx.events.subscribe();

        let mut modal = ReviewModal::new();
        modal.open_add(7);
        let draft = modal.draft_mut();
        draft.set_rating(4).unwrap();
        draft.set_content("nice");
        draft.select_tag(Aroma::Cherry);
        draft.set_taste_values(TasteValues::new([1, 2, 3, 4]).unwrap());

        let review = fx.service.submit(&mut modal).await.unwrap();
        assert_eq!(review.wine_id, Some(7));

        assert_eq!(
            fx.backend.calls(),
            vec![MockCall::PostReview {
                access_token: "token-123".to_string(),
                review: NewReview {
                    review: ReviewUpdate {
                        rating: 4,
                        light_bold: 1,
                        smooth_tannic: 2,
                        dry_sweet: 3,
                        soft_acidic: 4,
                        aroma: vec![Aroma::Cherry],
                        content: "nice".to_string(),
                    },
                    wine_id: 7,
                },
            }]
        );
        assert!(!modal.is_open());
        assert_eq!(*modal.draft(), ReviewDraft::default());
        assert!(matches!(
            receiver.recv().await.unwrap(),
            Event::ReviewSubmitted {
                edited: false,
                wine_id: Some(7),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_edit_patches_review() {
        let fx = fixture(true);
        let mut modal = ReviewModal::new();
        modal.open_add(7);
        *modal.draft_mut() = complete_draft();
        modal.mode = ReviewMode::Edit { review_id: 12 };

        fx.service.submit(&mut modal).await.unwrap();

        match fx.backend.calls().as_slice() {
            [MockCall::UpdateReview {
                review_id, review, ..
            }] => {
                assert_eq!(*review_id, 12);
                assert_eq!(review.content, "nice");
            }
            other => panic!("Unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incomplete_draft_makes_no_request() {
        let fx = fixture(true);
        let mut modal = ReviewModal::new();
        modal.open_add(7);
        modal.draft_mut().set_rating(4).unwrap();

        let result = fx.service.submit(&mut modal).await;
        assert!(matches!(result, Err(CellarError::InvalidInput(_))));
        assert!(fx.backend.calls().is_empty());
        assert!(modal.is_open());
    }

    #[tokio::test]
    async fn test_signed_out_submit_makes_no_request() {
        let fx = fixture(false);
        let mut modal = ReviewModal::new();
        modal.open_add(7);
        *modal.draft_mut() = complete_draft();
        modal.draft_mut().set_wine_id(7);

        let result = fx.service.submit(&mut modal).await;
        assert!(matches!(
            result,
            Err(CellarError::Api(ApiError::Authentication(_)))
        ));
        assert!(fx.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft_and_modal_open() {
        let fx = fixture(true);
        fx.backend.fail(
            MockOperation::PostReview,
            ApiError::Network("connection reset".to_string()),
        );

        let mut modal = ReviewModal::new();
        modal.open_add(7);
        *modal.draft_mut() = complete_draft();
        modal.draft_mut().set_wine_id(7);
        let before = modal.draft().clone();

        assert!(fx.service.submit(&mut modal).await.is_err());
        assert!(modal.is_open());
        assert_eq!(*modal.draft(), before);

        fx.backend.succeed(MockOperation::PostReview);
        fx.service.submit(&mut modal).await.unwrap();
        assert_eq!(fx.backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_reads_token_at_call_time() {
        let fx = fixture(true);
        let mut modal = ReviewModal::new();
        modal.open_add(7);
        *modal.draft_mut() = complete_draft();
        modal.draft_mut().set_wine_id(7);

        fx.session.set_access_token("rotated").unwrap();
        fx.service.submit(&mut modal).await.unwrap();

        assert!(matches!(
            fx.backend.calls().as_slice(),
            [MockCall::PostReview { access_token, .. }] if access_token == "rotated"
        ));
    }

    #[tokio::test]
    async fn test_closed_modal_is_rejected() {
        let fx = fixture(true);
        let mut modal = ReviewModal::new();
        *modal.draft_mut() = complete_draft();

        assert!(fx.service.submit(&mut modal).await.is_err());
        assert!(fx.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_review() {
        let fx = fixture(true);
        fx.service.delete(31).await.unwrap();
        assert_eq!(
            fx.backend.calls(),
            vec![MockCall::DeleteReview {
                access_token: "token-123".to_string(),
                review_id: 31,
            }]
        );
    }
}
