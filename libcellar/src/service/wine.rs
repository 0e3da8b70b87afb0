//! Wine registration form and wine lookups

use std::sync::Arc;

use tracing::{error, info};

use super::events::{Event, EventBus, SubmissionKind};
use crate::api::{Backend, WinePayload};
use crate::error::{CellarError, Result};
use crate::session::SessionStore;
use crate::types::{ImageFile, Wine, WineDetail, WineType};

/// Inline error shown on the form after any failed registration
pub const REGISTER_FAILED_MESSAGE: &str = "Failed to register wine. Please try again.";

/// Values entered in the "register wine" form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WineForm {
    pub name: String,
    /// Price in whole currency units; 0 means not entered
    pub price: u64,
    pub region: String,
    pub wine_type: WineType,
    pub image: Option<ImageFile>,
    post_error: Option<String>,
}

impl WineForm {
    /// A filled-in form with no inline error; use `default()` for an empty one
    pub fn new(
        name: impl Into<String>,
        price: u64,
        region: impl Into<String>,
        wine_type: WineType,
        image: ImageFile,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            region: region.into(),
            wine_type,
            image: Some(image),
            post_error: None,
        }
    }

    /// Name, price, region and image are all required
    pub fn can_submit(&self) -> bool {
        !self.name.is_empty() && self.price != 0 && !self.region.is_empty() && self.image.is_some()
    }

    /// Error from the last failed registration, if any
    pub fn post_error(&self) -> Option<&str> {
        self.post_error.as_deref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone)]
pub struct WineService {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    events: EventBus,
}

impl WineService {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore, events: EventBus) -> Self {
        Self {
            backend,
            session,
            events,
        }
    }

    /// Upload the form's image, then create the wine pointing at it
    ///
    /// The creation request is only sent once the upload has returned a URL.
    /// Any failure leaves the entered values in place and sets the form's
    /// inline error; success resets the form.
    pub async fn register(&self, form: &mut WineForm) -> Result<Wine> {
        let image = match (&form.image, form.can_submit()) {
            (Some(image), true) => image,
            _ => {
                return Err(CellarError::InvalidInput(
                    "Name, price, region and image are all required".to_string(),
                ))
            }
        };

        // Sent when present; the wine endpoints accept anonymous calls
        let access_token = self.session.access_token();

        let result = async {
            let image_url = self
                .backend
                .upload_image(access_token.as_deref(), image)
                .await?;

            let payload = WinePayload {
                name: form.name.clone(),
                region: form.region.clone(),
                image: image_url,
                price: form.price,
                wine_type: form.wine_type,
            };
            self.backend
                .post_wine(access_token.as_deref(), &payload)
                .await
        }
        .await;

        match result {
            Ok(wine) => {
                form.reset();

                info!(wine_id = wine.id, "Registered wine {}", wine.name);
                self.events.emit(Event::WineRegistered {
                    wine_id: wine.id,
                    name: wine.name.clone(),
                });
                Ok(wine)
            }
            Err(e) => {
                error!("Wine registration failed: {}", e);
                form.post_error = Some(REGISTER_FAILED_MESSAGE.to_string());
                self.events.emit(Event::SubmissionFailed {
                    kind: SubmissionKind::Wine,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn detail(&self, wine_id: u64) -> Result<WineDetail> {
        self.backend.wine_detail(wine_id).await
    }
}
