//! Wine calls: detail lookup, image upload and registration

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::error;

use super::WinePayload;
use crate::client::ApiClient;
use crate::error::{CellarError, Result};
use crate::types::{ImageFile, Wine, WineDetail};

pub async fn get_wine_detail(client: &ApiClient, wine_id: u64) -> Result<WineDetail> {
    let http = client.request(Method::GET, &format!("/wines/{}", wine_id));

    client.send_json(http, "load wine").await.map_err(|e| {
        error!("Failed to load wine {}: {}", wine_id, e);
        e
    })
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(alias = "imageUrl")]
    url: String,
}

/// Upload an image as multipart field `image`; returns the stored URL
pub async fn upload_wine_image(
    client: &ApiClient,
    access_token: Option<&str>,
    image: &ImageFile,
) -> Result<String> {
    let part = Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(image.mime.as_str())
        .map_err(|e| CellarError::InvalidInput(format!("Invalid image MIME type: {}", e)))?;
    let form = Form::new().part("image", part);

    let mut http = client
        .request(Method::POST, &client.config().image_upload_path)
        .multipart(form);
    if let Some(token) = access_token {
        http = http.bearer_auth(token);
    }

    let uploaded: UploadResponse = client.send_json(http, "upload image").await.map_err(|e| {
        error!("Failed to upload image {}: {}", image.file_name, e);
        e
    })?;

    Ok(uploaded.url)
}

pub async fn post_wine(
    client: &ApiClient,
    access_token: Option<&str>,
    wine: &WinePayload,
) -> Result<Wine> {
    let mut http = client.request(Method::POST, "/wines").json(wine);
    if let Some(token) = access_token {
        http = http.bearer_auth(token);
    }

    client.send_json(http, "register wine").await.map_err(|e| {
        error!("Failed to register wine {}: {}", wine.name, e);
        e
    })
}
