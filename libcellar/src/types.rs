//! Core types for Cellar
//!
//! Server read models mirror the JSON shapes of the REST backend
//! (camelCase keys, unknown keys ignored).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CellarError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body returned by the login and register endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================================================
// Wine
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WineType {
    #[default]
    Red,
    White,
    Sparkling,
}

impl WineType {
    pub const ALL: [WineType; 3] = [WineType::Red, WineType::White, WineType::Sparkling];

    pub fn as_str(&self) -> &'static str {
        match self {
            WineType::Red => "RED",
            WineType::White => "WHITE",
            WineType::Sparkling => "SPARKLING",
        }
    }
}

impl FromStr for WineType {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self> {
        WineType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CellarError::InvalidInput(format!(
                    "Unknown wine type '{}'. Valid types: RED, WHITE, SPARKLING",
                    s
                ))
            })
    }
}

impl std::fmt::Display for WineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wine as returned by the creation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wine {
    pub id: u64,
    pub name: String,
    pub region: String,
    pub image: String,
    pub price: u64,
    #[serde(rename = "type")]
    pub wine_type: WineType,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub review_count: u64,
}

/// Wine detail page model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WineDetail {
    pub id: u64,
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub image: String,
    pub price: u64,
    #[serde(rename = "type")]
    pub wine_type: WineType,
    #[serde(default)]
    pub avg_rating: f64,
    /// Number of reviews per star rating, keyed "1".."5"
    #[serde(default)]
    pub avg_ratings: BTreeMap<String, u64>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub review_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_review: Option<Review>,
}

// ============================================================================
// Reviews
// ============================================================================

/// Aroma tag vocabulary accepted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aroma {
    Cherry,
    Berry,
    Oak,
    Vanilla,
    Pepper,
    Baking,
    Grass,
    Apple,
    Peach,
    Citrus,
    Tropical,
    Mineral,
    Flower,
    Tobacco,
    Earth,
    Chocolate,
    Spice,
    Caramel,
    Leather,
}

impl Aroma {
    pub const ALL: [Aroma; 19] = [
        Aroma::Cherry,
        Aroma::Berry,
        Aroma::Oak,
        Aroma::Vanilla,
        Aroma::Pepper,
        Aroma::Baking,
        Aroma::Grass,
        Aroma::Apple,
        Aroma::Peach,
        Aroma::Citrus,
        Aroma::Tropical,
        Aroma::Mineral,
        Aroma::Flower,
        Aroma::Tobacco,
        Aroma::Earth,
        Aroma::Chocolate,
        Aroma::Spice,
        Aroma::Caramel,
        Aroma::Leather,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aroma::Cherry => "CHERRY",
            Aroma::Berry => "BERRY",
            Aroma::Oak => "OAK",
            Aroma::Vanilla => "VANILLA",
            Aroma::Pepper => "PEPPER",
            Aroma::Baking => "BAKING",
            Aroma::Grass => "GRASS",
            Aroma::Apple => "APPLE",
            Aroma::Peach => "PEACH",
            Aroma::Citrus => "CITRUS",
            Aroma::Tropical => "TROPICAL",
            Aroma::Mineral => "MINERAL",
            Aroma::Flower => "FLOWER",
            Aroma::Tobacco => "TOBACCO",
            Aroma::Earth => "EARTH",
            Aroma::Chocolate => "CHOCOLATE",
            Aroma::Spice => "SPICE",
            Aroma::Caramel => "CARAMEL",
            Aroma::Leather => "LEATHER",
        }
    }
}

impl FromStr for Aroma {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self> {
        Aroma::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CellarError::InvalidInput(format!("Unknown aroma tag '{}'", s)))
    }
}

impl std::fmt::Display for Aroma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest value a taste slider can take
pub const TASTE_MAX: u8 = 10;

/// The four taste slider axes, in payload order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasteAxis {
    LightBold,
    SmoothTannic,
    DrySweet,
    SoftAcidic,
}

impl TasteAxis {
    pub const ALL: [TasteAxis; 4] = [
        TasteAxis::LightBold,
        TasteAxis::SmoothTannic,
        TasteAxis::DrySweet,
        TasteAxis::SoftAcidic,
    ];

    fn index(self) -> usize {
        match self {
            TasteAxis::LightBold => 0,
            TasteAxis::SmoothTannic => 1,
            TasteAxis::DrySweet => 2,
            TasteAxis::SoftAcidic => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TasteAxis::LightBold => "light/bold",
            TasteAxis::SmoothTannic => "smooth/tannic",
            TasteAxis::DrySweet => "dry/sweet",
            TasteAxis::SoftAcidic => "soft/acidic",
        }
    }
}

/// Taste slider positions, always within `0..=TASTE_MAX`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TasteValues([u8; 4]);

impl TasteValues {
    pub fn new(values: [u8; 4]) -> Result<Self> {
        let mut taste = Self::default();
        for (axis, value) in TasteAxis::ALL.into_iter().zip(values) {
            taste.set(axis, value)?;
        }
        Ok(taste)
    }

    /// Build from server data, pinning out-of-range values to the bounds
    pub fn clamped(values: [u8; 4]) -> Self {
        Self(values.map(|v| v.min(TASTE_MAX)))
    }

    pub fn get(&self, axis: TasteAxis) -> u8 {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: TasteAxis, value: u8) -> Result<()> {
        if value > TASTE_MAX {
            return Err(CellarError::InvalidInput(format!(
                "Taste value for {} must be between 0 and {} (got {})",
                axis.label(),
                TASTE_MAX,
                value
            )));
        }
        self.0[axis.index()] = value;
        Ok(())
    }

    pub fn as_array(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for TasteValues {
    type Err = CellarError;

    /// Parse four comma-separated slider values, e.g. `"1,2,3,4"`
    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .split(',')
            .map(|part| {
                part.trim().parse::<u8>().map_err(|_| {
                    CellarError::InvalidInput(format!("Invalid taste value '{}'", part.trim()))
                })
            })
            .collect::<Result<Vec<u8>>>()?;

        let values: [u8; 4] = parsed.try_into().map_err(|v: Vec<u8>| {
            CellarError::InvalidInput(format!("Expected 4 taste values, got {}", v.len()))
        })?;

        Self::new(values)
    }
}

/// Author summary embedded in a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: u64,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub rating: u8,
    pub light_bold: u8,
    pub smooth_tannic: u8,
    pub dry_sweet: u8,
    pub soft_acidic: u8,
    /// Tags as sent by the server; may include tags outside [`Aroma::ALL`]
    #[serde(default)]
    pub aroma: Vec<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ReviewAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wine_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

impl Review {
    pub fn taste_values(&self) -> TasteValues {
        TasteValues::clamped([
            self.light_bold,
            self.smooth_tannic,
            self.dry_sweet,
            self.soft_acidic,
        ])
    }

    /// Tags from the known vocabulary; anything else is skipped
    pub fn known_aromas(&self) -> Vec<Aroma> {
        self.aroma
            .iter()
            .filter_map(|tag| match tag.parse::<Aroma>() {
                Ok(aroma) => Some(aroma),
                Err(_) => {
                    tracing::debug!(review_id = self.id, tag = %tag, "Skipping unknown aroma tag");
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Image uploads
// ============================================================================

/// Supported image MIME types for wine pictures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

/// An image picked for upload, held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: ImageMimeType,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Read an image from disk, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageMimeType::from_extension)
            .ok_or_else(|| {
                CellarError::InvalidInput(format!(
                    "Unsupported image type: {} (expected jpg, png, gif or webp)",
                    path.display()
                ))
            })?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        let bytes = std::fs::read(path).map_err(|e| {
            CellarError::InvalidInput(format!("Failed to read image {}: {}", path.display(), e))
        })?;

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}
