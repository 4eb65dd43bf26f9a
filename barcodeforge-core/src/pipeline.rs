//! Barcode Pipeline - Single Entry Point
//!
//! content → symbology → bar pattern → raster → (resize) → PNG with DPI.
//! Pure and stateless; persistence and URL issuance belong to the caller.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig};
use crate::encoding::{encoder_for, EncodeError};
use crate::hashing::sha256_hex;
use crate::render::{self, RenderError, RenderStyle};
use crate::symbology::{resolve_content, BarcodeFormat, IdentifierSource};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid barcode format provided: {0}")]
    InvalidFormat(String),

    #[error("At least one of SKU, UPC, or EAN must be provided")]
    MissingIdentifier,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Encoding error: {0}")]
    EncodingError(#[from] EncodeError),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeRequest {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    pub format: String,
    /// "WxH" in pixels
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// DPI
    #[serde(default)]
    pub resolution: Option<i64>,
}

impl BarcodeRequest {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into(), ..Default::default() }
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn upc(mut self, upc: impl Into<String>) -> Self {
        self.upc = Some(upc.into());
        self
    }

    pub fn ean(mut self, ean: impl Into<String>) -> Self {
        self.ean = Some(ean.into());
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn resolution(mut self, dpi: i64) -> Self {
        self.resolution = Some(dpi);
        self
    }
}

/// The rendered output of one request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeArtifact {
    pub image_bytes: Vec<u8>,
    pub format: BarcodeFormat,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of `image_bytes`
    pub content_hash: String,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub source: IdentifierSource,
}

impl BarcodeArtifact {
    pub fn file_name(&self) -> String {
        format!("barcode_{}.png", self.content_hash)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.image_bytes)
        )
    }
}

/// Parse "WxH" into two positive pixel counts no larger than `max`.
pub fn parse_size(size: &str, max: u32) -> Result<(u32, u32), PipelineError> {
    let invalid = || PipelineError::InvalidGeometry(format!("size {:?} is not WIDTHxHEIGHT", size));

    let (w, h) = size.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidGeometry(format!(
            "size {:?} must have positive dimensions",
            size
        )));
    }
    if width > max || height > max {
        return Err(PipelineError::InvalidGeometry(format!(
            "size {:?} exceeds the {} pixel limit",
            size, max
        )));
    }
    Ok((width, height))
}

/// The barcode pipeline - single entry point for image generation
#[derive(Debug, Clone, Default)]
pub struct BarcodePipeline {
    config: PipelineConfig,
}

impl BarcodePipeline {
    /// Does not run [`PipelineConfig::check`]; use [`Self::try_new`] for
    /// configs that did not come from `load_from_file` or `Default`.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate a barcode artifact.
    ///
    /// Errors surface in step order: identifier, format, encoding, color,
    /// size, resolution.
    #[tracing::instrument(skip_all, fields(format = %request.format))]
    pub fn generate(&self, request: &BarcodeRequest) -> Result<BarcodeArtifact, PipelineError> {
        let (source, content) = resolve_content(
            request.sku.as_deref(),
            request.upc.as_deref(),
            request.ean.as_deref(),
        )
        .ok_or(PipelineError::MissingIdentifier)?;

        let format = BarcodeFormat::parse(&request.format)
            .ok_or_else(|| PipelineError::InvalidFormat(request.format.clone()))?;

        let pattern = encoder_for(format).encode(content)?;
        tracing::debug!(?source, modules = pattern.len(), "encoded content");

        let color = request.color.as_deref().unwrap_or(&self.config.default_color);
        let foreground =
            render::parse_color(color).ok_or_else(|| PipelineError::InvalidColor(color.to_string()))?;
        let style = RenderStyle::from_config(&self.config, foreground);
        let max = self.config.max_dimension;
        match style.native_size(&pattern) {
            Some((width, height)) if width <= max && height <= max => {}
            _ => {
                return Err(PipelineError::InvalidGeometry(format!(
                    "{} modules exceed the {} pixel limit at native size",
                    pattern.len(),
                    max
                )));
            }
        }
        let mut image = render::rasterize(&pattern, &style)?;

        if let Some(size) = request.size.as_deref() {
            let (width, height) = parse_size(size, self.config.max_dimension)?;
            image = render::resize_exact(&image, width, height);
        }

        let dpi = match request.resolution {
            Some(dpi) => u32::try_from(dpi)
                .ok()
                .filter(|d| (1..=self.config.max_resolution).contains(d))
                .ok_or_else(|| {
                    PipelineError::InvalidGeometry(format!(
                        "resolution {} must be between 1 and {}",
                        dpi, self.config.max_resolution
                    ))
                })?,
            None => self.config.default_resolution,
        };

        let image_bytes = render::encode_png(&image, dpi)?;
        let content_hash = sha256_hex(&image_bytes);

        tracing::info!(
            %format,
            width = image.width(),
            height = image.height(),
            dpi,
            content_hash = %content_hash,
            "generated barcode"
        );

        Ok(BarcodeArtifact {
            image_bytes,
            format,
            created_at: Utc::now(),
            content_hash,
            width: image.width(),
            height: image.height(),
            dpi,
            source,
        })
    }
}
