// Adaptive image compression
// Uploaded hotel and cover photos are embedded many times over in the generated PDF,
// so every image is scaled down and re-encoded as JPEG until it fits a byte budget.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

// Error types for image compression
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Image decode error: {0}")]
    DecodeError(String),

    #[error("Image encode error: {0}")]
    EncodeError(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Compression task failed: {0}")]
    TaskFailed(String),
}

// Compression configuration options
// Quality values are JPEG percentages (1-100)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub target_bytes: usize,
    pub initial_quality: u8,
    pub quality_step: u8,
    pub min_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: 1280,
            max_height: 720,
            target_bytes: 70_000,
            initial_quality: 80,
            quality_step: 10,
            min_quality: 10,
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), CompressionError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressionError::InvalidConfig(
                "maximum dimensions must be non-zero".to_string(),
            ));
        }
        if self.quality_step == 0 {
            return Err(CompressionError::InvalidConfig(
                "quality step must be non-zero".to_string(),
            ));
        }
        if self.min_quality == 0
            || self.initial_quality > 100
            || self.min_quality > self.initial_quality
        {
            return Err(CompressionError::InvalidConfig(format!(
                "quality range {}..={} is not within 1..=100",
                self.min_quality, self.initial_quality
            )));
        }
        Ok(())
    }
}

// A single image to compress and the bounds it must fit
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub image: Bytes,
    pub max_width: u32,
    pub max_height: u32,
    pub target_bytes: usize,
}

impl CompressionRequest {
    pub fn new(image: impl Into<Bytes>, max_width: u32, max_height: u32, target_bytes: usize) -> Self {
        Self {
            image: image.into(),
            max_width,
            max_height,
            target_bytes,
        }
    }
}

/// A JPEG re-encoding of the source image.
///
/// `within_budget` is false when the quality floor was reached before the encoding
/// fit `target_bytes`; the bytes are still the best the floor allows.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub attempts: u32,
    pub within_budget: bool,
}

impl CompressionResult {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_data_url(&self) -> String {
        format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(&self.bytes))
    }
}

/// Fits `width`×`height` inside the bounds, preserving aspect ratio.
///
/// The width bound is applied first, then the height bound to the already-scaled
/// size. Results are truncated to whole pixels like a canvas size, never below 1.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut w = f64::from(width);
    let mut h = f64::from(height);

    if w > f64::from(max_width) {
        h = (h * f64::from(max_width)) / w;
        w = f64::from(max_width);
    }
    if h > f64::from(max_height) {
        w = (w * f64::from(max_height)) / h;
        h = f64::from(max_height);
    }

    ((w as u32).max(1), (h as u32).max(1))
}

// Splits a `data:<mime>;base64,<payload>` URL into its decoded payload
pub fn decode_data_url(url: &str) -> Result<Bytes, CompressionError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CompressionError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CompressionError::InvalidDataUrl("missing payload separator".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(CompressionError::InvalidDataUrl(format!(
            "payload for '{}' is not base64",
            meta
        )));
    }

    Ok(Bytes::from(STANDARD.decode(payload.trim())?))
}

// Decodes the image upright: an EXIF orientation tag is applied to the pixels
fn decode_upright(data: &[u8]) -> Result<DynamicImage, CompressionError> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CompressionError::DecodeError(e.to_string()))?
        .into_decoder()
        .map_err(|e| CompressionError::DecodeError(e.to_string()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| CompressionError::DecodeError(e.to_string()))?;
    image.apply_orientation(orientation);
    Ok(image)
}

fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(canvas)
        .map_err(|e| CompressionError::EncodeError(e.to_string()))?;
    Ok(buf)
}

#[derive(Debug, Clone, Default)]
pub struct ImageCompressor {
    config: CompressionConfig,
}

impl ImageCompressor {
    pub fn new(config: CompressionConfig) -> Result<Self, CompressionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    // Request using the configured bounds
    pub fn request(&self, image: impl Into<Bytes>) -> CompressionRequest {
        CompressionRequest::new(
            image,
            self.config.max_width,
            self.config.max_height,
            self.config.target_bytes,
        )
    }

    /// Decodes, scales and re-encodes the image, lowering JPEG quality one step at a
    /// time until the output fits `target_bytes` or the quality floor is reached.
    pub fn compress(&self, request: &CompressionRequest) -> Result<CompressionResult, CompressionError> {
        if request.max_width == 0 || request.max_height == 0 {
            return Err(CompressionError::InvalidRequest(
                "maximum dimensions must be non-zero".to_string(),
            ));
        }

        let source = decode_upright(&request.image)?;
        let (source_width, source_height) = source.dimensions();
        let (width, height) = scaled_dimensions(
            source_width,
            source_height,
            request.max_width,
            request.max_height,
        );

        // JPEG has no alpha channel, the canvas is plain RGB
        let canvas = if (width, height) == (source_width, source_height) {
            source.to_rgb8()
        } else {
            source.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        };

        let mut quality = self.config.initial_quality;
        let mut attempts = 0;
        loop {
            let encoded = encode_jpeg(&canvas, quality)?;
            attempts += 1;
            let within_budget = encoded.len() <= request.target_bytes;

            debug!(
                quality,
                size = encoded.len(),
                target = request.target_bytes,
                "jpeg attempt"
            );

            if within_budget || quality <= self.config.min_quality {
                if !within_budget {
                    warn!(
                        size = encoded.len(),
                        target = request.target_bytes,
                        quality,
                        "quality floor reached above byte budget"
                    );
                }

                return Ok(CompressionResult {
                    bytes: Bytes::from(encoded),
                    width,
                    height,
                    quality,
                    attempts,
                    within_budget,
                });
            }

            quality = quality
                .saturating_sub(self.config.quality_step)
                .max(self.config.min_quality);
        }
    }

    // Data URL in, JPEG data URL out, using the configured bounds
    pub fn compress_data_url(&self, url: &str) -> Result<String, CompressionError> {
        let request = self.request(decode_data_url(url)?);
        Ok(self.compress(&request)?.to_data_url())
    }

    // Runs the compression on the blocking pool so async callers are not stalled
    pub async fn compress_async(
        &self,
        request: CompressionRequest,
    ) -> Result<CompressionResult, CompressionError> {
        let compressor = self.clone();
        tokio::task::spawn_blocking(move || compressor.compress(&request))
            .await
            .map_err(|e| CompressionError::TaskFailed(e.to_string()))?
    }

    /// Compresses images one after another, yielding to the scheduler between them.
    /// Results are returned in request order; one failure does not stop the batch.
    pub async fn compress_batch(
        &self,
        requests: Vec<CompressionRequest>,
    ) -> Vec<Result<CompressionResult, CompressionError>> {
        stream::iter(requests)
            .then(|request| async move {
                let result = self.compress_async(request).await;
                tokio::task::yield_now().await;
                result
            })
            .collect()
            .await
    }
}
