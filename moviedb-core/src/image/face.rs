//! Face detection port and the crop geometry around a detected face.

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, Result};

/// A detected face in pixel coordinates of the analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub score: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Every face found in the encoded image. An empty list is not an error.
    async fn detect(&self, image: &[u8]) -> Result<Vec<FaceBox>>;
}

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    faces: Vec<FaceBox>,
}

/// Detector backed by an HTTP model service.
///
/// The image is POSTed as `application/octet-stream`; the service answers
/// `{"faces":[{"x":..,"y":..,"width":..,"height":..,"score":..}]}`.
#[derive(Debug, Clone)]
pub struct HttpFaceDetector {
    client: Client,
    endpoint: Url,
}

impl HttpFaceDetector {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            CatalogError::FaceDetection(format!(
                "invalid detector url {endpoint}: {err}"
            ))
        })?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl FaceDetector for HttpFaceDetector {
    async fn detect(&self, image: &[u8]) -> Result<Vec<FaceBox>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| CatalogError::FaceDetection(err.to_string()))?;

        let body: DetectionResponse = response
            .json()
            .await
            .map_err(|err| CatalogError::FaceDetection(err.to_string()))?;

        debug!("detector returned {} faces", body.faces.len());
        Ok(body.faces)
    }
}

/// Used when no detector is configured. Only already cached crops are served.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFaceDetector;

#[async_trait]
impl FaceDetector for DisabledFaceDetector {
    async fn detect(&self, _image: &[u8]) -> Result<Vec<FaceBox>> {
        Err(CatalogError::FaceDetection(
            "face detection is not configured".into(),
        ))
    }
}

/// Highest scoring face. Boxes with non-finite geometry are ignored.
pub fn best_face(faces: &[FaceBox]) -> Option<FaceBox> {
    faces
        .iter()
        .filter(|face| {
            [face.x, face.y, face.width, face.height]
                .iter()
                .all(|v| v.is_finite())
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grow `face` by `padding` of its size (half on each side, so the origin
/// moves by half the padding) and clamp the result to the image.
pub fn face_crop_region(
    face: &FaceBox,
    image_width: u32,
    image_height: u32,
    padding: f64,
) -> Option<CropRegion> {
    if image_width == 0 || image_height == 0 {
        return None;
    }

    let pad_w = face.width * padding;
    let pad_h = face.height * padding;

    let left = (face.x - pad_w / 2.0).max(0.0).floor() as u32;
    let top = (face.y - pad_h / 2.0).max(0.0).floor() as u32;
    let width = (face.width + pad_w).max(0.0).round() as u32;
    let height = (face.height + pad_h).max(0.0).round() as u32;

    if left >= image_width || top >= image_height {
        return None;
    }

    let region = CropRegion {
        x: left,
        y: top,
        width: width.min(image_width - left),
        height: height.min(image_height - top),
    };
    (region.width > 0 && region.height > 0).then_some(region)
}
