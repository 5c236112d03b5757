//! On-disk cache of face thumbnails cut from actor portraits.
//!
//! A miss runs the detector on the portrait, crops the best face and writes
//! the JPEG next to the other cached crops. Concurrent misses for the same
//! key share one detection.

use image::GenericImageView;
use moviedb_model::DeriveMode;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::{
    error::{CatalogError, Result},
    image::{
        derive::{apply, decode, encode_jpeg},
        face::{FaceBox, FaceDetector, best_face, face_crop_region},
    },
};

/// Crop parameters; part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCropParams {
    /// Box growth as a fraction of the detected size.
    pub padding: f64,
    /// Output edge in pixels (square).
    pub edge: u32,
    pub quality: u8,
}

impl Default for FaceCropParams {
    fn default() -> Self {
        Self {
            padding: 0.1,
            edge: 40,
            quality: 80,
        }
    }
}

impl FaceCropParams {
    fn cache_key(&self, target: &Path) -> String {
        format!(
            "{}|pad={}|edge={}|q={}",
            target.display(),
            self.padding,
            self.edge,
            self.quality
        )
    }
}

type Flight = Arc<OnceCell<Option<Arc<Vec<u8>>>>>;

pub struct FaceCropCache {
    detector: Arc<dyn FaceDetector>,
    params: FaceCropParams,
    in_flight: Mutex<HashMap<String, Flight>>,
    detections: AtomicU64,
}

impl std::fmt::Debug for FaceCropCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceCropCache")
            .field("params", &self.params)
            .field("detections", &self.detections.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl FaceCropCache {
    pub fn new(detector: Arc<dyn FaceDetector>, params: FaceCropParams) -> Self {
        Self {
            detector,
            params,
            in_flight: Mutex::new(HashMap::new()),
            detections: AtomicU64::new(0),
        }
    }

    pub fn params(&self) -> FaceCropParams {
        self.params
    }

    /// Number of detector runs since start.
    pub fn detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    /// Cached crop at `target`, creating it from the portrait at `source` on a
    /// miss. `None` when the portrait is unreadable or shows no face.
    pub async fn face_crop(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<Option<Arc<Vec<u8>>>> {
        if let Some(bytes) = read_cached(target).await? {
            return Ok(Some(Arc::new(bytes)));
        }

        let key = self.params.cache_key(target);
        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let outcome = flight
            .get_or_init(|| self.create(source, target))
            .await
            .clone();

        // Later misses start a fresh flight (e.g. after the file is removed).
        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &flight))
            {
                in_flight.remove(&key);
            }
        }

        Ok(outcome)
    }

    async fn create(&self, source: &Path, target: &Path) -> Option<Arc<Vec<u8>>> {
        match self.try_create(source, target).await {
            Ok(crop) => crop.map(Arc::new),
            Err(err) => {
                debug!("No face crop for {}: {}", source.display(), err);
                None
            }
        }
    }

    async fn try_create(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<Option<Vec<u8>>> {
        let portrait = tokio::fs::read(source).await?;

        self.detections.fetch_add(1, Ordering::Relaxed);
        let faces = self.detector.detect(&portrait).await?;
        let Some(face) = best_face(&faces) else {
            debug!("No face detected in {}", source.display());
            return Ok(None);
        };

        let params = self.params;
        let crop = tokio::task::spawn_blocking(move || {
            crop_face(&portrait, &face, params)
        })
        .await
        .map_err(|err| {
            CatalogError::Internal(format!("face crop task failed: {err}"))
        })??;

        let Some(crop) = crop else {
            debug!("Face box outside of {}", source.display());
            return Ok(None);
        };

        // The crop is still served if it cannot be cached.
        match persist(target, &crop).await {
            Ok(()) => info!("Cached face crop {}", target.display()),
            Err(err) => {
                warn!("Failed to cache face crop {}: {}", target.display(), err)
            }
        }

        Ok(Some(crop))
    }
}

fn crop_face(
    portrait: &[u8],
    face: &FaceBox,
    params: FaceCropParams,
) -> Result<Option<Vec<u8>>> {
    let image = decode(portrait)?;
    let (width, height) = image.dimensions();
    let Some(region) = face_crop_region(face, width, height, params.padding)
    else {
        return Ok(None);
    };

    let face = image.crop_imm(region.x, region.y, region.width, region.height);
    let face = apply(
        &face,
        DeriveMode::Resize {
            width: Some(params.edge),
            height: Some(params.edge),
        },
    )?;
    Ok(Some(encode_jpeg(&face, params.quality)?))
}

async fn read_cached(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write through a temporary sibling so readers never see a partial file.
async fn persist(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp = temp_path(target);
    tokio::fs::write(&temp, bytes).await?;
    if let Err(err) = tokio::fs::rename(&temp, target).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}.partial", name, std::process::id()))
}
