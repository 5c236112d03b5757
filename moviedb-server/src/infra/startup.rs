use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use moviedb_core::{
    CatalogService, CatalogStore, InMemoryCatalogStore, MongoCatalogStore,
    image::{
        DisabledFaceDetector, FaceCropCache, FaceCropParams, FaceDetector,
        HttpFaceDetector, ImageService,
    },
};

use crate::infra::{app_state::AppState, config::Config};

/// Connections closed once the HTTP server has drained.
#[derive(Debug, Default)]
pub struct ShutdownHandles {
    mongo: Option<MongoCatalogStore>,
}

impl ShutdownHandles {
    pub async fn close(self) {
        if let Some(mongo) = self.mongo {
            mongo.shutdown().await;
        }
    }
}

/// Open the catalog store selected by `config`.
pub async fn connect_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogStore>, ShutdownHandles)> {
    if config.catalog_in_memory {
        warn!("Using in-memory catalog; records are lost on exit");
        return Ok((
            Arc::new(InMemoryCatalogStore::new()),
            ShutdownHandles::default(),
        ));
    }

    let mongo =
        MongoCatalogStore::connect(&config.mongodb_uri, &config.mongodb_database)
            .await
            .with_context(|| {
                format!("failed to connect to MongoDB at {}", config.mongodb_uri)
            })?;
    mongo
        .ensure_indexes()
        .await
        .context("failed to create catalog indexes")?;

    Ok((
        Arc::new(mongo.clone()),
        ShutdownHandles { mongo: Some(mongo) },
    ))
}

pub fn face_detector(config: &Config) -> anyhow::Result<Arc<dyn FaceDetector>> {
    match config.face_detector_url.as_deref() {
        Some(url) => {
            info!("Face detection via {}", url);
            Ok(Arc::new(HttpFaceDetector::new(url)?))
        }
        None => {
            info!("FACE_DETECTOR_URL not set; serving cached face crops only");
            Ok(Arc::new(DisabledFaceDetector))
        }
    }
}

pub fn build_state(
    config: Arc<Config>,
    store: Arc<dyn CatalogStore>,
    detector: Arc<dyn FaceDetector>,
) -> AppState {
    let faces = Arc::new(FaceCropCache::new(detector, FaceCropParams::default()));
    let images = ImageService::new(config.image_root(), faces);
    AppState::new(CatalogService::new(store), images, config)
}
