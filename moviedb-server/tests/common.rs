use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use image::{DynamicImage, Rgb, RgbImage};
use moviedb_core::{
    CatalogStore, InMemoryCatalogStore,
    image::{DisabledFaceDetector, FaceDetector, derive::encode_jpeg},
};
use moviedb_server::{
    AppState,
    infra::{config::Config, startup::build_state},
    routes::create_app,
};
use tempfile::TempDir;

pub const RED: [u8; 3] = [220, 20, 20];
pub const BLUE: [u8; 3] = [20, 20, 220];

// Code is used by test modules, but not in this scope
#[allow(unused)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<InMemoryCatalogStore>,
    pub public: TempDir,
}

#[allow(unused)]
impl TestApp {
    pub fn image_root(&self) -> std::path::PathBuf {
        self.public.path().join("images")
    }
}

#[allow(unused)]
pub fn solid_jpeg(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
    let image =
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)));
    encode_jpeg(&image, 95).expect("encode fixture")
}

/// Cover scan: back (red) on the left half, front (blue) on the right.
#[allow(unused)]
pub fn cover_scan_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        Rgb(if x < width / 2 { RED } else { BLUE })
    }));
    encode_jpeg(&image, 95).expect("encode fixture")
}

#[allow(unused)]
pub fn build_test_app() -> Result<TestApp> {
    build_test_app_with(
        Arc::new(InMemoryCatalogStore::new()),
        Arc::new(DisabledFaceDetector),
    )
}

#[allow(unused)]
pub fn build_test_app_with(
    store: Arc<InMemoryCatalogStore>,
    detector: Arc<dyn FaceDetector>,
) -> Result<TestApp> {
    let public = TempDir::new()?;
    let state = build_app_state(&public, store.clone(), detector)?;
    let server = TestServer::new(create_app(state.clone()))?;

    Ok(TestApp {
        server,
        state,
        store,
        public,
    })
}

/// Lay out `{public}/images` with placeholders and one cover scan.
#[allow(unused)]
pub fn build_app_state(
    public: &TempDir,
    store: Arc<dyn CatalogStore>,
    detector: Arc<dyn FaceDetector>,
) -> Result<AppState> {
    let config = Config {
        public_dir: public.path().to_path_buf(),
        catalog_in_memory: true,
        ..Config::default()
    };
    config.ensure_directories()?;

    let images = config.image_root();
    for category in ["movie", "thumbnails", "actor"] {
        std::fs::create_dir_all(images.join(category))?;
    }
    std::fs::write(
        images.join("cover_placeholder.jpg"),
        solid_jpeg(400, 568, [0, 0, 0]),
    )?;
    std::fs::write(
        images.join("thumbnail_placeholder.jpg"),
        solid_jpeg(200, 284, [30, 30, 30]),
    )?;
    std::fs::write(
        images.join("actor_placeholder.jpg"),
        solid_jpeg(300, 300, [60, 60, 60]),
    )?;
    std::fs::write(images.join("movie/alien.jpg"), cover_scan_jpeg(1000, 710))?;
    std::fs::write(images.join("actor/a.jpg"), cover_scan_jpeg(1000, 710))?;

    Ok(build_state(Arc::new(config), store, detector))
}
