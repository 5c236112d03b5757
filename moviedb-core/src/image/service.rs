use moviedb_model::{ImageCategory, ImageDirectives};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, warn};

use crate::{
    error::{CatalogError, Result},
    image::{
        derive::{DEFAULT_QUALITY, DerivedImage, derive},
        face_cache::FaceCropCache,
    },
};

/// What the image endpoint should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The requested image (200).
    Ready(DerivedImage),
    /// The category placeholder (404).
    Placeholder(DerivedImage),
    /// Nothing to send (404, empty body).
    Unavailable,
}

/// Serves images from `{root}/{category}/{file}` with on-demand derivation.
#[derive(Debug, Clone)]
pub struct ImageService {
    root: PathBuf,
    faces: Arc<FaceCropCache>,
}

impl ImageService {
    pub fn new(root: impl Into<PathBuf>, faces: Arc<FaceCropCache>) -> Self {
        Self {
            root: root.into(),
            faces,
        }
    }

    /// Produce the image for `/images/{category}/{file}`. Errors are only
    /// returned when the placeholder itself cannot be produced.
    pub async fn render(
        &self,
        category: &str,
        file: &str,
        directives: ImageDirectives,
    ) -> Result<ImageOutcome> {
        let kind = ImageCategory::parse(category);

        match self.render_requested(&kind, category, file, directives).await {
            Ok(Some(image)) => return Ok(ImageOutcome::Ready(image)),
            Ok(None) => debug!("No image for {}/{}", category, file),
            Err(err) => debug!("Falling back for {}/{}: {}", category, file, err),
        }

        let Some(placeholder) = kind.placeholder_file() else {
            return Ok(ImageOutcome::Unavailable);
        };

        let image = self
            .derive_file(self.root.join(placeholder), directives, DEFAULT_QUALITY)
            .await
            .inspect_err(|err| {
                warn!("Placeholder {} unusable: {}", placeholder, err)
            })?;
        Ok(ImageOutcome::Placeholder(image))
    }

    async fn render_requested(
        &self,
        kind: &ImageCategory,
        category: &str,
        file: &str,
        directives: ImageDirectives,
    ) -> Result<Option<DerivedImage>> {
        if !is_safe_segment(category) || !is_safe_segment(file) {
            return Err(CatalogError::ImageNotFound(format!(
                "{category}/{file}"
            )));
        }

        if *kind == ImageCategory::Faces {
            return self.render_face(file, directives).await;
        }

        let path = self.root.join(kind.as_str()).join(file);
        self.derive_file(path, directives, DEFAULT_QUALITY)
            .await
            .map(Some)
    }

    async fn render_face(
        &self,
        file: &str,
        directives: ImageDirectives,
    ) -> Result<Option<DerivedImage>> {
        let source = self.root.join(ImageCategory::Actor.as_str()).join(file);
        let target = self.root.join(ImageCategory::Faces.as_str()).join(file);

        let Some(crop) = self.faces.face_crop(&source, &target).await? else {
            return Ok(None);
        };

        if directives == ImageDirectives::default() {
            return Ok(Some(DerivedImage::sniffed(crop.to_vec())));
        }

        let quality = self.faces.params().quality;
        let image = tokio::task::spawn_blocking(move || {
            derive(&crop, directives, quality)
        })
        .await
        .map_err(join_error)??;
        Ok(Some(image))
    }

    async fn derive_file(
        &self,
        path: PathBuf,
        directives: ImageDirectives,
        quality: u8,
    ) -> Result<DerivedImage> {
        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CatalogError::ImageNotFound(path.display().to_string())
            } else {
                err.into()
            }
        })?;

        tokio::task::spawn_blocking(move || derive(&bytes, directives, quality))
            .await
            .map_err(join_error)?
    }
}

fn join_error(err: tokio::task::JoinError) -> CatalogError {
    CatalogError::Internal(format!("image task failed: {err}"))
}

/// A single path component that cannot escape the image root.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{
        derive::{decode, encode_jpeg},
        face::{DisabledFaceDetector, FaceBox, MockFaceDetector},
        face_cache::FaceCropParams,
    };
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
    use tempfile::TempDir;

    fn solid_jpeg(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
        let image =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)));
        encode_jpeg(&image, 95).unwrap()
    }

    fn public_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for category in ["movie", "thumbnails", "actor", "faces"] {
            std::fs::create_dir_all(dir.path().join(category)).unwrap();
        }
        std::fs::write(
            dir.path().join("cover_placeholder.jpg"),
            solid_jpeg(300, 300, [0, 0, 0]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("movie/alien.jpg"),
            solid_jpeg(1000, 710, [200, 0, 0]),
        )
        .unwrap();
        dir
    }

    fn service(dir: &TempDir) -> ImageService {
        let faces = FaceCropCache::new(
            Arc::new(DisabledFaceDetector),
            FaceCropParams::default(),
        );
        ImageService::new(dir.path(), Arc::new(faces))
    }

    fn dimensions(image: &DerivedImage) -> (u32, u32) {
        decode(&image.bytes).unwrap().dimensions()
    }

    #[tokio::test]
    async fn existing_image_is_derived() {
        let dir = public_dir();
        let outcome = service(&dir)
            .render(
                "movie",
                "alien.jpg",
                ImageDirectives {
                    front: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ImageOutcome::Ready(image) = outcome else {
            panic!("expected the requested image, got {outcome:?}");
        };
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(dimensions(&image), (400, 568));
    }

    #[tokio::test]
    async fn missing_image_falls_back_to_resized_placeholder() {
        let dir = public_dir();
        let outcome = service(&dir)
            .render("movie", "missing.jpg", ImageDirectives::resize(Some(100), None))
            .await
            .unwrap();

        let ImageOutcome::Placeholder(image) = outcome else {
            panic!("expected the placeholder, got {outcome:?}");
        };
        assert_eq!(dimensions(&image), (100, 100));
    }

    #[tokio::test]
    async fn unknown_category_has_no_placeholder() {
        let dir = public_dir();
        let outcome = service(&dir)
            .render("posters", "alien.jpg", ImageDirectives::default())
            .await
            .unwrap();
        assert_eq!(outcome, ImageOutcome::Unavailable);
    }

    #[tokio::test]
    async fn traversal_segments_are_treated_as_missing() {
        let dir = public_dir();
        let service = service(&dir);

        for file in ["..", ".", "../movie/alien.jpg", "a\\b"] {
            let outcome = service
                .render("movie", file, ImageDirectives::default())
                .await
                .unwrap();
            assert!(
                matches!(outcome, ImageOutcome::Placeholder(_)),
                "{file} should not resolve"
            );
        }
    }

    #[tokio::test]
    async fn missing_placeholder_is_an_error() {
        let dir = public_dir();
        std::fs::remove_file(dir.path().join("cover_placeholder.jpg")).unwrap();

        let result = service(&dir)
            .render("movie", "missing.jpg", ImageDirectives::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn uncached_face_without_detector_is_unavailable() {
        let dir = public_dir();
        std::fs::write(
            dir.path().join("actor/ripley.jpg"),
            solid_jpeg(120, 160, [90, 90, 90]),
        )
        .unwrap();

        let outcome = service(&dir)
            .render("faces", "ripley.jpg", ImageDirectives::default())
            .await
            .unwrap();
        assert_eq!(outcome, ImageOutcome::Unavailable);
    }

    #[tokio::test]
    async fn cached_face_is_served_as_is() {
        let dir = public_dir();
        let cached = solid_jpeg(40, 40, [10, 200, 10]);
        std::fs::write(dir.path().join("faces/ripley.jpg"), &cached).unwrap();

        let outcome = service(&dir)
            .render("faces", "ripley.jpg", ImageDirectives::default())
            .await
            .unwrap();
        assert_eq!(outcome, ImageOutcome::Ready(DerivedImage::jpeg(cached)));
    }

    #[tokio::test]
    async fn face_directives_apply_to_the_crop() {
        let dir = public_dir();
        std::fs::write(
            dir.path().join("actor/ripley.jpg"),
            solid_jpeg(200, 200, [90, 90, 90]),
        )
        .unwrap();

        let mut detector = MockFaceDetector::new();
        detector.expect_detect().times(1).returning(|_| {
            Ok(vec![FaceBox {
                x: 50.0,
                y: 50.0,
                width: 100.0,
                height: 100.0,
                score: 0.9,
            }])
        });
        let faces =
            FaceCropCache::new(Arc::new(detector), FaceCropParams::default());
        let service = ImageService::new(dir.path(), Arc::new(faces));

        let outcome = service
            .render("faces", "ripley.jpg", ImageDirectives::resize(Some(20), None))
            .await
            .unwrap();

        let ImageOutcome::Ready(image) = outcome else {
            panic!("expected a face crop, got {outcome:?}");
        };
        assert_eq!(dimensions(&image), (20, 20));
        assert!(dir.path().join("faces/ripley.jpg").exists());
    }
}
