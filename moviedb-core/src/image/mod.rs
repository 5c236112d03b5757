pub mod derive;
pub mod face;
pub mod face_cache;
pub mod service;

pub use derive::{DEFAULT_QUALITY, DerivedImage};
pub use face::{DisabledFaceDetector, FaceBox, FaceDetector, HttpFaceDetector};
pub use face_cache::{FaceCropCache, FaceCropParams};
pub use service::{ImageOutcome, ImageService};
