use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Failed to allocate {kind} ids: {}", .errors.join(", "))]
    Allocation {
        kind: &'static str,
        errors: Vec<String>,
    },

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Image derivation failed: {0}")]
    Derivation(#[from] image::ImageError),

    #[error("Face detection failed: {0}")]
    FaceDetection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
