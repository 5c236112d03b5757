use std::{fmt, sync::Arc};

use moviedb_core::{CatalogService, image::ImageService};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub images: ImageService,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        catalog: CatalogService,
        images: ImageService,
        config: Arc<Config>,
    ) -> Self {
        Self {
            catalog,
            images,
            config,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
