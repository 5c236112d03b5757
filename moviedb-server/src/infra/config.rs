use anyhow::Context;
use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:6969";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Database settings
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Keep the catalog in process memory instead of MongoDB.
    pub catalog_in_memory: bool,

    // Image settings
    /// Static root; images live under `{public_dir}/images`.
    pub public_dir: PathBuf,
    pub face_detector_url: Option<String>,

    // CORS settings
    pub cors_allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Build from any key/value source; unset or unparsable keys take their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            server_host: non_empty("SERVER_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: non_empty("SERVER_PORT")
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),

            mongodb_uri: non_empty("MONGODB_URI")
                .unwrap_or_else(|| "mongodb://127.0.0.1:27017".to_string()),
            mongodb_database: non_empty("MONGODB_DATABASE")
                .unwrap_or_else(|| "moviedb".to_string()),
            catalog_in_memory: non_empty("CATALOG_IN_MEMORY")
                .and_then(|flag| flag.trim().parse().ok())
                .unwrap_or(false),

            public_dir: non_empty("PUBLIC_DIR")
                .unwrap_or_else(|| "./public".to_string())
                .into(),
            face_detector_url: non_empty("FACE_DETECTOR_URL"),

            cors_allowed_origin: non_empty("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        }
    }

    pub fn image_root(&self) -> PathBuf {
        self.public_dir.join("images")
    }

    /// `host:port` as given; resolved when the listener binds.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        // Face crops are written at runtime; the other categories are
        // populated externally.
        let faces = self.image_root().join("faces");
        std::fs::create_dir_all(&faces)
            .with_context(|| format!("creating {}", faces.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.mongodb_uri, "mongodb://127.0.0.1:27017");
        assert_eq!(config.mongodb_database, "moviedb");
        assert_eq!(config.cors_allowed_origin, "http://localhost:6969");
        assert_eq!(config.image_root(), PathBuf::from("./public/images"));
        assert!(config.face_detector_url.is_none());
        assert!(!config.catalog_in_memory);
    }

    #[test]
    fn values_are_read_from_the_source() {
        let config = config_from(&[
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9000"),
            ("MONGODB_DATABASE", "films"),
            ("PUBLIC_DIR", "/srv/www"),
            ("FACE_DETECTOR_URL", "http://faces:5000/detect"),
            ("CATALOG_IN_MEMORY", "true"),
        ]);

        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert_eq!(config.mongodb_database, "films");
        assert_eq!(config.image_root(), PathBuf::from("/srv/www/images"));
        assert_eq!(
            config.face_detector_url.as_deref(),
            Some("http://faces:5000/detect")
        );
        assert!(config.catalog_in_memory);
    }

    #[test]
    fn garbage_port_and_blank_values_fall_back() {
        let config = config_from(&[
            ("SERVER_PORT", "eighty"),
            ("FACE_DETECTOR_URL", "  "),
        ]);
        assert_eq!(config.server_port, DEFAULT_PORT);
        assert!(config.face_detector_url.is_none());
    }
}
