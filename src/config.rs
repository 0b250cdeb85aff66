//! YAML configuration for the outfit assistant.
//!
//! One file describes every layer: the embedding provider, the vector index,
//! collection names, the saved-outfit archive, and recommendation limits.
//! Every section is optional and falls back to defaults that run fully
//! offline (stub embeddings, in-memory storage).
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "my closet"
//!
//! embed:
//!   mode: "api"
//!   model_name: "clip-vit-base-patch32"
//!   api_url: "http://localhost:8000/embed"
//!   api_provider: "custom"
//!   api_timeout_secs: 30
//!
//! index:
//!   backend: "redb"
//!   redb_path: "data/outfits.redb"
//!   compression: "zstd"
//!   compression_level: 3
//!
//! collections:
//!   wardrobe: "wardrobe"
//!   marketplace: "marketplace"
//!
//! archive:
//!   backend: "sqlite"
//!   sqlite_path: "fashion.db"
//!
//! recommend:
//!   outfit_limit: 3
//!   marketplace_limit: 2
//! ```
//!
//! ## Environment overrides
//!
//! Applied after the file is parsed. A `.env` file in the working directory is
//! loaded first when present.
//!
//! | Variable                        | Field                         |
//! |---------------------------------|-------------------------------|
//! | `OUTFIT_WARDROBE_COLLECTION`    | `collections.wardrobe`        |
//! | `OUTFIT_MARKETPLACE_COLLECTION` | `collections.marketplace`     |
//! | `OUTFIT_EMBED_API_URL`          | `embed.api_url` (and `mode: api`) |
//! | `OUTFIT_EMBED_API_TOKEN`        | `embed.api_auth_header` as `Bearer <token>` |

use std::fs;
use std::path::Path;

use archive::{ArchiveError, InMemoryOutfitStore, OutfitStore, SqliteOutfitStore};
use embed::EmbedConfig;
use index::{BackendConfig, CompressionCodec, CompressionConfig, IndexConfig};
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const ENV_WARDROBE_COLLECTION: &str = "OUTFIT_WARDROBE_COLLECTION";
pub const ENV_MARKETPLACE_COLLECTION: &str = "OUTFIT_MARKETPLACE_COLLECTION";
pub const ENV_EMBED_API_URL: &str = "OUTFIT_EMBED_API_URL";
pub const ENV_EMBED_API_TOKEN: &str = "OUTFIT_EMBED_API_TOKEN";

/// Errors that can occur when loading configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for the whole assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutfitConfig {
    /// Configuration format version
    #[serde(default = "default_config_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Embedding provider
    #[serde(default = "default_embed")]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub collections: CollectionsYamlConfig,

    /// Saved-outfit storage
    #[serde(default)]
    pub archive: ArchiveYamlConfig,

    #[serde(default)]
    pub recommend: RecommendYamlConfig,
}

impl OutfitConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: OutfitConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration a process should run with: the file at
    /// `path` (or defaults), then `.env`, then process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "dotenv_loaded");
        }
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(wardrobe) = lookup(ENV_WARDROBE_COLLECTION) {
            self.collections.wardrobe = wardrobe;
        }
        if let Some(marketplace) = lookup(ENV_MARKETPLACE_COLLECTION) {
            self.collections.marketplace = marketplace;
        }
        if let Some(url) = lookup(ENV_EMBED_API_URL) {
            self.embed.mode = "api".to_string();
            self.embed.api_url = Some(url);
        }
        if let Some(token) = lookup(ENV_EMBED_API_TOKEN) {
            self.embed.api_auth_header = Some(format!("Bearer {token}"));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.embed
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        self.index.validate()?;
        self.collections.validate()?;
        self.archive.validate()?;
        self.recommend.validate()?;

        Ok(())
    }

    /// Index settings in the form the index crate consumes.
    pub fn index_config(&self) -> IndexConfig {
        let backend = match (self.index.backend.as_str(), &self.index.redb_path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        };
        let codec = match self.index.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        IndexConfig::new()
            .with_backend(backend)
            .with_compression(CompressionConfig::new(codec, self.index.compression_level))
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::new(
            self.collections.wardrobe.clone(),
            self.collections.marketplace.clone(),
        )
    }

    /// Open the configured saved-outfit store.
    pub fn open_archive(&self) -> Result<Box<dyn OutfitStore>, ArchiveError> {
        match (self.archive.backend.as_str(), &self.archive.sqlite_path) {
            ("sqlite", Some(path)) => Ok(Box::new(SqliteOutfitStore::open(path)?)),
            _ => Ok(Box::new(InMemoryOutfitStore::new())),
        }
    }
}

impl Default for OutfitConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            name: None,
            embed: default_embed(),
            index: IndexYamlConfig::default(),
            collections: CollectionsYamlConfig::default(),
            archive: ArchiveYamlConfig::default(),
            recommend: RecommendYamlConfig::default(),
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default = "default_index_backend")]
    pub backend: String,

    #[serde(default)]
    pub redb_path: Option<String>,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.redb_path.is_none() {
            return Err(ConfigLoadError::Validation(
                "index.redb_path is required when backend is 'redb'".to_string(),
            ));
        }

        let valid_codecs = ["none", "zstd"];
        if !valid_codecs.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.compression must be one of: {valid_codecs:?}"
            )));
        }

        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "index.compression_level must be within 1..=22".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            redb_path: None,
            compression: default_compression(),
            compression_level: default_compression_level(),
        }
    }
}

/// Collection names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsYamlConfig {
    #[serde(default = "default_wardrobe")]
    pub wardrobe: String,

    #[serde(default = "default_marketplace")]
    pub marketplace: String,
}

impl CollectionsYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.wardrobe.trim().is_empty() || self.marketplace.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "collections.wardrobe and collections.marketplace must not be empty".to_string(),
            ));
        }
        if self.wardrobe == self.marketplace {
            return Err(ConfigLoadError::Validation(
                "collections.wardrobe and collections.marketplace must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CollectionsYamlConfig {
    fn default() -> Self {
        Self {
            wardrobe: default_wardrobe(),
            marketplace: default_marketplace(),
        }
    }
}

/// Saved-outfit archive YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveYamlConfig {
    #[serde(default = "default_archive_backend")]
    pub backend: String,

    #[serde(default)]
    pub sqlite_path: Option<String>,
}

impl ArchiveYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "sqlite"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "archive.backend must be one of: {valid_backends:?}"
            )));
        }
        if self.backend == "sqlite" && self.sqlite_path.is_none() {
            return Err(ConfigLoadError::Validation(
                "archive.sqlite_path is required when backend is 'sqlite'".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ArchiveYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_archive_backend(),
            sqlite_path: None,
        }
    }
}

/// Recommendation limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendYamlConfig {
    /// Outfits returned per prompt. Also the size of each wardrobe pool.
    #[serde(default = "default_outfit_limit")]
    pub outfit_limit: usize,

    /// Marketplace items suggested next to an outfit or a pairing.
    #[serde(default = "default_marketplace_limit")]
    pub marketplace_limit: usize,
}

impl RecommendYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.outfit_limit == 0 {
            return Err(ConfigLoadError::Validation(
                "recommend.outfit_limit must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecommendYamlConfig {
    fn default() -> Self {
        Self {
            outfit_limit: default_outfit_limit(),
            marketplace_limit: default_marketplace_limit(),
        }
    }
}

// Helper functions for serde defaults
fn default_config_version() -> String {
    "1.0".to_string()
}
fn default_embed() -> EmbedConfig {
    EmbedConfig::default()
}
fn default_index_backend() -> String {
    "in_memory".to_string()
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}
fn default_wardrobe() -> String {
    "wardrobe".to_string()
}
fn default_marketplace() -> String {
    "marketplace".to_string()
}
fn default_archive_backend() -> String {
    "in_memory".to_string()
}
fn default_outfit_limit() -> usize {
    3
}
fn default_marketplace_limit() -> usize {
    matcher::DEFAULT_PAIRING_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = OutfitConfig::from_yaml("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.embed.mode, "stub");
        assert_eq!(config.collections.wardrobe, "wardrobe");
        assert_eq!(config.recommend.outfit_limit, 3);
        assert_eq!(config.recommend.marketplace_limit, 2);
        assert_eq!(config.index_config(), IndexConfig::new());
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1.0"
name: "closet"
embed:
  mode: "stub"
  dimension: 64
collections:
  wardrobe: "mine"
  marketplace: "shop"
recommend:
  outfit_limit: 5
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = OutfitConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("closet"));
        assert_eq!(config.embed.dimension, 64);
        assert_eq!(config.embed.model_name, EmbedConfig::default().model_name);
        assert_eq!(config.match_config(), MatchConfig::new("mine", "shop"));
        assert_eq!(config.recommend.outfit_limit, 5);
        assert_eq!(config.recommend.marketplace_limit, 2);
    }

    #[test]
    fn test_redb_requires_path() {
        let result = OutfitConfig::from_yaml("index:\n  backend: redb\n");
        assert!(result.unwrap_err().to_string().contains("redb_path"));
    }

    #[test]
    fn test_redb_backend_and_codec_mapping() {
        let yaml = r#"
index:
  backend: "redb"
  redb_path: "/tmp/outfits.redb"
  compression: "none"
"#;
        let config = OutfitConfig::from_yaml(yaml).unwrap();
        let index = config.index_config();
        assert_eq!(index.backend, BackendConfig::redb("/tmp/outfits.redb"));
        assert_eq!(index.compression.codec, CompressionCodec::None);
    }

    #[test]
    fn test_archive_validation() {
        let result = OutfitConfig::from_yaml("archive:\n  backend: sqlite\n");
        assert!(result.unwrap_err().to_string().contains("sqlite_path"));

        let result = OutfitConfig::from_yaml("archive:\n  backend: postgres\n");
        assert!(result.unwrap_err().to_string().contains("archive.backend"));
    }

    #[test]
    fn test_unsupported_version() {
        let result = OutfitConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_api_mode_without_url_rejected() {
        let result = OutfitConfig::from_yaml("embed:\n  mode: api\n");
        assert!(matches!(result, Err(ConfigLoadError::Validation(_))));
    }

    #[test]
    fn test_identical_collections_rejected() {
        let yaml = "collections:\n  wardrobe: items\n  marketplace: items\n";
        assert!(OutfitConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zero_outfit_limit_rejected() {
        let result = OutfitConfig::from_yaml("recommend:\n  outfit_limit: 0\n");
        assert!(result.unwrap_err().to_string().contains("outfit_limit"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_WARDROBE_COLLECTION, "closet"),
            (ENV_MARKETPLACE_COLLECTION, ""),
            (ENV_EMBED_API_URL, "http://localhost:8000/embed"),
            (ENV_EMBED_API_TOKEN, "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = OutfitConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.collections.wardrobe, "closet");
        // Blank values are ignored.
        assert_eq!(config.collections.marketplace, "marketplace");
        assert_eq!(config.embed.mode, "api");
        assert_eq!(
            config.embed.api_url.as_deref(),
            Some("http://localhost:8000/embed")
        );
        assert_eq!(config.embed.api_auth_header.as_deref(), Some("Bearer secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_open_archive_defaults_to_memory() {
        let store = OutfitConfig::default().open_archive().unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }
}
