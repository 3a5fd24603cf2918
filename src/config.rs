//! Configuration management for doclabel using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::ClassifierConfig;
use crate::cloud::{DriveConfig, OAuthConfig};
use crate::extraction::ExtractionConfig;
use crate::services::default_allowed_extensions;

/// Default uploads subdirectory name.
const UPLOADS_SUBDIR: &str = "uploads";

/// Default maximum request body for uploads (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

/// Application settings.
///
/// Scalar fields come before the nested sections so the whole struct can be
/// printed as TOML.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory uploads are written to.
    pub upload_dir: PathBuf,
    /// Accepted upload extensions (lowercase, no dot).
    pub allowed_extensions: Vec<String>,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
    /// Origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
    pub extraction: ExtractionConfig,
    pub classifier: ClassifierConfig,
    pub drive: DriveConfig,
    pub oauth: OAuthConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/doclabel/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("doclabel");

        Self {
            upload_dir: data_dir.join(UPLOADS_SUBDIR),
            data_dir,
            allowed_extensions: default_allowed_extensions(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: default_cors_origins(),
            extraction: ExtractionConfig::default(),
            classifier: ClassifierConfig::default(),
            drive: DriveConfig::default(),
            oauth: OAuthConfig::default().with_env_overrides(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            upload_dir: data_dir.join(UPLOADS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (path, label) in [(&self.data_dir, "data"), (&self.upload_dir, "upload")] {
            fs::create_dir_all(path).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        path.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Upload directory path (default: `<data_dir>/uploads`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<DriveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthConfig>,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers doclabel config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("doclabel").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.upload_dir = settings.data_dir.join(UPLOADS_SUBDIR);
        }
        if let Some(ref upload_dir) = self.upload_dir {
            settings.upload_dir = self.resolve_path(upload_dir, base_dir);
        }
        if let Some(ref allowed) = self.allowed_extensions {
            settings.allowed_extensions = allowed
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(ref origins) = self.cors_origins {
            settings.cors_origins = origins.clone();
        }
        if let Some(ref extraction) = self.extraction {
            settings.extraction = extraction.clone();
        }
        if let Some(ref classifier) = self.classifier {
            settings.classifier = classifier.clone();
        }
        if let Some(ref drive) = self.drive {
            settings.drive = drive.clone();
        }
        if let Some(ref oauth) = self.oauth {
            settings.oauth = oauth.clone().with_env_overrides();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (overrides the config file).
    pub data_dir: Option<PathBuf>,
}

/// Load settings from the config file (explicit or discovered) and CLI overrides.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<(Settings, Config)> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    // --data-dir takes precedence over the file
    if let Some(ref data_dir) = options.data_dir {
        let data_dir = config.resolve_path(&data_dir.to_string_lossy(), &cwd);
        if config.upload_dir.is_none() {
            settings.upload_dir = data_dir.join(UPLOADS_SUBDIR);
        }
        settings.data_dir = data_dir;
    }

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    Ok((settings, config))
}
