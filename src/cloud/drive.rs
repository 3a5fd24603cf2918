//! Google Drive upload support.
//!
//! Files are placed under `<root>/<category>/<subcategory>/`, creating the
//! folders on first use.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::AuthorizedSession;
use crate::models::Label;
use crate::utils::mime_for_path;

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Error types for upload operations.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File not found.")]
    FileNotFound,
    #[error("Authorization expired")]
    Expired,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Drive API error: {0}")]
    Api(String),
    #[error("Drive item not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Http(e.to_string())
    }
}

/// Stores one document in the user's cloud storage.
#[async_trait]
pub trait StorageUploader: Send + Sync {
    /// Upload the file at `file_path` filed under `label`, returning the
    /// storage provider's file id.
    async fn upload(
        &self,
        session: &AuthorizedSession,
        file_path: &Path,
        label: &Label,
    ) -> Result<String, UploadError>;
}

/// Drive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Folder that holds the category folders (default: My Drive root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_upload_base")]
    pub upload_base: String,
}

fn default_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}
fn default_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            root_folder_id: None,
            api_base: default_api_base(),
            upload_base: default_upload_base(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFileRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    parents: Vec<&'a str>,
}

/// Escape a value for a Drive `q` string literal.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn folder_query(name: &str, parent: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and '{}' in parents and trashed = false",
        escape_query(name),
        FOLDER_MIME,
        escape_query(parent)
    )
}

/// Folder ids resolved with one account's token.
#[derive(Debug, Default)]
struct FolderCache {
    /// Digest of the token the ids were resolved with.
    owner: Option<String>,
    /// (parent id, folder name) -> folder id
    ids: HashMap<(String, String), String>,
}

impl FolderCache {
    /// Ids usable with `token`; switching accounts starts an empty cache.
    fn for_token(&mut self, token: &str) -> &mut HashMap<(String, String), String> {
        let owner = URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()));
        if self.owner.as_deref() != Some(owner.as_str()) {
            self.ids.clear();
            self.owner = Some(owner);
        }
        &mut self.ids
    }
}

/// Google Drive uploader.
pub struct DriveUploader {
    config: DriveConfig,
    client: Client,
    folders: Mutex<FolderCache>,
}

impl DriveUploader {
    pub fn new(config: DriveConfig, client: Client) -> Self {
        Self {
            config,
            client,
            folders: Mutex::new(FolderCache::default()),
        }
    }

    fn root(&self) -> &str {
        self.config.root_folder_id.as_deref().unwrap_or("root")
    }

    async fn check(request: RequestBuilder) -> Result<reqwest::Response, UploadError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            Err(UploadError::NotFound(body))
        } else {
            Err(UploadError::Api(format!("HTTP {}: {}", status, body)))
        }
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        request: RequestBuilder,
    ) -> Result<T, UploadError> {
        Ok(Self::check(request).await?.json().await?)
    }

    /// Find or create folder `name` under `parent`.
    async fn ensure_folder(
        &self,
        token: &str,
        parent: &str,
        name: &str,
    ) -> Result<String, UploadError> {
        let key = (parent.to_string(), name.to_string());
        if let Some(id) = self.folders.lock().await.for_token(token).get(&key) {
            return Ok(id.clone());
        }

        let list: DriveFileList = Self::send_json(
            self.client
                .get(format!("{}/files", self.config.api_base))
                .bearer_auth(token)
                .query(&[
                    ("q", folder_query(name, parent).as_str()),
                    ("fields", "files(id)"),
                    ("spaces", "drive"),
                ]),
        )
        .await?;

        let id = match list.files.into_iter().next() {
            Some(existing) => existing.id,
            None => {
                debug!("Creating Drive folder {} under {}", name, parent);
                let created: DriveFileRef = Self::send_json(
                    self.client
                        .post(format!("{}/files", self.config.api_base))
                        .bearer_auth(token)
                        .query(&[("fields", "id")])
                        .json(&CreateRequest {
                            name,
                            mime_type: Some(FOLDER_MIME),
                            parents: vec![parent],
                        }),
                )
                .await?;
                created.id
            }
        };

        self.folders
            .lock()
            .await
            .for_token(token)
            .insert(key, id.clone());
        Ok(id)
    }

    /// The `<root>/<category>/<subcategory>` folder for `label`.
    async fn label_folder(&self, token: &str, label: &Label) -> Result<String, UploadError> {
        let category = self.ensure_folder(token, self.root(), &label.category).await?;
        self.ensure_folder(token, &category, &label.subcategory).await
    }

    /// Create file metadata under `parent`, returning the new file id.
    async fn create_file(&self, token: &str, name: &str, parent: &str) -> Result<String, UploadError> {
        let created: DriveFileRef = Self::send_json(
            self.client
                .post(format!("{}/files", self.config.api_base))
                .bearer_auth(token)
                .query(&[("fields", "id")])
                .json(&CreateRequest {
                    name,
                    mime_type: None,
                    parents: vec![parent],
                }),
        )
        .await?;
        Ok(created.id)
    }

    async fn delete_file(&self, token: &str, id: &str) -> Result<(), UploadError> {
        Self::check(
            self.client
                .delete(format!("{}/files/{}", self.config.api_base, id))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageUploader for DriveUploader {
    async fn upload(
        &self,
        session: &AuthorizedSession,
        file_path: &Path,
        label: &Label,
    ) -> Result<String, UploadError> {
        if session.is_expired() {
            return Err(UploadError::Expired);
        }
        let bytes = match tokio::fs::read(file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(UploadError::FileNotFound)
            }
            Err(e) => return Err(e.into()),
        };

        let token = session.bearer_token();
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let folder = self.label_folder(token, label).await?;
        let id = match self.create_file(token, &name, &folder).await {
            Err(UploadError::NotFound(_)) => {
                // A cached folder was deleted since it was looked up.
                debug!("Drive folder for {} is gone, resolving again", label);
                self.folders.lock().await.for_token(token).clear();
                let folder = self.label_folder(token, label).await?;
                self.create_file(token, &name, &folder).await?
            }
            created => created?,
        };

        let media = Self::check(
            self.client
                .patch(format!("{}/files/{}", self.config.upload_base, id))
                .bearer_auth(token)
                .query(&[("uploadType", "media"), ("fields", "id")])
                .header(reqwest::header::CONTENT_TYPE, mime_for_path(file_path))
                .body(bytes),
        )
        .await;

        if let Err(e) = media {
            // Do not leave an empty file behind.
            if let Err(cleanup) = self.delete_file(token, &id).await {
                warn!("Could not remove incomplete Drive file {}: {}", id, cleanup);
            }
            return Err(e);
        }

        info!("Uploaded {} to Drive as {} ({})", name, id, label);
        Ok(id)
    }
}
