//! In-memory collaborators for unit tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cloud::{AuthError, AuthProvider, AuthorizedSession, StorageUploader, UploadError};
use crate::models::Label;

/// Uploader that records calls and fails for chosen file names.
#[derive(Default)]
pub struct FakeUploader {
    fail_names: HashSet<String>,
    attempts: Mutex<usize>,
    uploaded: Mutex<Vec<(PathBuf, Label)>>,
}

impl FakeUploader {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }

    pub async fn uploaded(&self) -> Vec<(PathBuf, Label)> {
        self.uploaded.lock().await.clone()
    }
}

#[async_trait]
impl StorageUploader for FakeUploader {
    async fn upload(
        &self,
        _session: &AuthorizedSession,
        file_path: &Path,
        label: &Label,
    ) -> Result<String, UploadError> {
        *self.attempts.lock().await += 1;

        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_names.contains(&name) {
            return Err(UploadError::Api("HTTP 403: quota exceeded".to_string()));
        }

        self.uploaded
            .lock()
            .await
            .push((file_path.to_path_buf(), label.clone()));
        Ok(format!("remote-{}", name))
    }
}

/// Auth provider that accepts any code except `"bad"`.
pub struct FakeAuthProvider;

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    fn authorization_url(&self, state: &str, _code_verifier: &str) -> Result<String, AuthError> {
        Ok(format!("https://consent.example/auth?state={}", state))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<AuthorizedSession, AuthError> {
        if code == "bad" {
            return Err(AuthError::OAuth {
                error: "400 Bad Request".to_string(),
                description: "invalid_grant".to_string(),
            });
        }
        Ok(AuthorizedSession::new(format!("token-{}", code)))
    }
}

/// Pull the `state` query value out of a consent URL.
pub fn state_from(url: &str) -> String {
    url.split("state=").nth(1).unwrap_or_default().to_string()
}
