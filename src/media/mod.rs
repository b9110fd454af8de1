//! External media storage collaborator.
//!
//! The only contract: upload a file, get back a durable URL plus a
//! deletable asset id; deletes are best-effort and never fail the
//! owning operation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media upload failed: {0}")]
    Upload(String),
    #[error("media delete failed: {0}")]
    Delete(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub asset_id: String,
    /// Populated by the media host for video assets.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedAsset, MediaError>;

    async fn delete(&self, asset_id: &str) -> Result<(), MediaError>;

    /// Delete without failing the caller; a leaked asset is logged and
    /// left for the media host's own housekeeping.
    async fn delete_best_effort(&self, asset_id: &str) {
        if let Err(err) = self.delete(asset_id).await {
            warn!("Leaving orphaned media asset {}: {}", asset_id, err);
        }
    }
}

/// Client for an HTTP media host: POST /upload (multipart `file` field)
/// returning `{url, assetId, durationSecs?}`, DELETE /assets/{id}.
pub struct HttpMediaStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMediaStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedAsset, MediaError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MediaError::Upload(format!(
                "media host returned {}",
                response.status()
            )));
        }
        response
            .json::<UploadedAsset>()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))
    }

    async fn delete(&self, asset_id: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, asset_id))
            .send()
            .await
            .map_err(|e| MediaError::Delete(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MediaError::Delete(format!(
                "media host returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// In-process media store: keeps nothing but the asset ids it handed
/// out. Used when no media host is configured, and by tests.
#[derive(Default)]
pub struct InMemoryMediaStore {
    assets: Mutex<HashMap<String, String>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<UploadedAsset, MediaError> {
        let asset_id = Uuid::new_v4().to_string();
        let url = format!("mem://{}/{}", asset_id, file_name);
        self.assets
            .lock()
            .unwrap()
            .insert(asset_id.clone(), url.clone());
        Ok(UploadedAsset {
            url,
            asset_id,
            duration_secs: Some(0.0),
        })
    }

    async fn delete(&self, asset_id: &str) -> Result<(), MediaError> {
        self.assets.lock().unwrap().remove(asset_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_upload_and_delete() {
        let store = InMemoryMediaStore::new();
        let asset = store.upload("clip.mp4", vec![1, 2, 3]).await.unwrap();
        assert!(asset.url.ends_with("clip.mp4"));
        assert_eq!(store.asset_count(), 1);

        store.delete(&asset.asset_id).await.unwrap();
        assert_eq!(store.asset_count(), 0);

        // Deleting an unknown asset is not an error.
        store.delete_best_effort("missing").await;
    }
}
