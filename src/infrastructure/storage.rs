//! Hosted object storage client.
//!
//! Thin HTTP wrapper over the storage service's object API. Signing is
//! delegated to the service; this client never mints URLs itself.

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::traits::ObjectStore;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn storage_err(e: impl std::fmt::Display) -> AppError {
    AppError::Storage(e.to_string())
}

#[derive(Serialize)]
struct SignRequest {
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    signed_url: String,
}

pub struct HostedObjectStore {
    http: reqwest::Client,
    base_url: String,
    key: String,
    bucket: String,
}

#[injectable(ObjectStore)]
impl HostedObjectStore {
    #[inject]
    pub fn create(config: Ref<Config>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build storage client");

        Self {
            http,
            base_url: config.storage_url.clone(),
            key: config.storage_key.clone(),
            bucket: config.storage_bucket.clone(),
        }
    }
}

impl HostedObjectStore {
    fn object_url(&self, path: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ObjectStore for HostedObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(self.object_url(path))
            .bearer_auth(&self.key)
            .send()
            .await
            .map_err(storage_err)?
            .error_for_status()
            .map_err(storage_err)?;

        Ok(response.bytes().await.map_err(storage_err)?.to_vec())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        self.http
            .post(self.object_url(path))
            .bearer_auth(&self.key)
            .body(bytes)
            .send()
            .await
            .map_err(storage_err)?
            .error_for_status()
            .map_err(storage_err)?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        self.http
            .delete(self.object_url(path))
            .bearer_auth(&self.key)
            .send()
            .await
            .map_err(storage_err)?
            .error_for_status()
            .map_err(storage_err)?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in: Duration) -> Result<String, AppError> {
        let url = format!("{}/object/sign/{}/{}", self.base_url, self.bucket, path);
        let response: SignResponse = self
            .http
            .post(url)
            .bearer_auth(&self.key)
            .json(&SignRequest {
                expires_in: expires_in.as_secs(),
            })
            .send()
            .await
            .map_err(storage_err)?
            .error_for_status()
            .map_err(storage_err)?
            .json()
            .await
            .map_err(storage_err)?;

        Ok(response.signed_url)
    }
}
