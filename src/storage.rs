//! File storage capability.
//!
//! All uploaded requirements, templates, and generated artifacts go through
//! the [`Storage`] trait so handlers and the generator never touch the
//! filesystem directly. The default backend is a local directory served back
//! via `/storage/serve/{path}`.

use std::path::{Path, PathBuf};

use actix_web::{web, HttpResponse, Responder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::AppState;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, path: &str, data: &[u8]) -> Result<(), String>;
    async fn read(&self, path: &str) -> Result<Vec<u8>, String>;
    async fn exists(&self, path: &str) -> bool;
    async fn delete(&self, path: &str) -> Result<(), String>;
    fn url(&self, path: &str) -> String;
}

/// Configuration for the local filesystem backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    pub root: String,
    pub public_base: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string()),
            public_base: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "/storage/serve".to_string()),
        }
    }
}

pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            root: PathBuf::from(config.root),
            public_base: config.public_base.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Reject traversal segments; stored paths are always relative keys.
        let clean: PathBuf = Path::new(path)
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.root.join(clean)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, path: &str, data: &[u8]) -> Result<(), String> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create directory: {}", e))?;
        }
        tokio::fs::write(&full, data)
            .await
            .map_err(|e| format!("failed to write {}: {}", path, e))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, String> {
        tokio::fs::read(self.resolve(path))
            .await
            .map_err(|e| format!("failed to read {}: {}", path, e))
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn delete(&self, path: &str) -> Result<(), String> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .map_err(|e| format!("failed to delete {}: {}", path, e))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path)
    }
}

/// Serve a stored file back to the client with a guessed content type.
pub async fn serve_stored_file(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    let key = path.into_inner();
    match state.storage.read(&key).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&key).first_or_octet_stream();
            HttpResponse::Ok().content_type(mime.as_ref()).body(bytes)
        }
        Err(e) => {
            log::debug!("serve miss for {}: {}", key, e);
            HttpResponse::NotFound().json(crate::ErrorResponse::not_found("File not found"))
        }
    }
}

/// Build a collision-free storage key under `prefix` for an uploaded file.
pub fn unique_key(prefix: &str, original_filename: &str) -> String {
    let sanitized = sanitize_filename::sanitize(original_filename);
    format!("{}/{}_{}", prefix, uuid::Uuid::new_v4(), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keys_differ_for_same_filename() {
        let a = unique_key("requirements", "barangay id.pdf");
        let b = unique_key("requirements", "barangay id.pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("requirements/"));
        assert!(a.ends_with("barangay id.pdf") || !a.contains(".."));
    }

    #[test]
    fn resolve_strips_traversal_components() {
        let storage = LocalStorage::new(StorageConfig {
            root: "/tmp/store".to_string(),
            public_base: "/storage/serve".to_string(),
        });
        let resolved = storage.resolve("../../etc/passwd");
        assert!(resolved.starts_with("/tmp/store"));
        assert!(!resolved.to_string_lossy().contains(".."));
    }

    #[test]
    fn url_joins_public_base() {
        let storage = LocalStorage::new(StorageConfig {
            root: "./storage".to_string(),
            public_base: "/storage/serve/".to_string(),
        });
        assert_eq!(
            storage.url("filled_documents/TXN_DOC_0000001_1.pdf"),
            "/storage/serve/filled_documents/TXN_DOC_0000001_1.pdf"
        );
    }
}
