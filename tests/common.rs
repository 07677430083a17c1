#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use barangay_server::catalog::models::{DocumentStatus, RequirementInput, TemplateField};
use barangay_server::db::AppState;
use barangay_server::notify::{Notifier, StatusNotification};
use barangay_server::storage::Storage;

/// In-memory storage backend for tests.
pub struct MockStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.lock().contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }

    pub fn read_sync(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn store(&self, path: &str, data: &[u8]) -> Result<(), String> {
        self.files.lock().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, String> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {}", path))
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.lock().contains_key(path)
    }

    async fn delete(&self, path: &str) -> Result<(), String> {
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| format!("no such file: {}", path))
    }

    fn url(&self, path: &str) -> String {
        format!("http://test.example.com/storage/{}", path)
    }
}

/// Notifier that records every sent notification.
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, StatusNotification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_status_update(
        &self,
        recipient: &str,
        notification: &StatusNotification,
    ) -> Result<(), String> {
        self.sent
            .lock()
            .push((recipient.to_string(), notification.clone()));
        Ok(())
    }
}

/// Notifier whose sends always fail.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_status_update(
        &self,
        _recipient: &str,
        _notification: &StatusNotification,
    ) -> Result<(), String> {
        Err("relay unavailable".to_string())
    }
}

pub fn test_state() -> (Arc<AppState>, Arc<MockStorage>, Arc<RecordingNotifier>) {
    let storage = Arc::new(MockStorage::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let state = Arc::new(AppState::new(storage.clone(), notifier.clone()));
    (state, storage, notifier)
}

pub fn seed_account(state: &AppState) -> i64 {
    state
        .insert_account(
            "Ana".to_string(),
            "Cruz".to_string(),
            Some("ana.cruz@example.com".to_string()),
        )
        .id
}

/// Document type with one requirement and an inline HTML template over a
/// two-field schema (full_name required, purpose optional).
pub fn seed_document_type(state: &AppState) -> i64 {
    let document = state
        .insert_document_type(
            "Barangay Clearance".to_string(),
            "Certifies residency and good standing".to_string(),
            DocumentStatus::Active,
            vec![RequirementInput {
                id: None,
                name: "Valid ID".to_string(),
                description: "Any government-issued ID".to_string(),
            }],
        )
        .expect("seed document type");

    let fields: Vec<TemplateField> = serde_json::from_value(json!([
        {"name": "full_name", "label": "Full Name", "type": "text", "required": true},
        {"name": "purpose", "label": "Purpose", "type": "text", "required": false}
    ]))
    .expect("field schema");

    state
        .set_inline_template(
            document.id,
            Some("<p>This certifies that {{{full_name}}} requested this for {{{purpose}}}.</p>".to_string()),
            Some(fields),
        )
        .expect("seed template");

    document.id
}

pub fn valid_information() -> serde_json::Value {
    json!({"full_name": "Ana Cruz", "purpose": "employment"})
}
