//! AppState and store operations.
//!
//! Split into submodules mirroring the domain:
//! - `account` - requestor registry operations
//! - `catalog` - document type and requirement operations
//! - `request` - document request, certificate log, and upload operations

mod account;
mod catalog;
mod request;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::account::models::Account;
use crate::catalog::models::DocumentType;
use crate::notify::{LogNotifier, MailRelayNotifier, Notifier};
use crate::request::models::{CertificateLog, DocumentRequest, RequirementUpload};
use crate::storage::{LocalStorage, Storage, StorageConfig};

/// Shared application state.
///
/// Lock order where more than one store is touched: `requests` before
/// `certificate_logs` before `uploads`. Status changes append their audit row
/// while still holding the `requests` write lock so concurrent transitions on
/// one request serialize in arrival order.
pub struct AppState {
    pub accounts: RwLock<HashMap<i64, Account>>,
    pub documents: RwLock<HashMap<i64, DocumentType>>,
    pub requests: RwLock<HashMap<i64, DocumentRequest>>,
    pub certificate_logs: RwLock<Vec<CertificateLog>>,
    pub uploads: RwLock<Vec<RequirementUpload>>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<dyn Notifier>,
    next_account_id: AtomicI64,
    next_document_id: AtomicI64,
    next_requirement_id: AtomicI64,
    next_request_id: AtomicI64,
    next_log_id: AtomicI64,
    next_upload_id: AtomicI64,
    next_artifact_seq: AtomicI64,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
            certificate_logs: RwLock::new(Vec::new()),
            uploads: RwLock::new(Vec::new()),
            storage,
            notifier,
            next_account_id: AtomicI64::new(1),
            next_document_id: AtomicI64::new(1),
            next_requirement_id: AtomicI64::new(1),
            next_request_id: AtomicI64::new(1),
            next_log_id: AtomicI64::new(1),
            next_upload_id: AtomicI64::new(1),
            next_artifact_seq: AtomicI64::new(1),
        }
    }

    /// Construct state from environment configuration.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(StorageConfig::from_env()));

        let client = reqwest::Client::builder()
            .user_agent("barangay-server/0.4")
            .build()
            .unwrap_or_default();
        let notifier: Arc<dyn Notifier> = match MailRelayNotifier::from_env(client) {
            Some(relay) => Arc::new(relay),
            None => {
                log::info!("MAIL_RELAY_URL not set, status notifications go to the log only");
                Arc::new(LogNotifier)
            }
        };

        Self::new(storage, notifier)
    }

    pub fn next_account_id(&self) -> i64 {
        self.next_account_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_document_id(&self) -> i64 {
        self.next_document_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_requirement_id(&self) -> i64 {
        self.next_requirement_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_request_id(&self) -> i64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_log_id(&self) -> i64 {
        self.next_log_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_upload_id(&self) -> i64 {
        self.next_upload_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Monotonic sequence disambiguating artifact filenames generated within
    /// the same second.
    pub fn next_artifact_seq(&self) -> i64 {
        self.next_artifact_seq.fetch_add(1, Ordering::SeqCst)
    }
}
