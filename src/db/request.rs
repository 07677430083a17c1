//! Document request, certificate log, and upload operations.

use chrono::Utc;
use serde_json::{Map, Value};

use super::AppState;
use crate::error::ApiError;
use crate::request::models::{
    CertificateLog, DocumentRequest, RequestStatus, RequirementUpload,
};

impl AppState {
    pub fn transaction_id_exists(&self, transaction_id: &str) -> bool {
        self.requests
            .read()
            .values()
            .any(|r| r.transaction_id == transaction_id)
    }

    /// Persist a new request and its creation audit entry atomically.
    pub fn insert_request(
        &self,
        transaction_id: String,
        requestor: i64,
        document: i64,
        information: Option<Map<String, Value>>,
    ) -> DocumentRequest {
        let now = Utc::now();
        let request = DocumentRequest {
            id: self.next_request_id(),
            transaction_id,
            requestor,
            document,
            information,
            status: RequestStatus::Pending,
            generated_document_path: None,
            created_at: now,
            updated_at: now,
        };

        let mut requests = self.requests.write();
        requests.insert(request.id, request.clone());
        self.certificate_logs.write().push(CertificateLog {
            id: self.next_log_id(),
            document_request: request.id,
            staff: None,
            remark: "Document request created by requestor".to_string(),
            created_at: now,
        });
        request
    }

    pub fn get_request(&self, id: i64) -> Option<DocumentRequest> {
        self.requests.read().get(&id).cloned()
    }

    pub fn find_request_by_transaction_id(&self, transaction_id: &str) -> Option<DocumentRequest> {
        self.requests
            .read()
            .values()
            .find(|r| r.transaction_id == transaction_id)
            .cloned()
    }

    /// Validate the transition against the current row, set the new status,
    /// and append its audit entry, all under one `requests` write-lock scope.
    /// Concurrent transitions serialize in arrival order and each one is
    /// checked against the status the previous one left behind.
    pub fn apply_status_change(
        &self,
        id: i64,
        status: RequestStatus,
        staff: Option<i64>,
        remark: String,
        admin_override: bool,
    ) -> Result<DocumentRequest, ApiError> {
        let mut requests = self.requests.write();
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Request document not found".to_string()))?;

        if request.status.is_terminal() {
            return Err(ApiError::validation(format!(
                "Request is already {} and accepts no further transition",
                request.status
            )));
        }
        if !admin_override && !request.status.can_transition_to(status) {
            return Err(ApiError::validation_fields(
                format!(
                    "Transition from '{}' to '{}' is not allowed",
                    request.status, status
                ),
                vec!["status".to_string()],
            ));
        }

        request.status = status;
        request.updated_at = Utc::now();
        let updated = request.clone();

        self.certificate_logs.write().push(CertificateLog {
            id: self.next_log_id(),
            document_request: id,
            staff,
            remark,
            created_at: updated.updated_at,
        });
        Ok(updated)
    }

    pub fn logs_for_request(&self, request_id: i64) -> Vec<CertificateLog> {
        self.certificate_logs
            .read()
            .iter()
            .filter(|l| l.document_request == request_id)
            .cloned()
            .collect()
    }

    pub fn insert_upload(
        &self,
        request_document_id: i64,
        requirement: i64,
        uploader: i64,
        file_path: String,
    ) -> RequirementUpload {
        let upload = RequirementUpload {
            id: self.next_upload_id(),
            request_document_id,
            requirement,
            uploader,
            file_path,
            created_at: Utc::now(),
        };
        self.uploads.write().push(upload.clone());
        upload
    }

    pub fn uploads_for_request(&self, request_id: i64) -> Vec<RequirementUpload> {
        self.uploads
            .read()
            .iter()
            .filter(|u| u.request_document_id == request_id)
            .cloned()
            .collect()
    }

    pub fn set_generated_path(&self, id: i64, path: String) -> Result<(), ApiError> {
        let mut requests = self.requests.write();
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Request document not found".to_string()))?;
        request.generated_document_path = Some(path);
        request.updated_at = Utc::now();
        Ok(())
    }

    pub fn list_requests(
        &self,
        status: Option<RequestStatus>,
        requestor: Option<i64>,
        document: Option<i64>,
    ) -> Vec<DocumentRequest> {
        self.requests
            .read()
            .values()
            .filter(|r| status.map(|s| r.status == s).unwrap_or(true))
            .filter(|r| requestor.map(|id| r.requestor == id).unwrap_or(true))
            .filter(|r| document.map(|id| r.document == id).unwrap_or(true))
            .cloned()
            .collect()
    }
}
