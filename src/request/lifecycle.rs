//! Request lifecycle manager: creation, status transitions, and tracking.

use serde_json::{Map, Value};

use crate::catalog::models::DocumentType;
use crate::db::AppState;
use crate::error::ApiError;
use crate::notify::StatusNotification;
use crate::request::models::{
    ChangeStatusBody, CreatedRequestResponse, DocumentRequest, RequestStatus, StatusTimeline,
    TrackedLog, TrackedRequestor, TrackedUpload, TrackingProjection,
};
use crate::storage;

const TRACK_DATE_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// A requirement file attached to a create or upload call.
pub struct RequirementFile {
    pub requirement_id: i64,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Decode the information payload, which may arrive as an object or as a
/// JSON-encoded string when transported via form data. Malformed JSON is
/// rejected before any persistence happens.
pub fn normalize_information(raw: Option<Value>) -> Result<Option<Map<String, Value>>, ApiError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(ApiError::bad_request(
                "Invalid JSON format for information field",
            )),
        },
        Some(_) => Err(ApiError::validation_fields(
            "information must be an object",
            vec!["information".to_string()],
        )),
    }
}

/// Generate a `TXN_DOC_` + 7-digit tracking code, retrying on collision with
/// persisted identifiers.
pub fn generate_transaction_id(state: &AppState) -> String {
    loop {
        let raw = uuid::Uuid::new_v4();
        let bytes = raw.as_bytes();
        let n = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 10_000_000;
        let candidate = format!("TXN_DOC_{:07}", n);
        if !state.transaction_id_exists(&candidate) {
            return candidate;
        }
    }
}

pub async fn create_request(
    state: &AppState,
    document_id: i64,
    requestor: i64,
    information: Option<Value>,
    files: Vec<RequirementFile>,
) -> Result<CreatedRequestResponse, ApiError> {
    let information = normalize_information(information)?;

    let document = state.get_document_type(document_id).ok_or_else(|| {
        ApiError::validation_fields("Unknown document type", vec!["document".to_string()])
    })?;

    for file in &files {
        if !document
            .requirements
            .iter()
            .any(|r| r.id == file.requirement_id)
        {
            return Err(ApiError::validation_fields(
                format!(
                    "Requirement {} does not belong to this document type",
                    file.requirement_id
                ),
                vec!["requirement_id".to_string()],
            ));
        }
    }

    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let key = storage::unique_key("requirements", &file.filename);
        state
            .storage
            .store(&key, &file.bytes)
            .await
            .map_err(ApiError::Storage)?;
        stored.push((file.requirement_id, key));
    }

    let transaction_id = generate_transaction_id(state);
    let request = state.insert_request(transaction_id, requestor, document_id, information);

    let uploads = stored
        .into_iter()
        .map(|(requirement_id, key)| state.insert_upload(request.id, requirement_id, requestor, key))
        .collect();

    notify_requestor(
        state,
        &request,
        &document,
        "Document request created by requestor",
    )
    .await;

    Ok(CreatedRequestResponse {
        message: "Request created successfully".to_string(),
        request_document: request,
        uploaded_requirements: uploads,
    })
}

pub async fn change_status(
    state: &AppState,
    request_id: i64,
    body: ChangeStatusBody,
) -> Result<DocumentRequest, ApiError> {
    let new_status = RequestStatus::parse(&body.status).ok_or_else(|| {
        ApiError::validation_fields(
            format!("Unknown status value '{}'", body.status),
            vec!["status".to_string()],
        )
    })?;

    let remark = body
        .remark
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| new_status.default_remark().to_string());

    // Terminal/table checks happen inside apply_status_change, against the
    // row as it is when the write lock is held.
    let updated = state.apply_status_change(
        request_id,
        new_status,
        body.staff,
        remark.clone(),
        body.admin_override,
    )?;

    if let Some(document) = state.get_document_type(updated.document) {
        notify_requestor(state, &updated, &document, &remark).await;
    }

    Ok(updated)
}

pub fn track_by_transaction_id(
    state: &AppState,
    transaction_id: &str,
) -> Result<TrackingProjection, ApiError> {
    let request = state
        .find_request_by_transaction_id(transaction_id)
        .ok_or_else(|| {
            ApiError::NotFound("No document found with the provided transaction ID".to_string())
        })?;

    let document = state.get_document_type(request.document);
    let account = state.get_account(request.requestor);

    let mut logs = state.logs_for_request(request.id);
    logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let certificate_logs = logs
        .into_iter()
        .map(|log| TrackedLog {
            id: log.id,
            remark: log.remark,
            staff_name: log
                .staff
                .and_then(|id| state.get_account(id))
                .map(|a| a.full_name()),
            logged_at: log.created_at.format(TRACK_DATE_FORMAT).to_string(),
        })
        .collect();

    let requirement_names: Vec<(i64, String)> = document
        .as_ref()
        .map(|d| {
            d.requirements
                .iter()
                .map(|r| (r.id, r.name.clone()))
                .collect()
        })
        .unwrap_or_default();
    let uploaded_requirements = state
        .uploads_for_request(request.id)
        .into_iter()
        .map(|upload| TrackedUpload {
            requirement_name: requirement_names
                .iter()
                .find(|(id, _)| *id == upload.requirement)
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            file_url: state.storage.url(&upload.file_path),
            uploaded_at: upload.created_at.format(TRACK_DATE_FORMAT).to_string(),
        })
        .collect();

    Ok(TrackingProjection {
        transaction_id: request.transaction_id.clone(),
        request_id: request.id,
        status: request.status,
        document_type: document
            .map(|d| d.document_name)
            .unwrap_or_else(|| "N/A".to_string()),
        requestor: TrackedRequestor {
            name: account
                .as_ref()
                .map(|a| a.full_name())
                .unwrap_or_else(|| "N/A".to_string()),
            email: account.and_then(|a| a.email),
        },
        request_date: request.created_at.format(TRACK_DATE_FORMAT).to_string(),
        last_updated: request.updated_at.format(TRACK_DATE_FORMAT).to_string(),
        certificate_logs,
        uploaded_requirements,
        status_timeline: StatusTimeline::for_status(request.status),
    })
}

/// Best-effort notification: failures are logged and never propagate into the
/// transactional result.
async fn notify_requestor(
    state: &AppState,
    request: &DocumentRequest,
    document: &DocumentType,
    remark: &str,
) {
    let Some(account) = state.get_account(request.requestor) else {
        return;
    };
    let Some(email) = account.email else {
        log::debug!(
            "requestor {} has no contact address, skipping notification",
            account.id
        );
        return;
    };

    let notification = StatusNotification {
        transaction_id: request.transaction_id.clone(),
        document_name: document.document_name.clone(),
        status: request.status.to_string(),
        remark: remark.to_string(),
    };
    if let Err(e) = state
        .notifier
        .send_status_update(&email, &notification)
        .await
    {
        log::warn!(
            "status notification for {} failed: {}",
            request.transaction_id,
            e
        );
    }
}
