//! Filled-document generation with a durable artifact cache.
//!
//! The cache is the `generated_document_path` pointer on the request row. A
//! pointer that resolves to an existing stored file is a hit; the pointer is
//! only advanced after the new artifact has been stored, so a failed
//! generation never invalidates a previously generated artifact.

use chrono::Utc;

use crate::db::AppState;
use crate::error::ApiError;
use crate::request::models::GeneratedArtifact;
use crate::template::{fill, TemplateSource};

pub async fn fetch_or_generate(
    state: &AppState,
    request_id: i64,
    force_regenerate: bool,
) -> Result<GeneratedArtifact, ApiError> {
    let request = state
        .get_request(request_id)
        .ok_or_else(|| ApiError::NotFound("Request document not found".to_string()))?;

    if let Some(path) = &request.generated_document_path {
        if !force_regenerate && state.storage.exists(path).await {
            return Ok(GeneratedArtifact {
                file_path: path.clone(),
                file_url: state.storage.url(path),
                cached: true,
            });
        }
        if force_regenerate {
            if let Err(e) = state.storage.delete(path).await {
                log::warn!("failed to discard stale artifact {}: {}", path, e);
            }
        }
    }

    let document = state
        .get_document_type(request.document)
        .ok_or_else(|| ApiError::NotFound("Document type not found".to_string()))?;

    let information = request.information.clone().ok_or_else(|| {
        ApiError::bad_request("Request has no information data to fill the template with")
    })?;

    let missing = fill::validate_required_fields(&document, &information);
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }

    let source = TemplateSource::resolve(&document, state.storage.as_ref()).await?;
    let artifact = fill::generate(&source, &information)?;

    // The sequence keeps filenames distinct when two generations land in the
    // same second, so a forced rebuild never reuses the previous path.
    let file_path = format!(
        "filled_documents/{}_{}_{}.{}",
        request.transaction_id,
        Utc::now().timestamp(),
        state.next_artifact_seq(),
        artifact.extension
    );
    state
        .storage
        .store(&file_path, &artifact.bytes)
        .await
        .map_err(ApiError::Storage)?;

    state.set_generated_path(request_id, file_path.clone())?;

    Ok(GeneratedArtifact {
        file_url: state.storage.url(&file_path),
        file_path,
        cached: false,
    })
}
