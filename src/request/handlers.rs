use actix_multipart::Multipart;
use actix_web::{
    web::{self, Path},
    HttpResponse,
};

use crate::db::AppState;
use crate::error::ApiError;
use crate::request::models::{
    ChangeStatusBody, CreateRequestBody, CreatedRequestResponse, DocumentRequest,
    GenerateBody, GeneratedArtifact, RequestListQuery, RequestPage, RequestStatus,
    RequirementUpload, TrackingProjection,
};
use crate::request::{generate, lifecycle, multipart};
use crate::storage;
use crate::ErrorResponse;

const DEFAULT_PER_PAGE: usize = 20;
const MAX_PER_PAGE: usize = 100;

/// Multipart form shape of the create route, for the API docs.
#[derive(utoipa::ToSchema)]
pub struct CreateRequestMultipartForm {
    #[allow(unused)]
    pub document: i64,
    #[allow(unused)]
    pub requestor: i64,
    /// JSON-encoded information object.
    #[allow(unused)]
    pub information: Option<String>,
}

/// Multipart form shape of the requirement upload route.
#[derive(utoipa::ToSchema)]
pub struct RequirementUploadForm {
    #[allow(unused)]
    pub requirement: i64,
    #[allow(unused)]
    pub file: Vec<u8>,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct RequirementUploadResponse {
    pub upload: RequirementUpload,
    pub file_url: String,
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    post,
    path = "/request-documents/create",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = CreatedRequestResponse),
        (status = 400, description = "Malformed information payload", body = ErrorResponse),
        (status = 422, description = "Unknown document type", body = ErrorResponse)
    )
)]
pub async fn create_request_json(
    body: web::Json<CreateRequestBody>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let created = lifecycle::create_request(
        &data,
        body.document,
        body.requestor,
        body.information,
        Vec::new(),
    )
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    post,
    path = "/request-documents/create",
    request_body(content = inline(CreateRequestMultipartForm), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Request created with requirement files", body = CreatedRequestResponse),
        (status = 400, description = "Malformed form data", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_request_multipart(
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let form = multipart::parse_create_request(payload).await?;

    let mut missing = Vec::new();
    if form.document.is_none() {
        missing.push("document".to_string());
    }
    if form.requestor.is_none() {
        missing.push("requestor".to_string());
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }
    let (document, requestor) = (form.document.unwrap_or_default(), form.requestor.unwrap_or_default());

    let information = form.information.map(serde_json::Value::String);
    let created =
        lifecycle::create_request(&data, document, requestor, information, form.files).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    get,
    path = "/request-documents",
    responses(
        (status = 200, description = "Page of requests", body = RequestPage),
        (status = 422, description = "Unknown status filter", body = ErrorResponse)
    ),
    params(
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
        ("requestor" = Option<i64>, Query, description = "Filter by requestor account"),
        ("document" = Option<i64>, Query, description = "Filter by document type"),
        ("sort_by" = Option<String>, Query, description = "created_at (default) or document"),
        ("order" = Option<String>, Query, description = "asc or desc (default)"),
        ("page" = Option<usize>, Query, description = "1-based page number"),
        ("per_page" = Option<usize>, Query, description = "Page size, capped at 100")
    )
)]
pub async fn list_requests(
    query: web::Query<RequestListQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    let status = match &query.status {
        Some(raw) => Some(RequestStatus::parse(raw).ok_or_else(|| {
            ApiError::validation_fields(
                format!("Unknown status value '{}'", raw),
                vec!["status".to_string()],
            )
        })?),
        None => None,
    };

    let mut requests = data.list_requests(status, query.requestor, query.document);

    let descending = !matches!(query.order.as_deref(), Some("asc"));
    match query.sort_by.as_deref() {
        None | Some("created_at") => {
            requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        }
        Some("document") => {
            requests.sort_by(|a, b| a.document.cmp(&b.document).then(a.id.cmp(&b.id)))
        }
        Some(other) => {
            return Err(ApiError::validation_fields(
                format!("Cannot sort by '{}'", other),
                vec!["sort_by".to_string()],
            ))
        }
    }
    if descending {
        requests.reverse();
    }

    let total = requests.len();
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = query.page.unwrap_or(1).max(1);
    let data_page: Vec<DocumentRequest> = requests
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(HttpResponse::Ok().json(RequestPage {
        data: data_page,
        total,
        page,
        per_page,
    }))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    get,
    path = "/request-documents/{id}",
    responses(
        (status = 200, description = "Request found", body = DocumentRequest),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Request document id"))
)]
pub async fn get_request_by_id(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = data
        .get_request(id.into_inner())
        .ok_or_else(|| ApiError::NotFound("Request document not found".to_string()))?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    put,
    path = "/request-documents/status/{id}",
    request_body = ChangeStatusBody,
    responses(
        (status = 200, description = "Status updated", body = DocumentRequest),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 422, description = "Unknown status or disallowed transition", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Request document id"))
)]
pub async fn change_request_status(
    id: Path<i64>,
    body: web::Json<ChangeStatusBody>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let updated = lifecycle::change_status(&data, id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    post,
    path = "/request-documents/{id}/requirements",
    request_body(content = inline(RequirementUploadForm), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Requirement file stored", body = RequirementUploadResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Request document id"))
)]
pub async fn upload_requirement(
    id: Path<i64>,
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request_id = id.into_inner();
    let request = data
        .get_request(request_id)
        .ok_or_else(|| ApiError::NotFound("Request document not found".to_string()))?;

    let (requirement_id, filename, bytes) = multipart::parse_requirement_upload(payload).await?;

    let document = data
        .get_document_type(request.document)
        .ok_or_else(|| ApiError::NotFound("Document type not found".to_string()))?;
    if !document.requirements.iter().any(|r| r.id == requirement_id) {
        return Err(ApiError::validation_fields(
            format!(
                "Requirement {} does not belong to this document type",
                requirement_id
            ),
            vec!["requirement".to_string()],
        ));
    }

    let key = storage::unique_key("requirements", &filename);
    data.storage
        .store(&key, &bytes)
        .await
        .map_err(ApiError::Storage)?;
    let upload = data.insert_upload(request_id, requirement_id, request.requestor, key);
    let file_url = data.storage.url(&upload.file_path);
    Ok(HttpResponse::Created().json(RequirementUploadResponse { upload, file_url }))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    post,
    path = "/request-documents/{id}/generate-filled-document",
    request_body = GenerateBody,
    responses(
        (status = 200, description = "Artifact available", body = GeneratedArtifact),
        (status = 400, description = "Missing required information fields", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Request document id"))
)]
pub async fn generate_filled_document(
    id: Path<i64>,
    body: Option<web::Json<GenerateBody>>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let force = body.map(|b| b.force_regenerate).unwrap_or(false);
    let artifact = generate::fetch_or_generate(&data, id.into_inner(), force).await?;
    Ok(HttpResponse::Ok().json(artifact))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Request Document Service",
    get,
    path = "/track-document/{transaction_id}",
    responses(
        (status = 200, description = "Tracking projection", body = TrackingProjection),
        (status = 404, description = "No request with this transaction id", body = ErrorResponse)
    ),
    params(("transaction_id" = String, Path, description = "Public tracking code"))
)]
pub async fn track_document(
    transaction_id: Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let projection = lifecycle::track_by_transaction_id(&data, &transaction_id.into_inner())?;
    Ok(HttpResponse::Ok().json(projection))
}
