use actix_multipart::Multipart;
use actix_web::{
    web::{self, Path},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::models::{
    CreateDocumentTypeRequest, DocumentStatus, DocumentType, InlineTemplateRequest,
    TemplateFormat, UpdateDocumentTypeRequest,
};
use crate::db::AppState;
use crate::error::ApiError;
use crate::request::multipart::parse_template_upload;
use crate::template::extract::extract_placeholders;
use crate::storage;
use crate::ErrorResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentListQuery {
    pub status: Option<DocumentStatus>,
}

/// Multipart form shape of the template upload route, for the API docs.
#[derive(ToSchema)]
pub struct TemplateUploadForm {
    #[allow(unused)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateUploadResponse {
    pub message: String,
    pub template_path: String,
    pub template_format: TemplateFormat,
    /// Placeholder names found in the uploaded template, advisory only.
    pub placeholders: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceholderResponse {
    pub placeholders: Vec<String>,
    pub count: usize,
}

impl PlaceholderResponse {
    fn new(placeholders: Vec<String>) -> Self {
        Self {
            count: placeholders.len(),
            placeholders,
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    get,
    path = "/documents",
    responses(
        (status = 200, description = "List of document types", body = [DocumentType])
    ),
    params(
        ("status" = Option<String>, Query, description = "Filter by active/inactive")
    )
)]
pub async fn list_documents(
    query: web::Query<DocumentListQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.list_document_types(query.status)))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    get,
    path = "/documents/{id}",
    responses(
        (status = 200, description = "Document type found", body = DocumentType),
        (status = 404, description = "Document type not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn get_document(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let document = data
        .get_document_type(id.into_inner())
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    Ok(HttpResponse::Ok().json(document))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    post,
    path = "/documents",
    request_body = CreateDocumentTypeRequest,
    responses(
        (status = 201, description = "Document type created", body = DocumentType),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_document(
    body: web::Json<CreateDocumentTypeRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.document_name.trim().is_empty() {
        return Err(ApiError::missing_fields(vec!["document_name".to_string()]));
    }
    let document = data.insert_document_type(
        body.document_name,
        body.description,
        body.status.unwrap_or(DocumentStatus::Active),
        body.requirements,
    )?;
    Ok(HttpResponse::Created().json(document))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    put,
    path = "/documents/{id}",
    request_body = UpdateDocumentTypeRequest,
    responses(
        (status = 200, description = "Document type updated", body = DocumentType),
        (status = 404, description = "Document type not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn update_document(
    id: Path<i64>,
    body: web::Json<UpdateDocumentTypeRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let document = data.update_document_type(
        id.into_inner(),
        body.document_name,
        body.description,
        body.status,
        body.requirements,
    )?;
    Ok(HttpResponse::Ok().json(document))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    delete,
    path = "/documents/{id}",
    responses(
        (status = 200, description = "Document type deleted", body = DocumentType),
        (status = 404, description = "Document type not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn delete_document(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let document = data.delete_document_type(id.into_inner())?;
    if let Some(path) = &document.template_path {
        if let Err(e) = data.storage.delete(path).await {
            log::warn!("failed to discard template {}: {}", path, e);
        }
    }
    Ok(HttpResponse::Ok().json(document))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    post,
    path = "/documents/{id}/template",
    request_body(content = inline(TemplateUploadForm), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Template stored", body = TemplateUploadResponse),
        (status = 404, description = "Document type not found", body = ErrorResponse),
        (status = 422, description = "Unsupported file type or size", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn upload_template(
    id: Path<i64>,
    payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let document_id = id.into_inner();
    if !data.document_type_exists(document_id) {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    let (filename, bytes) = parse_template_upload(payload).await?;
    let format = filename
        .rsplit('.')
        .next()
        .and_then(TemplateFormat::from_extension)
        .ok_or_else(|| {
            ApiError::validation(
                "Unsupported template format. Use HTML, DOCX, or PDF templates.",
            )
        })?;

    let key = storage::unique_key("document_templates", &filename);
    data.storage
        .store(&key, &bytes)
        .await
        .map_err(ApiError::Storage)?;

    let replaced = data.set_template_file(document_id, key.clone(), format)?;
    if let Some(previous) = replaced {
        if let Err(e) = data.storage.delete(&previous).await {
            log::warn!("failed to discard replaced template {}: {}", previous, e);
        }
    }

    let placeholders = extract_placeholders(&bytes, format);
    Ok(HttpResponse::Ok().json(TemplateUploadResponse {
        message: "Template uploaded successfully".to_string(),
        template_path: key,
        template_format: format,
        placeholders,
    }))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    put,
    path = "/documents/{id}/template",
    request_body = InlineTemplateRequest,
    responses(
        (status = 200, description = "Inline template and field schema updated", body = DocumentType),
        (status = 404, description = "Document type not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn set_inline_template(
    id: Path<i64>,
    body: web::Json<InlineTemplateRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let document =
        data.set_inline_template(id.into_inner(), body.html_template, body.template_fields)?;
    Ok(HttpResponse::Ok().json(document))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    delete,
    path = "/documents/{id}/template",
    responses(
        (status = 200, description = "Template removed"),
        (status = 404, description = "Document type not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn remove_template(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let discarded = data.clear_template(id.into_inner())?;
    if let Some(path) = discarded {
        if let Err(e) = data.storage.delete(&path).await {
            log::warn!("failed to discard template {}: {}", path, e);
        }
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Template removed successfully"
    })))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Catalog Service",
    get,
    path = "/documents/{id}/template/extract-placeholders",
    responses(
        (status = 200, description = "Placeholder names found in the template", body = PlaceholderResponse),
        (status = 404, description = "Document type or template not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Document type id"))
)]
pub async fn extract_template_placeholders(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let document = data
        .get_document_type(id.into_inner())
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    if let Some(markup) = &document.html_template {
        return Ok(HttpResponse::Ok().json(PlaceholderResponse::new(
            crate::template::extract::extract_from_text(markup),
        )));
    }

    let path = document
        .template_path
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("No template found for this document".to_string()))?;
    let format = document
        .template_format
        .or_else(|| {
            path.rsplit('.')
                .next()
                .and_then(TemplateFormat::from_extension)
        })
        .ok_or_else(|| {
            ApiError::validation(
                "Unsupported template format. Use HTML, DOCX, or PDF templates.",
            )
        })?;
    // Extraction is advisory: an unreadable template degrades to an empty
    // list rather than an error.
    let placeholders = match data.storage.read(path).await {
        Ok(bytes) => extract_placeholders(&bytes, format),
        Err(e) => {
            log::warn!("template {} unreadable, returning no placeholders: {}", path, e);
            Vec::new()
        }
    };
    Ok(HttpResponse::Ok().json(PlaceholderResponse::new(placeholders)))
}
