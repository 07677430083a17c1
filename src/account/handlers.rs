use actix_web::{
    web::{self, Path},
    HttpResponse,
};

use crate::account::models::{Account, CreateAccountRequest};
use crate::db::AppState;
use crate::error::ApiError;
use crate::ErrorResponse;

#[utoipa::path(
    context_path = "/api",
    tag = "Account Service",
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_account(
    body: web::Json<CreateAccountRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let mut missing = Vec::new();
    if body.first_name.trim().is_empty() {
        missing.push("first_name".to_string());
    }
    if body.last_name.trim().is_empty() {
        missing.push("last_name".to_string());
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }

    let account = data.insert_account(body.first_name, body.last_name, body.email);
    Ok(HttpResponse::Created().json(account))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Account Service",
    get,
    path = "/accounts",
    responses(
        (status = 200, description = "List of accounts", body = [Account])
    )
)]
pub async fn list_accounts(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.all_accounts()))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Account Service",
    get,
    path = "/accounts/{id}",
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Account id"))
)]
pub async fn get_account_by_id(
    id: Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let account = data
        .get_account(id.into_inner())
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;
    Ok(HttpResponse::Ok().json(account))
}
