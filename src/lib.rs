use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{guard, http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod account;
pub mod catalog;
pub mod db;
pub mod error;
pub mod notify;
pub mod request;
pub mod storage;
pub mod template;

pub use crate::db::AppState;
pub use crate::error::{ApiError, ErrorResponse};

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/"))
        .unwrap_or(false)
}

pub async fn run() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::account::handlers::create_account,
            crate::account::handlers::list_accounts,
            crate::account::handlers::get_account_by_id,
            crate::catalog::handlers::list_documents,
            crate::catalog::handlers::get_document,
            crate::catalog::handlers::create_document,
            crate::catalog::handlers::update_document,
            crate::catalog::handlers::delete_document,
            crate::catalog::handlers::upload_template,
            crate::catalog::handlers::set_inline_template,
            crate::catalog::handlers::remove_template,
            crate::catalog::handlers::extract_template_placeholders,
            crate::request::handlers::create_request_json,
            crate::request::handlers::list_requests,
            crate::request::handlers::get_request_by_id,
            crate::request::handlers::change_request_status,
            crate::request::handlers::upload_requirement,
            crate::request::handlers::generate_filled_document,
            crate::request::handlers::track_document
        ),
        components(
            schemas(
                account::models::Account,
                account::models::CreateAccountRequest,
                catalog::models::DocumentType,
                catalog::models::DocumentStatus,
                catalog::models::Requirement,
                catalog::models::RequirementInput,
                catalog::models::TemplateField,
                catalog::models::FieldKind,
                catalog::models::TemplateFormat,
                catalog::models::CreateDocumentTypeRequest,
                catalog::models::UpdateDocumentTypeRequest,
                catalog::models::InlineTemplateRequest,
                catalog::handlers::TemplateUploadResponse,
                catalog::handlers::PlaceholderResponse,
                request::models::DocumentRequest,
                request::models::RequestStatus,
                request::models::CertificateLog,
                request::models::RequirementUpload,
                request::models::CreateRequestBody,
                request::models::ChangeStatusBody,
                request::models::GenerateBody,
                request::models::GeneratedArtifact,
                request::models::CreatedRequestResponse,
                request::models::StatusTimeline,
                request::models::TrackedLog,
                request::models::TrackedUpload,
                request::models::TrackedRequestor,
                request::models::TrackingProjection,
                request::models::RequestPage,
                request::handlers::RequirementUploadResponse,
                ErrorResponse
            )
        ),
        tags(
            (name = "Account Service", description = "Requestor account endpoints."),
            (name = "Document Catalog Service", description = "Document type, requirement, and template endpoints."),
            (name = "Request Document Service", description = "Request lifecycle, generation, and tracking endpoints.")
        ),
        servers(
            (url = "http://127.0.0.1:8080", description = "Localhost server")
        )
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok();
    let app_state = web::Data::new(AppState::from_env());

    let prometheus = PrometheusMetricsBuilder::new("barangay_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("Starting server at http://{}", bind_addr);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/accounts")
                            .route(web::get().to(account::handlers::list_accounts))
                            .route(web::post().to(account::handlers::create_account)),
                    )
                    .service(
                        web::resource("/accounts/{id}")
                            .route(web::get().to(account::handlers::get_account_by_id)),
                    )
                    .service(
                        web::resource("/documents")
                            .route(web::get().to(catalog::handlers::list_documents))
                            .route(web::post().to(catalog::handlers::create_document)),
                    )
                    .service(
                        web::resource("/documents/{id}/template/extract-placeholders").route(
                            web::get().to(catalog::handlers::extract_template_placeholders),
                        ),
                    )
                    .service(
                        web::resource("/documents/{id}/template")
                            .route(web::post().to(catalog::handlers::upload_template))
                            .route(web::put().to(catalog::handlers::set_inline_template))
                            .route(web::delete().to(catalog::handlers::remove_template)),
                    )
                    .service(
                        web::resource("/documents/{id}")
                            .route(web::get().to(catalog::handlers::get_document))
                            .route(web::put().to(catalog::handlers::update_document))
                            .route(web::delete().to(catalog::handlers::delete_document)),
                    )
                    .service(
                        web::resource("/request-documents/create")
                            .route(
                                web::post()
                                    .guard(guard::fn_guard(is_multipart))
                                    .to(request::handlers::create_request_multipart),
                            )
                            .route(web::post().to(request::handlers::create_request_json)),
                    )
                    .service(
                        web::resource("/request-documents/status/{id}")
                            .route(web::put().to(request::handlers::change_request_status)),
                    )
                    .service(
                        web::resource("/request-documents/{id}/requirements")
                            .route(web::post().to(request::handlers::upload_requirement)),
                    )
                    .service(
                        web::resource("/request-documents/{id}/generate-filled-document")
                            .route(web::post().to(request::handlers::generate_filled_document)),
                    )
                    .service(
                        web::resource("/request-documents/{id}")
                            .route(web::get().to(request::handlers::get_request_by_id)),
                    )
                    .service(
                        web::resource("/request-documents")
                            .route(web::get().to(request::handlers::list_requests)),
                    )
                    .service(
                        web::resource("/track-document/{transaction_id}")
                            .route(web::get().to(request::handlers::track_document)),
                    ),
            )
            .service(
                web::resource("/storage/serve/{path:.*}")
                    .route(web::get().to(storage::serve_stored_file)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .backlog(8192)
    .max_connections(25000)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_addr)?
    .run()
    .await
}
