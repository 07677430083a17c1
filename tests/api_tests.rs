mod common;

use actix_web::{test, web, App};
use regex::Regex;
use serde_json::{json, Value};

use barangay_server::catalog::models::TemplateFormat;
use barangay_server::{account, catalog, request};
use common::{seed_account, seed_document_type, test_state};

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($state.clone()))
                .service(
                    web::scope("/api")
                        .service(
                            web::resource("/accounts")
                                .route(web::get().to(account::handlers::list_accounts))
                                .route(web::post().to(account::handlers::create_account)),
                        )
                        .service(
                            web::resource("/documents")
                                .route(web::post().to(catalog::handlers::create_document)),
                        )
                        .service(
                            web::resource("/documents/{id}/template/extract-placeholders").route(
                                web::get().to(catalog::handlers::extract_template_placeholders),
                            ),
                        )
                        .service(
                            web::resource("/documents/{id}/template")
                                .route(web::put().to(catalog::handlers::set_inline_template)),
                        )
                        .service(
                            web::resource("/request-documents/create")
                                .route(web::post().to(request::handlers::create_request_json)),
                        )
                        .service(
                            web::resource("/request-documents/status/{id}")
                                .route(web::put().to(request::handlers::change_request_status)),
                        )
                        .service(
                            web::resource("/request-documents/{id}/generate-filled-document")
                                .route(
                                    web::post().to(request::handlers::generate_filled_document),
                                ),
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
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn create_request_returns_201_with_pending_status() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": {"full_name": "Ana Cruz", "purpose": "employment"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request_document"]["status"], "pending");
    let txn = body["request_document"]["transaction_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(Regex::new(r"^TXN_DOC_\d{7}$").unwrap().is_match(&txn));

    let track = test::TestRequest::get()
        .uri(&format!("/api/track-document/{}", txn))
        .to_request();
    let tracked: Value = test::call_and_read_body_json(&app, track).await;
    assert_eq!(tracked["certificate_logs"].as_array().unwrap().len(), 1);
    assert_eq!(
        tracked["certificate_logs"][0]["remark"],
        "Document request created by requestor"
    );
}

#[actix_web::test]
async fn malformed_information_string_yields_400() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": "{broken json"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn unknown_document_type_yields_422() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({"document": 777, "requestor": account_id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn status_transitions_over_http() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": {"full_name": "Ana Cruz"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["request_document"]["id"].as_i64().unwrap();
    let txn = body["request_document"]["transaction_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Stage skip is rejected without the override flag.
    let denied = test::TestRequest::put()
        .uri(&format!("/api/request-documents/status/{}", id))
        .set_json(json!({"status": "released"}))
        .to_request();
    assert_eq!(test::call_service(&app, denied).await.status(), 422);

    let unknown = test::TestRequest::put()
        .uri(&format!("/api/request-documents/status/{}", id))
        .set_json(json!({"status": "mailed"}))
        .to_request();
    assert_eq!(test::call_service(&app, unknown).await.status(), 422);

    let overridden = test::TestRequest::put()
        .uri(&format!("/api/request-documents/status/{}", id))
        .set_json(json!({"status": "released", "admin_override": true, "staff": 1}))
        .to_request();
    let resp = test::call_service(&app, overridden).await;
    assert_eq!(resp.status(), 200);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["status"], "released");

    let track = test::TestRequest::get()
        .uri(&format!("/api/track-document/{}", txn))
        .to_request();
    let tracked: Value = test::call_and_read_body_json(&app, track).await;
    let logs = tracked["certificate_logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["remark"], "Document has been released to requestor");
    assert_eq!(tracked["status_timeline"]["released"], true);
}

#[actix_web::test]
async fn full_legal_chain_over_http() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": {"full_name": "Ana Cruz"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["request_document"]["id"].as_i64().unwrap();

    for status in ["approved", "processing", "ready to pickup", "released"] {
        let step = test::TestRequest::put()
            .uri(&format!("/api/request-documents/status/{}", id))
            .set_json(json!({"status": status, "staff": 1}))
            .to_request();
        let resp = test::call_service(&app, step).await;
        assert_eq!(resp.status(), 200, "transition to {} failed", status);
    }
}

#[actix_web::test]
async fn tracking_an_unknown_transaction_yields_404() {
    let (state, _, _) = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/track-document/TXN_DOC_0000000")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn generation_endpoint_caches_between_calls() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": {"full_name": "Ana Cruz", "purpose": "employment"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["request_document"]["id"].as_i64().unwrap();

    let generate = test::TestRequest::post()
        .uri(&format!("/api/request-documents/{}/generate-filled-document", id))
        .set_json(json!({}))
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, generate).await;
    assert_eq!(first["cached"], false);
    assert!(first["file_path"]
        .as_str()
        .unwrap()
        .starts_with("filled_documents/"));

    let again = test::TestRequest::post()
        .uri(&format!("/api/request-documents/{}/generate-filled-document", id))
        .set_json(json!({}))
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, again).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["file_path"], first["file_path"]);
}

#[actix_web::test]
async fn generation_with_missing_fields_yields_400() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/request-documents/create")
        .set_json(json!({
            "document": document_id,
            "requestor": account_id,
            "information": {"purpose": "employment"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["request_document"]["id"].as_i64().unwrap();

    let generate = test::TestRequest::post()
        .uri(&format!("/api/request-documents/{}/generate-filled-document", id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, generate).await;
    assert_eq!(resp.status(), 400);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["fields"], json!(["full_name"]));
}

#[actix_web::test]
async fn placeholder_extraction_endpoint_reads_the_inline_template() {
    let (state, _, _) = test_state();
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/documents/{}/template/extract-placeholders",
            document_id
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["placeholders"], json!(["full_name", "purpose"]));
}

#[actix_web::test]
async fn placeholder_extraction_degrades_when_the_template_file_is_gone() {
    let (state, _, _) = test_state();
    let document_id = seed_document_type(&state);
    state.clear_template(document_id).unwrap();
    state
        .set_template_file(
            document_id,
            "document_templates/vanished.docx".to_string(),
            TemplateFormat::Docx,
        )
        .unwrap();
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/documents/{}/template/extract-placeholders",
            document_id
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["placeholders"], json!([]));
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn listing_filters_and_paginates() {
    let (state, _, _) = test_state();
    let account_id = seed_account(&state);
    let document_id = seed_document_type(&state);
    let app = test_app!(state);

    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/request-documents/create")
            .set_json(json!({
                "document": document_id,
                "requestor": account_id,
                "information": {"full_name": "Ana Cruz"}
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    let list = test::TestRequest::get()
        .uri("/api/request-documents?status=pending&per_page=2&page=1")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, list).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let filtered = test::TestRequest::get()
        .uri("/api/request-documents?status=released")
        .to_request();
    let empty: Value = test::call_and_read_body_json(&app, filtered).await;
    assert_eq!(empty["total"], 0);

    let bad = test::TestRequest::get()
        .uri("/api/request-documents?status=mailed")
        .to_request();
    assert_eq!(test::call_service(&app, bad).await.status(), 422);
}
