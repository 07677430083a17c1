mod common;

use serde_json::json;

use barangay_server::request::generate::fetch_or_generate;
use barangay_server::request::lifecycle;
use barangay_server::storage::Storage;
use common::{seed_account, seed_document_type, test_state, valid_information};

#[actix_web::test]
async fn first_generation_stores_and_caches_the_artifact() {
    let (state, storage, _) = test_state();
    let account = seed_account(&state);
    let document = seed_document_type(&state);
    let created = lifecycle::create_request(
        &state,
        document,
        account,
        Some(valid_information()),
        Vec::new(),
    )
    .await
    .unwrap();
    let request = created.request_document;

    let first = fetch_or_generate(&state, request.id, false).await.unwrap();
    assert!(!first.cached);
    assert!(first.file_path.starts_with("filled_documents/"));
    assert!(first
        .file_path
        .starts_with(&format!("filled_documents/{}_", request.transaction_id)));
    assert!(first.file_path.ends_with(".pdf"));
    assert!(storage.has_file(&first.file_path));
    assert_eq!(
        state.get_request(request.id).unwrap().generated_document_path,
        Some(first.file_path.clone())
    );

    let second = fetch_or_generate(&state, request.id, false).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.file_path, first.file_path);
    assert_eq!(storage.file_count(), 1);
}

#[actix_web::test]
async fn force_regenerate_discards_and_rebuilds() {
    let (state, storage, _) = test_state();
    let account = seed_account(&state);
    let document = seed_document_type(&state);
    let created = lifecycle::create_request(
        &state,
        document,
        account,
        Some(valid_information()),
        Vec::new(),
    )
    .await
    .unwrap();
    let id = created.request_document.id;

    let first = fetch_or_generate(&state, id, false).await.unwrap();
    let forced = fetch_or_generate(&state, id, true).await.unwrap();
    assert!(!forced.cached);
    // A forced rebuild in the same second must still land on a fresh path.
    assert_ne!(forced.file_path, first.file_path);
    assert!(storage.has_file(&forced.file_path));
    assert!(!storage.has_file(&first.file_path));
    assert_eq!(storage.file_count(), 1);
    assert_eq!(
        state.get_request(id).unwrap().generated_document_path,
        Some(forced.file_path.clone())
    );
}

#[actix_web::test]
async fn missing_cached_file_triggers_regeneration() {
    let (state, storage, _) = test_state();
    let account = seed_account(&state);
    let document = seed_document_type(&state);
    let created = lifecycle::create_request(
        &state,
        document,
        account,
        Some(valid_information()),
        Vec::new(),
    )
    .await
    .unwrap();
    let id = created.request_document.id;

    let first = fetch_or_generate(&state, id, false).await.unwrap();
    storage.delete(&first.file_path).await.unwrap();

    let regenerated = fetch_or_generate(&state, id, false).await.unwrap();
    assert!(!regenerated.cached);
    assert!(storage.has_file(&regenerated.file_path));
}

#[actix_web::test]
async fn missing_required_fields_block_generation() {
    let (state, storage, _) = test_state();
    let account = seed_account(&state);
    let document = seed_document_type(&state);
    let created = lifecycle::create_request(
        &state,
        document,
        account,
        Some(json!({"purpose": "employment"})),
        Vec::new(),
    )
    .await
    .unwrap();
    let id = created.request_document.id;

    let result = fetch_or_generate(&state, id, false).await;
    assert!(result.is_err());
    assert_eq!(storage.file_count(), 0);
    assert_eq!(state.get_request(id).unwrap().generated_document_path, None);
}

#[actix_web::test]
async fn requests_without_information_cannot_generate() {
    let (state, _, _) = test_state();
    let account = seed_account(&state);
    let document = seed_document_type(&state);
    let created = lifecycle::create_request(&state, document, account, None, Vec::new())
        .await
        .unwrap();

    assert!(fetch_or_generate(&state, created.request_document.id, false)
        .await
        .is_err());
}

#[actix_web::test]
async fn unknown_request_is_not_found() {
    let (state, _, _) = test_state();
    assert!(fetch_or_generate(&state, 4242, false).await.is_err());
}
