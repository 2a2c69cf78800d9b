use super::models::Scheme;
use super::store::{SchemeStore, find_scheme, remove_scheme, upsert_scheme};
use crate::common::errors::ProcessingError;
use crate::test_helpers::setup_test_app;
use crate::services::models::{FieldPair, Mapping, SheetIdentifier};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

fn scheme(name: &str) -> Scheme {
    Scheme {
        name: name.to_string(),
        source_file: "orders.xlsx".to_string(),
        template_file: "import_template.xlsx".to_string(),
        source_sheet: SheetIdentifier::from("Orders"),
        template_sheet: SheetIdentifier::Index(0),
        mappings: Mapping::new(vec![
            FieldPair::new("Order No", "OrderId"),
            FieldPair::new("Customer", "CustomerName"),
        ]),
    }
}

fn temp_store() -> (SchemeStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (SchemeStore::new(dir.path().join("schemes.json")), dir)
}

#[test]
fn test_load_missing_store_is_empty() {
    let (store, _dir) = temp_store();
    assert!(store.load_all().is_empty());
}

#[test]
fn test_load_empty_and_corrupt_store_is_empty() {
    let (store, _dir) = temp_store();

    std::fs::write(store.path(), "   \n").unwrap();
    assert!(store.load_all().is_empty());

    std::fs::write(store.path(), "{ this is not json").unwrap();
    assert!(store.load_all().is_empty());

    std::fs::write(store.path(), r#"{"name":"not an array"}"#).unwrap();
    assert!(store.load_all().is_empty());
}

#[test]
fn test_load_skips_invalid_records() {
    let (store, _dir) = temp_store();
    std::fs::write(
        store.path(),
        json!([
            {"name": "Good", "mappings": [{"source": "A", "template": "X"}]},
            {"sourceFile": "nameless.xlsx"},
            42,
            {"name": "Minimal"}
        ])
        .to_string(),
    )
    .unwrap();

    let schemes = store.load_all();
    let names: Vec<&str> = schemes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Good", "Minimal"]);
    assert_eq!(schemes[1].mappings, Mapping::default());
    assert_eq!(schemes[1].source_sheet, SheetIdentifier::Index(0));
}

#[test]
fn test_load_accepts_descriptive_field_names() {
    let (store, _dir) = temp_store();
    std::fs::write(
        store.path(),
        json!([{
            "name": "Legacy",
            "sourceFileDisplayName": "in.xls",
            "templateFileDisplayName": "out.xlsx",
            "sourceSheetIdentifier": 2,
            "templateSheetIdentifier": "Import",
            "mapping": [{"source": "Qty", "template": "Quantity"}]
        }])
        .to_string(),
    )
    .unwrap();

    let schemes = store.load_all();
    assert_eq!(schemes.len(), 1);
    assert_eq!(schemes[0].source_file, "in.xls");
    assert_eq!(schemes[0].template_file, "out.xlsx");
    assert_eq!(schemes[0].source_sheet, SheetIdentifier::Index(2));
    assert_eq!(schemes[0].template_sheet, SheetIdentifier::from("Import"));
    assert_eq!(
        schemes[0].mappings,
        Mapping::new(vec![FieldPair::new("Qty", "Quantity")])
    );
}

#[test]
fn test_load_treats_null_fields_as_defaults() {
    let (store, _dir) = temp_store();
    std::fs::write(
        store.path(),
        json!([{
            "name": "Sparse",
            "sourceFile": null,
            "templateFile": "out.xlsx",
            "sourceSheet": null,
            "templateSheet": null,
            "mappings": null
        }])
        .to_string(),
    )
    .unwrap();

    let schemes = store.load_all();
    assert_eq!(schemes.len(), 1);
    assert_eq!(schemes[0].name, "Sparse");
    assert_eq!(schemes[0].source_file, "");
    assert_eq!(schemes[0].template_file, "out.xlsx");
    assert_eq!(schemes[0].source_sheet, SheetIdentifier::Index(0));
    assert_eq!(schemes[0].template_sheet, SheetIdentifier::Index(0));
    assert!(schemes[0].mappings.is_empty());

    // A later save keeps the record instead of dropping it
    store.save_all(&schemes).unwrap();
    assert_eq!(store.load_all(), schemes);
}

#[test]
fn test_save_then_load_round_trip() {
    let (store, _dir) = temp_store();
    let saved = vec![scheme("Orders"), scheme("Returns")];

    store.save_all(&saved).unwrap();
    assert_eq!(store.load_all(), saved);

    // Saving an empty collection leaves a store that loads as empty
    store.save_all(&[]).unwrap();
    assert!(store.load_all().is_empty());
}

#[test]
fn test_save_uses_original_field_names() {
    let (store, _dir) = temp_store();
    store.save_all(&[scheme("Orders")]).unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    let record = &raw[0];
    assert_eq!(record["name"], "Orders");
    assert_eq!(record["sourceFile"], "orders.xlsx");
    assert_eq!(record["sourceSheet"], "Orders");
    assert_eq!(record["templateSheet"], 0);
    assert_eq!(record["mappings"][0]["template"], "OrderId");
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = SchemeStore::new(dir.path().join("nested").join("deeper").join("schemes.json"));

    store.save_all(&[scheme("Orders")]).unwrap();
    assert_eq!(store.load_all().len(), 1);
}

#[test]
fn test_save_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    // The target path is an existing directory, so the rename cannot succeed
    let store = SchemeStore::new(dir.path());

    let err = store.save_all(&[scheme("Orders")]).unwrap_err();
    assert!(matches!(err, ProcessingError::PersistenceError { .. }));
}

#[test]
fn test_upsert_replaces_by_name() {
    let mut schemes = vec![scheme("Orders"), scheme("Returns")];

    let mut updated = scheme("Orders");
    updated.mappings = Mapping::new(vec![FieldPair::new("Total", "Amount")]);
    upsert_scheme(&mut schemes, updated.clone()).unwrap();

    assert_eq!(schemes.len(), 2);
    assert_eq!(schemes[0], updated);

    upsert_scheme(&mut schemes, scheme("  Refunds ")).unwrap();
    assert_eq!(schemes.len(), 3);
    assert_eq!(schemes[2].name, "Refunds");
}

#[test]
fn test_upsert_rejects_blank_name() {
    let mut schemes = Vec::new();
    let err = upsert_scheme(&mut schemes, scheme("   ")).unwrap_err();
    assert!(matches!(err, ProcessingError::ValidationError { .. }));
    assert!(schemes.is_empty());
}

#[test]
fn test_upsert_rejects_repeated_fields() {
    let mut schemes = vec![scheme("Orders")];

    let mut conflicting = scheme("Orders");
    conflicting.mappings = Mapping::new(vec![
        FieldPair::new("Order No", "OrderId"),
        FieldPair::new("Reference", "OrderId"),
    ]);
    let err = upsert_scheme(&mut schemes, conflicting).unwrap_err();
    assert!(matches!(err, ProcessingError::ValidationError { .. }));
    assert_eq!(schemes, vec![scheme("Orders")]);
}

#[test]
fn test_remove_and_find() {
    let mut schemes = vec![scheme("Orders"), scheme("Returns")];

    assert!(find_scheme(&schemes, "Returns").is_some());
    assert!(remove_scheme(&mut schemes, "Returns"));
    assert!(!remove_scheme(&mut schemes, "Returns"));
    assert!(find_scheme(&schemes, "Returns").is_none());
    assert_eq!(schemes.len(), 1);
}

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_scheme_endpoints_lifecycle() {
    let (app, _dir) = setup_test_app();

    let (status, body) = send(app.clone(), "GET", "/api/schemes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let payload = json!({
        "name": "ignored, path wins",
        "sourceFile": "orders.xlsx",
        "templateFile": "import.xlsx",
        "sourceSheet": 0,
        "templateSheet": "Import",
        "mappings": [{"source": "Order No", "template": "OrderId"}]
    });
    let (status, body) = send(app.clone(), "PUT", "/api/schemes/Orders", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Orders");

    let (_, body) = send(app.clone(), "GET", "/api/schemes", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["templateSheet"], "Import");

    let (status, body) = send(app.clone(), "DELETE", "/api/schemes/Orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(app, "GET", "/api/schemes", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_replace_all_schemes() {
    let (app, _dir) = setup_test_app();

    let payload = json!([{"name": "A"}, {"name": "B"}]);
    let (status, _) = send(app.clone(), "PUT", "/api/schemes", Some(payload)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(app.clone(), "GET", "/api/schemes", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(app.clone(), "PUT", "/api/schemes", Some(json!([]))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(app, "GET", "/api/schemes", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_delete_unknown_scheme_is_noop() {
    let (app, _dir) = setup_test_app();

    let (status, body) = send(app, "DELETE", "/api/schemes/Nothing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_save_scheme_with_blank_name_rejected() {
    let (app, _dir) = setup_test_app();

    let (status, body) = send(app, "PUT", "/api/schemes/%20", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_schemes_with_repeated_fields_rejected() {
    let (app, _dir) = setup_test_app();
    let mappings = json!([
        {"source": "Order No", "template": "OrderId"},
        {"source": "Order No", "template": "Reference"}
    ]);

    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/schemes/Orders",
        Some(json!({"name": "Orders", "mappings": mappings.clone()})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/schemes",
        Some(json!([{"name": "A"}, {"name": "B", "mappings": mappings}])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Nothing reached the store
    let (_, body) = send(app, "GET", "/api/schemes", None).await;
    assert_eq!(body, json!([]));
}
