use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use costbook::server::{AppState, create_router};
use costbook::store::SqliteStore;

fn test_app() -> (TempDir, Router) {
    let temp = TempDir::new().expect("create temp dir");
    let store = SqliteStore::new(temp.path().join("test.db")).expect("open store");
    costbook::store::Store::initialize(&store).expect("initialize schema");

    let state = Arc::new(AppState {
        store: Arc::new(store),
    });
    (temp, create_router(state))
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("send request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse body")
    };
    (status, value)
}

async fn create_named(app: &Router, path: &str, name: &str) -> String {
    let (status, body) = request(app, "POST", path, Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().expect("id").to_string()
}

fn multipart_upload(uri: &str, filename: &str, content: &str) -> Request<Body> {
    let boundary = "costbook-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("build multipart request")
}

#[tokio::test]
async fn health_check() {
    let (_temp, app) = test_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn business_line_crud_round_trip() {
    let (_temp, app) = test_app();

    let id = create_named(&app, "/api/v1/business-lines", "Marketing").await;

    let (status, body) = request(&app, "GET", &format!("/api/v1/business-lines/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Marketing");

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/v1/business-lines/{id}"),
        Some(json!({"name": "Growth"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Growth");

    let (status, body) = request(&app, "GET", "/api/v1/business-lines", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = request(&app, "DELETE", &format!("/api/v1/business-lines/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(&app, "GET", &format!("/api/v1/business-lines/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_names_conflict_case_insensitively() {
    let (_temp, app) = test_app();

    create_named(&app, "/api/v1/cost-centers", "IT").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/cost-centers",
        Some(json!({"name": "it"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn association_management() {
    let (_temp, app) = test_app();

    let bl = create_named(&app, "/api/v1/business-lines", "Sales").await;
    let bl2 = create_named(&app, "/api/v1/business-lines", "Marketing").await;
    let cc = create_named(&app, "/api/v1/cost-centers", "R&D").await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/v1/cost-centers/{cc}/business-lines"),
        Some(json!({"business_line_id": bl})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    // Adding the same pair twice conflicts
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/v1/cost-centers/{cc}/business-lines"),
        Some(json!({"business_line_id": bl})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Replace the whole set
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/v1/cost-centers/{cc}/business-lines"),
        Some(json!({"business_line_ids": [bl2]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Marketing"]);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/v1/cost-centers/{cc}/business-lines/{bl2}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn entry_create_enforces_association_rule() {
    let (_temp, app) = test_app();

    let bl = create_named(&app, "/api/v1/business-lines", "Sales").await;
    let cc = create_named(&app, "/api/v1/cost-centers", "R&D").await;

    // Pair not associated yet: rejected
    let entry = json!({
        "description": "Prototype",
        "amount": 5000.0,
        "year": 2024,
        "month": 8,
        "type": "CAPEX",
        "business_line_id": bl,
        "cost_center_id": cc,
    });
    let (status, _) = request(&app, "POST", "/api/v1/budgets", Some(entry.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    request(
        &app,
        "POST",
        &format!("/api/v1/cost-centers/{cc}/business-lines"),
        Some(json!({"business_line_id": bl})),
    )
    .await;

    let (status, body) = request(&app, "POST", "/api/v1/budgets", Some(entry)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["type"], "CAPEX");
}

#[tokio::test]
async fn entry_validation_rejects_bad_fields() {
    let (_temp, app) = test_app();

    for (field, value) in [
        ("amount", json!(-10.0)),
        ("year", json!(1800)),
        ("month", json!(13)),
    ] {
        let mut entry = json!({
            "description": "Hosting",
            "amount": 100.0,
            "year": 2024,
            "month": 3,
            "type": "OPEX",
        });
        entry[field] = value;
        let (status, _) = request(&app, "POST", "/api/v1/expenses", Some(entry)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "field {field}");
    }
}

#[tokio::test]
async fn entry_list_filters_by_period() {
    let (_temp, app) = test_app();

    for month in [3, 4] {
        let (status, _) = request(
            &app,
            "POST",
            "/api/v1/expenses",
            Some(json!({
                "description": format!("Month {month}"),
                "amount": 100.0,
                "year": 2024,
                "month": month,
                "type": "OPEX",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(&app, "GET", "/api/v1/expenses?year=2024&month=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["description"], "Month 3");
}

#[tokio::test]
async fn import_endpoint_round_trip() {
    let (_temp, app) = test_app();

    let csv = "description,amount,year,month,type,source\n\
               Cloud hosting,1500,2024,3,OPEX,Budget\n\
               Office chairs,800,2024,3,CAPEX,Expense\n";
    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/imports", "entries.csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let outcome: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outcome["success"], true, "{outcome}");
    assert_eq!(
        outcome["message"],
        "Imported 1 budget entries and 1 expense entries"
    );

    let (_, budgets) = request(&app, "GET", "/api/v1/budgets", None).await;
    assert_eq!(budgets["data"].as_array().unwrap().len(), 1);
    let (_, expenses) = request(&app, "GET", "/api/v1/expenses", None).await;
    assert_eq!(expenses["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn import_endpoint_reports_validation_failure_in_band() {
    let (_temp, app) = test_app();

    let csv = "description,amount,year,month,type\nBad,-5,2024,3,OPEX\n";
    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/imports", "entries.csv", csv))
        .await
        .unwrap();
    // Validation failure is an in-band {success:false}, not an HTTP error
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let outcome: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outcome["success"], false);
    assert!(outcome["message"].as_str().unwrap().contains("Row 2:"));
}

#[tokio::test]
async fn import_endpoint_requires_file_field() {
    let (_temp, app) = test_app();

    let boundary = "costbook-test-boundary";
    let body = format!("--{boundary}--\r\n");
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/imports")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_report_aggregates_both_tables() {
    let (_temp, app) = test_app();

    let bl = create_named(&app, "/api/v1/business-lines", "Sales").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/budgets",
        Some(json!({
            "description": "Servers",
            "amount": 1000.0,
            "year": 2024,
            "month": 3,
            "type": "CAPEX",
            "business_line_id": bl,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/expenses",
        Some(json!({
            "description": "Hosting",
            "amount": 200.0,
            "year": 2024,
            "month": 3,
            "type": "OPEX",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, "GET", "/api/v1/reports/summary?year=2024", None).await;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["year"], 2024);
    assert_eq!(report["budget_months"][0]["month"], 3);
    assert_eq!(report["budget_months"][0]["capex"], 1000.0);
    assert_eq!(report["expense_months"][0]["opex"], 200.0);
    assert_eq!(report["budget_by_business_line"][0]["name"], "Sales");
    assert_eq!(report["budget_by_business_line"][0]["total"], 1000.0);
}
