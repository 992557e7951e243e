//! End-to-end tests driving the router in-process against in-memory SQLite.

use std::str::FromStr;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use bahi_api::{prepare_tenant, router, AppConfig, AppState};
use bahi_core::DEFAULT_TENANT_ID;
use bahi_db::{Database, DbConfig};

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    app: Router,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        prepare_tenant(&db, &config).await.unwrap();
        let app = router(AppState::new(db.clone(), config));
        TestApp { app, db }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    async fn add_cement(&self) {
        let (status, _) = self
            .post(
                "/stocks",
                json!({
                    "id": "cement",
                    "item": "Cement 50kg",
                    "hsn": "2523",
                    "uom": "BAG",
                    "grate": 18,
                    "rate": 100,
                    "qty": 500,
                    "batches": []
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn add_batched_syrup(&self) {
        let (status, _) = self
            .post(
                "/stocks",
                json!({
                    "id": "syrup",
                    "item": "Cough Syrup 100ml",
                    "hsn": "3004",
                    "uom": "BTL",
                    "grate": 12,
                    "rate": 60,
                    "qty": 30,
                    "batches": [
                        { "batch": "CS-01", "qty": 10, "rate": 55, "expiry": "2026-12-31", "mrp": 70 },
                        { "batch": "CS-02", "qty": 20, "rate": 62.5, "expiry": "2027-06-30" }
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn open_draft(&self) -> String {
        let (status, body) = self.post("/drafts", json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    /// Draft with the worked example: 2 × ₹100 at 10% off, 18% GST.
    async fn worked_example_draft(&self) -> String {
        self.add_cement().await;
        let id = self.open_draft().await;
        for _ in 0..2 {
            let (status, _) = self
                .post(
                    &format!("/drafts/{id}/lines"),
                    json!({ "stockId": "cement", "disc": 10 }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
        id
    }

    async fn set_buyer(&self, id: &str) {
        let (status, _) = self
            .put(
                &format!("/drafts/{id}/party"),
                json!({ "party": { "name": "Gupta Builders", "gstin": "27AAPFU0939F1ZV" } }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

/// Reads a decimal that may be serialized as a string or a number.
fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

fn d(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

// =============================================================================
// System
// =============================================================================

#[tokio::test]
async fn test_health_and_gst_status() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/system-config/gst-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gst_enabled"], true);
}

#[tokio::test]
async fn test_next_bill_number_is_a_preview() {
    let app = TestApp::new().await;

    for _ in 0..3 {
        let (status, body) = app.get("/next-bill-number").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nextBillNumber"], "INV-0001");
    }

    // Opening drafts does not consume numbers either.
    app.open_draft().await;
    app.open_draft().await;
    let (_, body) = app.get("/next-bill-number").await;
    assert_eq!(body["nextBillNumber"], "INV-0001");
}

// =============================================================================
// Drafts
// =============================================================================

#[tokio::test]
async fn test_worked_example_totals() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;

    let (status, body) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["billNo"], "INV-0001");

    let cart = body["cart"].as_array().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(dec(&cart[0]["qty"]), d("2"));

    let totals = &body["totals"];
    assert_eq!(dec(&totals["totalTaxable"]), d("180"));
    assert_eq!(dec(&totals["cgst"]), d("16.20"));
    assert_eq!(dec(&totals["sgst"]), d("16.20"));
    assert_eq!(dec(&totals["igst"]), d("0"));
    assert_eq!(dec(&totals["totalTax"]), d("32.40"));
    assert_eq!(dec(&totals["grandTotal"]), d("212.40"));
    assert_eq!(body["grandTotalDisplay"], "₹212.40");

    // Reverse charge: no tax payable.
    let (status, body) = app
        .put(
            &format!("/drafts/{id}/meta"),
            json!({ "billType": "intra-state", "reverseCharge": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totals"]["grandTotal"]), d("180"));
    assert_eq!(dec(&body["totals"]["totalTax"]), d("0"));
    // The previewed number survives a header update.
    assert_eq!(body["meta"]["billNo"], "INV-0001");
}

#[tokio::test]
async fn test_inter_state_uses_igst() {
    let app = TestApp::new().await;
    app.add_cement().await;

    let (_, body) = app
        .post("/drafts", json!({ "billType": "inter-state" }))
        .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .post(&format!("/drafts/{id}/lines"), json!({ "stockId": "cement" }))
        .await;
    let totals = &body["draft"]["totals"];
    assert_eq!(dec(&totals["igst"]), d("18"));
    assert_eq!(dec(&totals["cgst"]), d("0"));
    assert_eq!(dec(&totals["grandTotal"]), d("118"));
}

#[tokio::test]
async fn test_multi_batch_stock_requires_selection() {
    let app = TestApp::new().await;
    app.add_batched_syrup().await;
    let id = app.open_draft().await;

    let (status, body) = app
        .post(&format!("/drafts/{id}/lines"), json!({ "stockId": "syrup" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "BATCH_SELECTION_REQUIRED");
    assert_eq!(body["details"]["batches"].as_array().unwrap().len(), 2);

    // Nothing was added.
    let (_, draft) = app.get(&format!("/drafts/{id}")).await;
    assert!(draft["cart"].as_array().unwrap().is_empty());

    let (status, body) = app
        .post(
            &format!("/drafts/{id}/lines"),
            json!({ "stockId": "syrup", "batchIndex": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 0);
    let line = &body["draft"]["cart"][0];
    assert_eq!(line["batch"], "CS-02");
    assert_eq!(dec(&line["rate"]), d("62.5"));
    assert_eq!(line["expiry"], "2027-06-30");

    // Out-of-range index never falls back to batch 0.
    let (status, body) = app
        .post(
            &format!("/drafts/{id}/lines"),
            json!({ "stockId": "syrup", "batchIndex": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post(
            &format!("/drafts/{id}/lines"),
            json!({ "stockId": "syrup", "batchLabel": "CS-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 1);
}

#[tokio::test]
async fn test_update_line_coerces_input() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    let line = format!("/drafts/{id}/lines/0");

    let (status, body) = app
        .send("PATCH", &line, Some(json!({ "field": "qty", "value": "abc" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["cart"][0]["qty"]), d("0"));
    assert_eq!(dec(&body["totals"]["grandTotal"]), d("0"));

    let (_, body) = app
        .send("PATCH", &line, Some(json!({ "field": "qty", "value": 3 })))
        .await;
    assert_eq!(dec(&body["cart"][0]["qty"]), d("3"));

    let (_, body) = app
        .send("PATCH", &line, Some(json!({ "field": "disc", "value": "150" })))
        .await;
    assert_eq!(dec(&body["cart"][0]["disc"]), d("100"));

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/drafts/{id}/lines/9"),
            Some(json!({ "field": "qty", "value": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_other_charges_fold_into_totals() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;

    let (status, body) = app
        .post(
            &format!("/drafts/{id}/charges"),
            json!({ "name": "Freight", "type": "freight", "amount": 50, "gstRate": 18 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let totals = &body["draft"]["totals"];
    assert_eq!(dec(&totals["otherSubtotal"]), d("50"));
    assert_eq!(dec(&totals["otherGst"]), d("9"));
    assert_eq!(dec(&totals["cgst"]), d("20.70"));
    assert_eq!(dec(&totals["grandTotal"]), d("271.40"));

    let (status, body) = app
        .post(
            &format!("/drafts/{id}/charges"),
            json!({ "name": "Packing", "amount": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send("DELETE", &format!("/drafts/{id}/charges/0"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totals"]["grandTotal"]), d("212.40"));
}

#[tokio::test]
async fn test_clear_keeps_number_and_tax_settings() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    app.set_buyer(&id).await;

    let (status, body) = app
        .send("POST", &format!("/drafts/{id}/clear"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["cart"].as_array().unwrap().is_empty());
    assert!(body["party"].is_null());
    assert_eq!(body["meta"]["billNo"], "INV-0001");
    assert_eq!(body["meta"]["billType"], "intra-state");
}

#[tokio::test]
async fn test_suggested_bill_type_from_state_codes() {
    let config = AppConfig {
        firm_state_code: Some("29".into()),
        ..Default::default()
    };
    let app = TestApp::with_config(config).await;
    let id = app.open_draft().await;
    app.set_buyer(&id).await;

    let (_, body) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(body["suggestedBillType"], "inter-state");
}

#[tokio::test]
async fn test_bad_gstin_rejected() {
    let app = TestApp::new().await;
    let id = app.open_draft().await;

    let (status, body) = app
        .put(
            &format!("/drafts/{id}/party"),
            json!({ "party": { "name": "Shady Co", "gstin": "12345" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_draft_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/drafts/00000000-0000-0000-0000-00000000abcd")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// =============================================================================
// Commit
// =============================================================================

#[tokio::test]
async fn test_commit_validates_before_allocating() {
    let app = TestApp::new().await;
    let id = app.open_draft().await;

    let (status, body) = app
        .send("POST", &format!("/drafts/{id}/commit"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    app.add_cement().await;
    app.post(&format!("/drafts/{id}/lines"), json!({ "stockId": "cement" }))
        .await;
    let (status, body) = app
        .send("POST", &format!("/drafts/{id}/commit"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Party is required");

    // Draft kept, number not consumed.
    let (status, _) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/next-bill-number").await;
    assert_eq!(body["nextBillNumber"], "INV-0001");
}

#[tokio::test]
async fn test_commit_then_read_back() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    app.set_buyer(&id).await;
    let (_, before) = app.get(&format!("/drafts/{id}")).await;

    let (status, committed) = app
        .send("POST", &format!("/drafts/{id}/commit"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(committed["billNo"], "INV-0001");

    // The draft is closed and the counter advanced.
    let (status, _) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, next) = app.get("/next-bill-number").await;
    assert_eq!(next["nextBillNumber"], "INV-0002");

    let bill_id = committed["id"].as_str().unwrap();
    let (status, bill) = app.get(&format!("/bills/{bill_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bill["billNo"], "INV-0001");
    assert_eq!(bill["meta"]["billNo"], "INV-0001");
    assert_eq!(bill["party"]["name"], "Gupta Builders");
    assert_eq!(dec(&bill["totals"]["grandTotal"]), d("212.40"));

    let line = &bill["cart"][0];
    let original = &before["cart"][0];
    assert_eq!(line["stockId"], original["stockId"]);
    assert_eq!(line["item"], original["item"]);
    assert_eq!(dec(&line["qty"]), dec(&original["qty"]));
    assert_eq!(dec(&line["rate"]), dec(&original["rate"]));
    assert_eq!(dec(&line["disc"]), dec(&original["disc"]));
    assert_eq!(dec(&line["grate"]), dec(&original["grate"]));

    // Reopening gives an editable draft with the same totals.
    let (status, reopened) = app
        .send("POST", &format!("/bills/{bill_id}/draft"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec(&reopened["totals"]["grandTotal"]), d("212.40"));
}

#[tokio::test]
async fn test_two_commits_get_distinct_numbers() {
    let app = TestApp::new().await;
    app.add_cement().await;

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let id = app.open_draft().await;
        app.post(&format!("/drafts/{id}/lines"), json!({ "stockId": "cement" }))
            .await;
        app.set_buyer(&id).await;
        let (status, body) = app
            .send("POST", &format!("/drafts/{id}/commit"), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        numbers.push(body["billNo"].as_str().unwrap().to_string());
    }

    assert_eq!(numbers, vec!["INV-0001", "INV-0002"]);
}

#[tokio::test]
async fn test_double_commit_creates_one_bill() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    app.set_buyer(&id).await;

    let uri = format!("/drafts/{id}/commit");
    let (first, second) = tokio::join!(
        app.send("POST", &uri, None),
        app.send("POST", &uri, None)
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::NOT_FOUND]);
    assert_eq!(
        app.db
            .bills()
            .count(DEFAULT_TENANT_ID)
            .await
            .unwrap(),
        1
    );

    let (status, _) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_commit_skips_imported_bill_number() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    app.set_buyer(&id).await;

    // An imported bill already holds the number the counter hands out next.
    insert_legacy_bill(&app.db, "legacy-1", "INV-0001").await;

    let (status, body) = app
        .send("POST", &format!("/drafts/{id}/commit"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["billNo"], "INV-0002");

    let (_, next) = app.get("/next-bill-number").await;
    assert_eq!(next["nextBillNumber"], "INV-0003");
}

#[tokio::test]
async fn test_failed_commit_keeps_draft_and_writes_nothing() {
    let app = TestApp::new().await;
    let id = app.worked_example_draft().await;
    app.set_buyer(&id).await;

    // Every number the commit may try is already taken.
    for n in 1..=16 {
        insert_legacy_bill(&app.db, &format!("legacy-{n}"), &format!("INV-{n:04}")).await;
    }

    let (status, body) = app
        .send("POST", &format!("/drafts/{id}/commit"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SEQUENCING_ERROR");

    let (status, draft) = app.get(&format!("/drafts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["cart"].as_array().unwrap().len(), 1);

    let (_, next) = app.get("/next-bill-number").await;
    assert_eq!(next["nextBillNumber"], "INV-0001");
    assert_eq!(
        app.db
            .bills()
            .count(DEFAULT_TENANT_ID)
            .await
            .unwrap(),
        16
    );
}

async fn insert_legacy_bill(db: &Database, id: &str, bill_no: &str) {
    sqlx::query(
        "INSERT INTO bills (id, tenant_id, bill_no, bill_date, party_name, created_at)
         VALUES (?1, ?2, ?3, '2024-04-01', 'Old import', '2024-04-01T00:00:00Z')",
    )
    .bind(id)
    .bind(DEFAULT_TENANT_ID)
    .bind(bill_no)
    .execute(db.pool())
    .await
    .unwrap();
}

// =============================================================================
// One-shot bills
// =============================================================================

#[tokio::test]
async fn test_post_bills_recomputes_totals() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/bills",
            json!({
                "meta": { "billType": "intra-state" },
                "party": { "name": "Walk-in" },
                "cart": [{
                    "stockId": "cement",
                    "item": "Cement 50kg",
                    "qty": 2,
                    "rate": "100",
                    "grate": 18,
                    "disc": 10
                }],
                "otherCharges": [],
                "totals": { "grandTotal": "1.00" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["billNo"], "INV-0001");

    let bill_id = body["id"].as_str().unwrap();
    let (_, bill) = app.get(&format!("/bills/{bill_id}")).await;
    assert_eq!(dec(&bill["totals"]["grandTotal"]), d("212.40"));
}

#[tokio::test]
async fn test_post_bills_rejects_bad_charge() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/bills",
            json!({
                "party": { "name": "Walk-in" },
                "cart": [{ "stockId": "s", "item": "Thing", "qty": 1, "rate": 10 }],
                "otherCharges": [{ "name": "", "amount": 10 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_unknown_bill_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/bills/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
