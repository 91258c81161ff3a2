//! Integration tests for the product form, image confirmation and deletes.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use trident_admin::forms::{FormStatus, ProductForm, SubmitOutcome};
use trident_admin::services::CatalogService;
use trident_admin::store::{Collection, FieldValue, Fields};
use trident_core::{Product, UNCATEGORIZED};
use trident_integration_tests::{TestApp, TestClient, location};

const DRIVE_LINK: &str = "https://drive.google.com/file/d/1AbC_dEf/view?usp=sharing";

fn product_form<'a>(name: &'a str, price: &'a str, image: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", name),
        ("price", price),
        ("category", ""),
        ("description", "Warm white"),
        ("image", image),
        ("stock", "10"),
    ]
}

async fn products(app: &TestApp) -> Vec<Product> {
    let identity = app.identity();
    CatalogService::new(app.store.as_ref(), &identity)
        .load()
        .await
        .unwrap()
        .products
}

async fn create_product(client: &mut TestClient, name: &str) {
    let response = client.get("/products/new").await;
    assert_eq!(location(&response), Some("/products"));
    let response = client
        .post_form("/products/form", &product_form(name, "1299.5", DRIVE_LINK))
        .await;
    assert_eq!(location(&response), Some("/products"));
}

fn seed_category(app: &TestApp, id: &str, name: &str) {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), FieldValue::from(name));
    app.store.seed(Collection::Categories, id, fields);
}

// =============================================================================
// Creating
// =============================================================================

#[tokio::test]
async fn test_create_product_with_drive_link() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    create_product(&mut client, "LED Panel").await;

    let stored = products(&app).await;
    assert_eq!(stored.len(), 1);
    let product = &stored[0];
    assert_eq!(product.name, "LED Panel");
    assert!((product.price - 1299.5).abs() < f64::EPSILON);
    assert_eq!(product.stock, 10);
    assert_eq!(product.category, UNCATEGORIZED);
    assert!(product.created_at.is_some());
    assert_eq!(product.created_at, product.updated_at);

    let page = client.page("/products").await;
    assert!(page.contains("LED Panel"));
    assert!(page.contains("₹1,299.5"));
    assert!(page.contains("https://lh3.googleusercontent.com/d/1AbC_dEf"));
    assert!(page.contains("Managing 1 live products"));
    assert!(!page.contains("Register New Product"), "form closes on success");
    assert!(page.contains("Product saved"));

    let page = client.page("/products").await;
    assert!(!page.contains("Product saved"), "notice is shown once");
}

#[tokio::test]
async fn test_new_form_is_prefilled() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    let page = client.page("/products").await;

    assert!(page.contains("Register New Product"));
    assert!(page.contains("Publish Product"));
    assert!(page.contains(r#"name="stock" type="text" inputmode="numeric" value="10""#));
    assert!(page.contains("Image will appear here"));
}

#[tokio::test]
async fn test_blank_name_keeps_form_open() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    let response = client
        .post_form("/products/form", &product_form("   ", "10", DRIVE_LINK))
        .await;
    assert_eq!(location(&response), Some("/products"));

    assert!(products(&app).await.is_empty());
    let page = client.page("/products").await;
    assert!(page.contains("Product name is required"));
    assert!(page.contains("Register New Product"));
}

#[tokio::test]
async fn test_unparseable_numbers_fall_back_to_zero() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    let mut form = product_form("Lamp", "abc", DRIVE_LINK);
    form[5] = ("stock", "lots");
    client.post_form("/products/form", &form).await;

    let product = &products(&app).await[0];
    assert!(product.price.abs() < f64::EPSILON);
    assert_eq!(product.stock, 0);
}

#[tokio::test]
async fn test_blank_category_uses_first_category() {
    let app = TestApp::new();
    seed_category(&app, "c1", "Lighting");
    seed_category(&app, "c2", "Fans");
    let mut client = app.signed_in().await;

    create_product(&mut client, "Lamp").await;

    assert_eq!(products(&app).await[0].category, "Lighting");
}

// =============================================================================
// Image Link Confirmation
// =============================================================================

#[tokio::test]
async fn test_non_drive_image_needs_confirmation() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    let form = product_form("Lamp", "250", "https://example.com/lamp.jpg");
    client.post_form("/products/form", &form).await;

    assert!(products(&app).await.is_empty());
    let page = client.page("/products").await;
    assert!(page.contains("does not look like a Google Drive link"));

    // Declining goes back to the open form with nothing saved
    client
        .post_form("/products/form/confirm", &[("accept", "false")])
        .await;
    assert!(products(&app).await.is_empty());
    let page = client.page("/products").await;
    assert!(page.contains("Register New Product"));
    assert!(!page.contains("does not look like a Google Drive link"));

    // Submitting again and accepting saves the link as typed
    client.post_form("/products/form", &form).await;
    let response = client
        .post_form("/products/form/confirm", &[("accept", "true")])
        .await;
    assert_eq!(location(&response), Some("/products"));

    let stored = products(&app).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].image, "https://example.com/lamp.jpg");
}

#[tokio::test]
async fn test_confirm_without_prompt_is_rejected() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    let response = client
        .post_form("/products/form/confirm", &[("accept", "true")])
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// =============================================================================
// Editing
// =============================================================================

#[tokio::test]
async fn test_edit_without_changes_only_advances_updated_at() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;
    create_product(&mut client, "Lamp").await;
    let before = products(&app).await.remove(0);

    let response = client
        .get(&format!("/products/{}/edit", before.id))
        .await;
    assert_eq!(location(&response), Some("/products"));
    let page = client.page("/products").await;
    assert!(page.contains("Modify Product"));
    assert!(page.contains("Save Updates"));

    let price = before.price.to_string();
    let stock = before.stock.to_string();
    let form = [
        ("name", before.name.as_str()),
        ("price", price.as_str()),
        ("category", before.category.as_str()),
        ("description", before.description.as_str()),
        ("image", before.image.as_str()),
        ("stock", stock.as_str()),
    ];
    client.post_form("/products/form", &form).await;

    let after = products(&app).await.remove(0);
    assert_eq!(after.id, before.id);
    assert_eq!(after.fields(), before.fields());
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_edit_missing_product_is_not_found() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    let response = client.get("/products/nope/edit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_save_keeps_buffer_for_retry() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    app.store.set_offline(true);
    client
        .post_form("/products/form", &product_form("Lamp", "250", DRIVE_LINK))
        .await;
    app.store.set_offline(false);

    let page = client.page("/products").await;
    assert!(page.contains("Failed to save product"));
    assert!(page.contains(r#"value="Lamp""#));

    client
        .post_form("/products/form", &product_form("Lamp", "250", DRIVE_LINK))
        .await;
    assert_eq!(products(&app).await.len(), 1);
}

#[tokio::test]
async fn test_discard_closes_form() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    client.get("/products/new").await;
    let response = client.post_form("/products/form/close", &[]).await;
    assert_eq!(location(&response), Some("/products"));

    let page = client.page("/products").await;
    assert!(!page.contains("Register New Product"));
}

#[tokio::test]
async fn test_submission_in_flight_blocks_second_submit() {
    let app = TestApp::new();
    let identity = app.identity();
    let catalog = CatalogService::new(app.store.as_ref(), &identity);

    let mut form = ProductForm::new();
    form.open_new().unwrap();
    form.draft.name = "Lamp".to_string();
    form.draft.image = DRIVE_LINK.to_string();
    let SubmitOutcome::Ready(plan) = form.request_submit(&[]).unwrap() else {
        panic!("drive link needs no confirmation");
    };

    assert!(form.is_busy());
    assert!(form.request_submit(&[]).is_err());
    assert!(form.close().is_err());

    catalog.save(&plan).await.unwrap();
    form.complete(Ok(())).unwrap();
    assert_eq!(form.status, FormStatus::Closed);
    assert_eq!(products(&app).await.len(), 1);
}

#[tokio::test]
async fn test_double_submit_stores_one_product() {
    let app = TestApp::new();
    let client = app.signed_in().await;
    client.clone().get("/products/new").await;
    app.store.set_latency(Duration::from_millis(50));

    let fields = product_form("Lamp", "250", DRIVE_LINK);
    let mut first = client.clone();
    let mut second = client.clone();
    let (a, b) = tokio::join!(
        first.post_form("/products/form", &fields),
        second.post_form("/products/form", &fields),
    );

    let statuses = [a.status(), b.status()];
    assert!(statuses.contains(&StatusCode::SEE_OTHER), "{statuses:?}");
    assert!(statuses.contains(&StatusCode::CONFLICT), "{statuses:?}");
    assert_eq!(app.store.len(Collection::Products), 1);
}

#[tokio::test]
async fn test_save_finishes_after_client_disconnects() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;
    client.get("/products/new").await;
    app.store.set_latency(Duration::from_millis(100));

    // Categories take 100ms, the insert another 100ms; give up half way
    // through the insert.
    let fields = product_form("Lamp", "250", DRIVE_LINK);
    let mut impatient = client.clone();
    let abandoned = tokio::time::timeout(
        Duration::from_millis(150),
        impatient.post_form("/products/form", &fields),
    )
    .await;
    assert!(abandoned.is_err(), "request should still be saving");

    tokio::time::sleep(Duration::from_millis(300)).await;
    app.store.set_latency(Duration::ZERO);
    assert_eq!(app.store.len(Collection::Products), 1);

    let page = client.page("/products").await;
    assert!(!page.contains("Register New Product"), "form closed by the save");
    let response = client.get("/products/new").await;
    assert_eq!(location(&response), Some("/products"));
    let response = client.post_form("/products/form/close", &[]).await;
    assert_eq!(location(&response), Some("/products"));
}

// =============================================================================
// Deleting
// =============================================================================

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;
    create_product(&mut client, "Lamp").await;
    let id = products(&app).await[0].id.clone();

    client
        .post_form(&format!("/products/{id}/delete"), &[("name", "Lamp")])
        .await;
    let page = client.page("/products").await;
    assert!(page.contains("Delete this product?"));
    assert_eq!(products(&app).await.len(), 1);

    // Declined: nothing happens
    client
        .post_form("/delete/confirm", &[("accept", "false")])
        .await;
    assert_eq!(products(&app).await.len(), 1);
    assert!(!client.page("/products").await.contains("Delete this product?"));

    // Accepted: gone
    client
        .post_form(&format!("/products/{id}/delete"), &[("name", "Lamp")])
        .await;
    let response = client
        .post_form("/delete/confirm", &[("accept", "true")])
        .await;
    assert_eq!(location(&response), Some("/products"));
    assert!(products(&app).await.is_empty());
    assert!(client.page("/products").await.contains("No products found in database"));
}

#[tokio::test]
async fn test_path_like_ids_are_not_found() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;

    let response = client
        .post_form(
            "/products/x%2F..%2F..%2Fadmins%2Fadmin-uid/delete",
            &[("name", "Lamp")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get("/products/x%2F..%2Fy/edit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(!client.page("/products").await.contains("Delete this product?"));
    assert_eq!(app.store.len(Collection::Admins), 1);
}

#[tokio::test]
async fn test_failed_delete_leaves_record_and_shows_error() {
    let app = TestApp::new();
    let mut client = app.signed_in().await;
    create_product(&mut client, "Lamp").await;
    let id = products(&app).await[0].id.clone();

    client
        .post_form(&format!("/products/{id}/delete"), &[("name", "Lamp")])
        .await;
    app.store.set_offline(true);
    client
        .post_form("/delete/confirm", &[("accept", "true")])
        .await;
    app.store.set_offline(false);

    assert_eq!(products(&app).await.len(), 1);
    let page = client.page("/products").await;
    assert!(page.contains("Failed to delete:"));

    // Shown once
    assert!(!client.page("/products").await.contains("Failed to delete:"));
}
