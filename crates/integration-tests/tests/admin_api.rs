//! Admin API through the full router: the token gate and catalog rules.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use acsess_admin::middleware::ADMIN_COOKIE;
use acsess_admin::state::AppState;
use acsess_integration_tests::{admin_router, admin_state, insert_category, insert_product};

fn authorized(state: &AppState, method: &str, uri: &str, body: Body) -> Request<Body> {
    let token = state.tokens().issue("+79001234567").expect("issue token");
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("{ADMIN_COOKIE}={token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_api_requires_token(pool: PgPool) {
    let state = admin_state(pool);

    let response = admin_router(&state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/products")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Authorization required");

    let response = admin_router(&state)
        .oneshot(authorized(&state, "GET", "/api/admin/products", Body::empty()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, Value::Array(Vec::new()));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_tampered_token_is_rejected(pool: PgPool) {
    let state = admin_state(pool);
    let token = state.tokens().issue("+79001234567").expect("issue token");

    let response = admin_router(&state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/stats")
                .header(header::COOKIE, format!("{ADMIN_COOKIE}={token}x"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_category_with_products_is_not_deleted(pool: PgPool) {
    let state = admin_state(pool.clone());
    let category = insert_category(&pool, "Серьги").await;
    insert_product(&pool, category, "Серьги-кольца", "1200.00", 3).await;

    let uri = format!("/api/admin/categories/{category}");
    let response = admin_router(&state)
        .oneshot(authorized(&state, "DELETE", &uri, Body::empty()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let remaining = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM category WHERE id = $1")
        .bind(category)
        .fetch_one(&pool)
        .await
        .expect("count categories");
    assert_eq!(remaining, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_import_reports_rows_with_missing_columns(pool: PgPool) {
    let state = admin_state(pool.clone());
    insert_category(&pool, "Браслеты").await;

    let body = serde_json::json!({
        "products": [
            { "name": "Без цены" },
            {
                "Название товара": "Браслет из жемчуга",
                "Цена": "2 400,00",
                "Количество на складе": "4",
                "Категория": "Браслеты"
            }
        ]
    });
    let response = admin_router(&state)
        .oneshot(authorized(
            &state,
            "POST",
            "/api/admin/products/import",
            Body::from(body.to_string()),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let results = json_body(response).await["results"].clone();
    assert_eq!(results["failed"], 1);
    assert_eq!(results["created"], 1);
    let first_error = results["errors"][0].as_str().unwrap_or_default();
    assert!(first_error.contains("missing columns"), "{first_error}");

    let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM product WHERE name = $1")
        .bind("Браслет из жемчуга")
        .fetch_one(&pool)
        .await
        .expect("imported product");
    assert_eq!(stock, 4);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_import_reports_out_of_range_price_and_continues(pool: PgPool) {
    let state = admin_state(pool.clone());

    let body = serde_json::json!({
        "products": [
            { "name": "Кулон", "price": "10", "category": "Кулоны" },
            { "name": "Корона", "price": "99999999999", "category": "Короны" },
            { "ID": "500", "name": "Брошь", "price": "5", "category": "Кулоны" }
        ]
    });
    let response = admin_router(&state)
        .oneshot(authorized(
            &state,
            "POST",
            "/api/admin/products/import",
            Body::from(body.to_string()),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let results = json_body(response).await["results"].clone();
    assert_eq!(results["created"], 2);
    assert_eq!(results["failed"], 1);
    let error = results["errors"][0].as_str().unwrap_or_default();
    assert!(error.starts_with("Row 2"), "{error}");

    let kept_id = sqlx::query_scalar::<_, i32>("SELECT id FROM product WHERE name = 'Брошь'")
        .fetch_one(&pool)
        .await
        .expect("product imported under its own id");
    assert_eq!(kept_id, 500);
    let orphan = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM category WHERE name = 'Короны'")
        .fetch_one(&pool)
        .await
        .expect("count categories");
    assert_eq!(orphan, 0);

    // New products continue after the imported id.
    let category = insert_category(&pool, "Серьги").await;
    let next = insert_product(&pool, category, "Серьги-гвоздики", "700.00", 1).await;
    assert!(next.as_i32() > 500, "{next}");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_price_beyond_column_is_bad_request(pool: PgPool) {
    let state = admin_state(pool.clone());
    let category = insert_category(&pool, "Кольца").await;

    let body = serde_json::json!({
        "name": "Кольцо",
        "price": "99999999999",
        "stock": 1,
        "category_id": category.as_i32(),
    });
    let response = admin_router(&state)
        .oneshot(authorized(
            &state,
            "POST",
            "/api/admin/products",
            Body::from(body.to_string()),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_malformed_json_body_gets_json_error(pool: PgPool) {
    let state = admin_state(pool);

    let response = admin_router(&state)
        .oneshot(authorized(
            &state,
            "POST",
            "/api/admin/products",
            Body::from("{\"name\": "),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string(), "{body}");
}
