//! Storefront checkout and registration against a real database.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::PgPool;

use acsess_core::{Email, OrderId, ProductId};
use acsess_integration_tests::{insert_category, insert_product, stock_of};
use acsess_storefront::db::UserRepository;
use acsess_storefront::services::{
    AuthError, AuthService, CheckoutService, OrderError, OrderForm, Registration,
};

const PHONE: &str = "+7 (900) 765-43-21";

fn form(items: Vec<(ProductId, i64)>, address: Option<&'static str>) -> OrderForm<'static> {
    OrderForm {
        customer_name: "Мария",
        customer_email: None,
        customer_phone: PHONE,
        customer_address: address,
        items,
    }
}

async fn count(pool: &PgPool, sql: &str, order: OrderId) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(order)
        .fetch_one(pool)
        .await
        .expect("count rows")
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_insufficient_stock_writes_nothing(pool: PgPool) {
    let category = insert_category(&pool, "Кольца").await;
    let plenty = insert_product(&pool, category, "Кольцо с опалом", "3500.00", 10).await;
    let scarce = insert_product(&pool, category, "Кольцо с гранатом", "4100.00", 1).await;

    let order = form(vec![(plenty, 2), (scarce, 2)], None)
        .validate()
        .expect("valid form");
    let err = CheckoutService::new(&pool)
        .place(&order)
        .await
        .expect_err("not enough stock");

    assert!(
        matches!(err, OrderError::InsufficientStock { available: 1, requested: 2, .. }),
        "{err:?}"
    );
    assert_eq!(stock_of(&pool, plenty).await, 10);
    assert_eq!(stock_of(&pool, scarce).await, 1);

    let orders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customer_order")
        .fetch_one(&pool)
        .await
        .expect("count orders");
    assert_eq!(orders, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_reserves_stock_and_records_everything(pool: PgPool) {
    let category = insert_category(&pool, "Подвески").await;
    let pendant = insert_product(&pool, category, "Подвеска-капля", "1250.50", 5).await;
    let chain = insert_product(&pool, category, "Цепочка", "800.00", 3).await;

    let order = form(
        vec![(pendant, 1), (chain, 2), (pendant, 1)],
        Some("Казань, ул. Баумана, 1"),
    )
    .validate()
    .expect("valid form");
    let placed = CheckoutService::new(&pool)
        .place(&order)
        .await
        .expect("order placed");

    assert_eq!(
        placed.total.amount(),
        Decimal::from_str("4101.00").expect("decimal")
    );
    assert_eq!(stock_of(&pool, pendant).await, 3);
    assert_eq!(stock_of(&pool, chain).await, 1);

    let items = count(
        &pool,
        "SELECT COUNT(*) FROM order_item WHERE order_id = $1",
        placed.order_id,
    )
    .await;
    assert_eq!(items, 2);
    let deliveries = count(
        &pool,
        "SELECT COUNT(*) FROM delivery WHERE order_id = $1 AND status = 'pending'",
        placed.order_id,
    )
    .await;
    assert_eq!(deliveries, 1);

    let message = sqlx::query_scalar::<_, String>("SELECT message FROM notification")
        .fetch_one(&pool)
        .await
        .expect("notification");
    assert!(message.contains(&format!("#{}", placed.order_id)), "{message}");

    let guest = UserRepository::new(&pool)
        .get_by_email(&Email::parse("79007654321@temp.local").expect("email"))
        .await
        .expect("lookup")
        .expect("guest customer");
    assert_eq!(guest.name, "Мария");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_registration_claims_guest_account(pool: PgPool) {
    let category = insert_category(&pool, "Броши").await;
    let brooch = insert_product(&pool, category, "Брошь-стрекоза", "2200.00", 2).await;

    let mut order = form(vec![(brooch, 1)], None);
    order.customer_email = Some("maria@example.ru");
    let placed = CheckoutService::new(&pool)
        .place(&order.validate().expect("valid form"))
        .await
        .expect("order placed");

    let registration = Registration {
        name: "Мария Иванова",
        email: "Maria@Example.ru",
        password: "jewel-box-2026",
        phone: None,
    };
    let user = AuthService::new(&pool)
        .register(registration)
        .await
        .expect("claims guest account");
    assert_eq!(user.name, "Мария Иванова");
    assert_eq!(user.phone.as_deref(), Some("+79007654321"));

    let owner = sqlx::query_scalar::<_, i32>("SELECT user_id FROM customer_order WHERE id = $1")
        .bind(placed.order_id)
        .fetch_one(&pool)
        .await
        .expect("order owner");
    assert_eq!(owner, user.id.as_i32());

    let again = Registration {
        name: "Другая Мария",
        email: "maria@example.ru",
        password: "another-password",
        phone: None,
    };
    let err = AuthService::new(&pool)
        .register(again)
        .await
        .expect_err("already registered");
    assert!(matches!(err, AuthError::UserAlreadyExists), "{err:?}");
}
