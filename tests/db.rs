//! Query-layer tests for the order state machine and stock arithmetic.

mod common;
use common::*;

#[test]
fn order_total_is_computed_from_item_snapshots() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);

    let items = vec![
        OrderItem {
            product_id: "p1".to_string(),
            title: "Widget".to_string(),
            quantity: 2,
            unit_price_cents: 1000,
        },
        OrderItem {
            product_id: "p2".to_string(),
            title: "Gadget".to_string(),
            quantity: 1,
            unit_price_cents: 500,
        },
    ];
    let order = queries::create_order(&conn, &user.id, &items).unwrap();
    assert_eq!(order.total_amount_cents, 2500);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.payment_session_id.is_none());

    // Items round-trip through the JSON column
    let loaded = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(loaded.items, items);
    assert_eq!(loaded.computed_total_cents(), loaded.total_amount_cents);
}

#[test]
fn create_order_rejects_an_empty_cart() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);

    assert!(queries::create_order(&conn, &user.id, &[]).is_err());
}

#[test]
fn paid_claim_is_won_exactly_once() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);
    let order = create_test_order(&conn, &user.id, &product, 1);

    assert!(queries::try_mark_order_paid(&conn, &order.id).unwrap());
    // Second attempt loses: the order is no longer pending
    assert!(!queries::try_mark_order_paid(&conn, &order.id).unwrap());

    let order = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[test]
fn failed_transition_requires_pending() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);

    let order = create_test_order(&conn, &user.id, &product, 1);
    assert!(queries::mark_order_failed_if_pending(&conn, &order.id).unwrap());
    // Failed is terminal in both directions
    assert!(!queries::try_mark_order_paid(&conn, &order.id).unwrap());

    let paid = create_test_order(&conn, &user.id, &product, 1);
    queries::try_mark_order_paid(&conn, &paid.id).unwrap();
    assert!(!queries::mark_order_failed_if_pending(&conn, &paid.id).unwrap());
    let paid = queries::get_order_by_id(&conn, &paid.id).unwrap().unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
}

#[test]
fn attach_payment_session_sets_the_handle() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);
    let order = create_test_order(&conn, &user.id, &product, 1);

    assert!(queries::attach_payment_session(&conn, &order.id, "cs_live_1").unwrap());
    let order = queries::get_order_by_id(&conn, &order.id).unwrap().unwrap();
    assert_eq!(order.payment_session_id.as_deref(), Some("cs_live_1"));

    assert!(!queries::attach_payment_session(&conn, "no-such-order", "cs_live_2").unwrap());
}

#[test]
fn stock_decrement_has_no_floor() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 2);

    assert!(queries::decrement_product_stock(&conn, &product.id, 5).unwrap());
    let product = queries::get_product_by_id(&conn, &product.id).unwrap().unwrap();
    assert_eq!(product.stock_quantity, -3);

    assert!(!queries::decrement_product_stock(&conn, "no-such-product", 1).unwrap());
}

#[test]
fn user_orders_tie_break_on_insertion_order() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);

    let ids: Vec<String> = (0..3)
        .map(|i| create_test_order(&conn, &user.id, &product, i + 1).id)
        .collect();

    let listed = queries::list_orders_by_user(&conn, &user.id).unwrap();
    let listed_ids: Vec<&str> = listed.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(listed_ids, vec![ids[2].as_str(), ids[1].as_str(), ids[0].as_str()]);
}

#[test]
fn revenue_sums_paid_orders_only() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let user = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 700, 50);

    let paid_a = create_test_order(&conn, &user.id, &product, 2);
    let paid_b = create_test_order(&conn, &user.id, &product, 3);
    let failed = create_test_order(&conn, &user.id, &product, 10);
    create_test_order(&conn, &user.id, &product, 1);

    queries::try_mark_order_paid(&conn, &paid_a.id).unwrap();
    queries::try_mark_order_paid(&conn, &paid_b.id).unwrap();
    queries::mark_order_failed_if_pending(&conn, &failed.id).unwrap();

    assert_eq!(queries::total_revenue_cents(&conn).unwrap(), 700 * 5);
    assert_eq!(queries::count_paid_orders(&conn).unwrap(), 2);
    assert_eq!(queries::count_orders(&conn).unwrap(), 4);
}

#[test]
fn duplicate_email_violates_the_unique_index() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    create_test_user(&conn, "alice@example.com", UserRole::User);

    let result = queries::create_user(
        &conn,
        &CreateUser {
            name: "Duplicate".to_string(),
            // Lowercased on insert, so this collides
            email: "ALICE@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        },
    );
    assert!(result.is_err());
}

#[test]
fn update_product_returns_the_updated_row() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 5);

    let updated = queries::update_product(
        &conn,
        &product.id,
        &UpdateProduct {
            price_cents: Some(2000),
            category: Some("Tools".to_string()),
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(updated.price_cents, 2000);
    assert_eq!(updated.category, "tools");
    assert_eq!(updated.title, "Widget");

    let missing = queries::update_product(
        &conn,
        "no-such-id",
        &UpdateProduct {
            price_cents: Some(1),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(missing.is_none());
}

#[test]
fn orders_with_customers_join_identity() {
    let pool = test_pool();
    let conn = pool.get().unwrap();
    let alice = create_test_user(&conn, "alice@example.com", UserRole::User);
    let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);
    create_test_order(&conn, &alice.id, &product, 1);

    let rows = queries::list_orders_with_customers(&conn, 10, 0).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer_email, "alice@example.com");
    assert_eq!(rows[0].order.user_id, alice.id);
}
