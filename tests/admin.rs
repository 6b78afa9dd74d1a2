//! Admin dashboard tests: statistics arithmetic, the all-orders listing,
//! and access control.

use axum::http::StatusCode;
use tower::ServiceExt;

mod common;
use common::*;

#[tokio::test]
async fn stats_count_paid_revenue_only() {
    let (state, _) = test_state();
    let admin = {
        let conn = state.db.get().unwrap();
        let admin = create_test_user(&conn, "admin@example.com", UserRole::Admin);
        let user = create_test_user(&conn, "alice@example.com", UserRole::User);
        let product = create_test_product(&conn, "Widget", "gadgets", 1000, 50);

        let paid = create_test_order(&conn, &user.id, &product, 3);
        queries::try_mark_order_paid(&conn, &paid.id).unwrap();

        let failed = create_test_order(&conn, &user.id, &product, 2);
        queries::mark_order_failed_if_pending(&conn, &failed.id).unwrap();

        // Still pending; not revenue
        create_test_order(&conn, &user.id, &product, 1);

        admin
    };
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/stats",
            Some(&auth_cookie(&admin.id)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["totalRevenue"], 3000);
    assert_eq!(json["data"]["totalOrders"], 3);
    assert_eq!(json["data"]["paidOrders"], 1);
    assert_eq!(json["data"]["productCount"], 1);
    assert_eq!(json["data"]["userCount"], 2);
}

#[tokio::test]
async fn stats_low_stock_boundary_is_inclusive() {
    let (state, _) = test_state();
    let admin = {
        let conn = state.db.get().unwrap();
        let admin = create_test_user(&conn, "admin@example.com", UserRole::Admin);
        create_test_product(&conn, "Nearly Gone", "gadgets", 1000, 2);
        create_test_product(&conn, "At Threshold", "gadgets", 1000, 10);
        create_test_product(&conn, "Plenty", "gadgets", 1000, 11);
        admin
    };
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/stats",
            Some(&auth_cookie(&admin.id)),
            None,
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    let low = json["data"]["lowStockProducts"].as_array().unwrap();
    let titles: Vec<&str> = low.iter().map(|p| p["title"].as_str().unwrap()).collect();
    // Most depleted first, threshold inclusive, well-stocked excluded
    assert_eq!(titles, vec!["Nearly Gone", "At Threshold"]);
    assert_eq!(low[0]["stockQuantity"], 2);
}

#[tokio::test]
async fn all_orders_join_customer_identity() {
    let (state, _) = test_state();
    let (admin, alice) = {
        let conn = state.db.get().unwrap();
        let admin = create_test_user(&conn, "admin@example.com", UserRole::Admin);
        let alice = create_test_user(&conn, "alice@example.com", UserRole::User);
        let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);
        create_test_order(&conn, &alice.id, &product, 1);
        (admin, alice)
    };
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/orders",
            Some(&auth_cookie(&admin.id)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let orders = json["data"]["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["customerName"], alice.name.as_str());
    assert_eq!(orders[0]["customerEmail"], "alice@example.com");
    // The flattened order fields sit alongside the customer fields
    assert_eq!(orders[0]["totalAmount"], 1000);
}

#[tokio::test]
async fn all_orders_paginate_newest_first() {
    let (state, _) = test_state();
    let (admin, orders) = {
        let conn = state.db.get().unwrap();
        let admin = create_test_user(&conn, "admin@example.com", UserRole::Admin);
        let user = create_test_user(&conn, "alice@example.com", UserRole::User);
        let product = create_test_product(&conn, "Widget", "gadgets", 1000, 10);
        let orders: Vec<Order> = (0..5)
            .map(|i| create_test_order(&conn, &user.id, &product, i + 1))
            .collect();
        (admin, orders)
    };
    let app = app(state);

    let response = app
        .oneshot(json_request(
            "GET",
            "/admin/orders?page=1&limit=2",
            Some(&auth_cookie(&admin.id)),
            None,
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    let listed = json["data"]["orders"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], orders[4].id.as_str());
    assert_eq!(listed[1]["id"], orders[3].id.as_str());
    assert_eq!(json["data"]["pagination"]["total"], 5);
    assert_eq!(json["data"]["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn admin_endpoints_enforce_access() {
    let (state, _) = test_state();
    let user = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "alice@example.com", UserRole::User)
    };
    let app = app(state);

    for uri in ["/admin/stats", "/admin/orders"] {
        let response = app
            .clone()
            .oneshot(json_request("GET", uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let response = app
            .clone()
            .oneshot(json_request("GET", uri, Some(&auth_cookie(&user.id)), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}
