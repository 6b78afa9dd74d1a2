//! Admin dashboard: aggregate statistics and the all-orders listing.

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{AdminUser, Query};
use crate::models::{LowStockProduct, OrderWithCustomer};
use crate::pagination::{PageInfo, PageQuery};
use crate::response::ok;

const ORDERS_PAGE_DEFAULT: i64 = 20;
const ORDERS_PAGE_MAX: i64 = 100;

/// Products at or below this stock count appear in the dashboard report.
const LOW_STOCK_THRESHOLD: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/orders", get(all_orders))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Sum of totals over paid orders only, in cents
    pub total_revenue: i64,
    pub total_orders: i64,
    pub paid_orders: i64,
    pub product_count: i64,
    pub user_count: i64,
    pub low_stock_products: Vec<LowStockProduct>,
}

pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;

    Ok(ok(StatsResponse {
        total_revenue: queries::total_revenue_cents(&conn)?,
        total_orders: queries::count_orders(&conn)?,
        paid_orders: queries::count_paid_orders(&conn)?,
        product_count: queries::count_products(&conn, &queries::ProductFilters::default())?,
        user_count: queries::count_users(&conn)?,
        low_stock_products: queries::low_stock_products(&conn, LOW_STOCK_THRESHOLD)?,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminOrdersQuery {
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Serialize)]
pub struct AdminOrdersResponse {
    pub orders: Vec<OrderWithCustomer>,
    pub pagination: PageInfo,
}

pub async fn all_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<AdminOrdersQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.page();
    let limit = query.page.limit(ORDERS_PAGE_DEFAULT, ORDERS_PAGE_MAX);
    let offset = query.page.offset(limit);

    let conn = state.db.get()?;
    let orders = queries::list_orders_with_customers(&conn, limit, offset)?;
    let total = queries::count_orders(&conn)?;

    Ok(ok(AdminOrdersResponse {
        orders,
        pagination: PageInfo::new(page, limit, total),
    }))
}
