//! Catalog browsing (public) and product management (admin).
//!
//! Filtering, sorting, and pagination all happen in SQL so a large catalog
//! never pages through application memory.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{AdminUser, Json, Path, Query};
use crate::models::{CreateProduct, Product, ProductSort, UpdateProduct};
use crate::pagination::{PageInfo, PageQuery};
use crate::response::ok;

const PAGE_SIZE_DEFAULT: i64 = 12;
const PAGE_SIZE_MAX: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/categories", get(list_categories))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: PageInfo,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse> {
    let sort = match query.sort.as_deref() {
        None | Some("") => ProductSort::default(),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(msg::INVALID_SORT.into()))?,
    };

    let page = query.page.page();
    let limit = query.page.limit(PAGE_SIZE_DEFAULT, PAGE_SIZE_MAX);
    let offset = query.page.offset(limit);

    let filters = queries::ProductFilters {
        search: query.search.clone(),
        category: query.category.clone(),
    };

    let conn = state.db.get()?;
    let products = queries::list_products(&conn, &filters, sort, limit, offset)?;
    let total = queries::count_products(&conn, &filters)?;

    Ok(ok(ProductListResponse {
        products,
        pagination: PageInfo::new(page, limit, total),
    }))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;
    let categories = queries::list_categories(&conn)?;
    Ok(ok(categories))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;
    let product = queries::get_product_by_id(&conn, &id)?.or_not_found(msg::PRODUCT_NOT_FOUND)?;
    Ok(ok(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(input): Json<CreateProduct>,
) -> Result<impl IntoResponse> {
    input.validate()?;

    let conn = state.db.get()?;
    let product = queries::create_product(&conn, &input)?;
    Ok((StatusCode::CREATED, ok(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateProduct>,
) -> Result<impl IntoResponse> {
    input.validate()?;

    let conn = state.db.get()?;
    let product =
        queries::update_product(&conn, &id, &input)?.or_not_found(msg::PRODUCT_NOT_FOUND)?;
    Ok(ok(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;
    if !queries::delete_product(&conn, &id)? {
        return Err(AppError::NotFound(msg::PRODUCT_NOT_FOUND.into()));
    }
    Ok(ok(serde_json::json!({ "message": "Product deleted" })))
}
