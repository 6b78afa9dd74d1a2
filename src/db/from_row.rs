//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde::de::DeserializeOwned;

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on invalid stored values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse a JSON text column into a typed value, with the same error
/// treatment as `parse_enum`.
fn parse_json<T: DeserializeOwned>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(col)?;
    serde_json::from_str(&raw).map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub const PRODUCT_COLS: &str =
    "id, title, description, price_cents, category, stock_quantity, image_url, created_at, updated_at";

pub const ORDER_COLS: &str =
    "id, user_id, items, total_amount_cents, payment_session_id, payment_status, created_at, updated_at";

pub const ORDER_WITH_CUSTOMER_COLS: &str = "o.id, o.user_id, o.items, o.total_amount_cents, o.payment_session_id, o.payment_status, o.created_at, o.updated_at, u.name, u.email";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            price_cents: row.get(3)?,
            category: row.get(4)?,
            stock_quantity: row.get(5)?,
            image_url: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            items: parse_json(row, 2, "items")?,
            total_amount_cents: row.get(3)?,
            payment_session_id: row.get(4)?,
            payment_status: parse_enum(row, 5, "payment_status")?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for OrderWithCustomer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderWithCustomer {
            order: Order::from_row(row)?,
            customer_name: row.get(8)?,
            customer_email: row.get(9)?,
        })
    }
}

impl FromRow for LowStockProduct {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LowStockProduct {
            id: row.get(0)?,
            title: row.get(1)?,
            stock_quantity: row.get(2)?,
            category: row.get(3)?,
        })
    }
}
