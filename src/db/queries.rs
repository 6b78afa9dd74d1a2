//! All SQL lives here. Handlers call these functions with a pooled
//! connection; nothing in the application layer does read-modify-write on
//! rows that concurrent requests can touch - the stock decrement and the
//! order state transitions are single conditional UPDATE statements.

use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{msg, AppError, Result};
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, ORDER_COLS, ORDER_WITH_CUSTOMER_COLS, PRODUCT_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Execute the update and return the updated entity using RETURNING.
    /// Returns None if no rows matched or there were no fields to update.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            &id,
            &input.name,
            &email,
            &input.password_hash,
            input.role.as_str(),
            now
        ],
    )?;

    Ok(User {
        id,
        name: input.name.clone(),
        email,
        password_hash: input.password_hash.clone(),
        role: input.role,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let id = gen_id();
    let now = now();
    let category = input.category.trim().to_lowercase();

    conn.execute(
        "INSERT INTO products (id, title, description, price_cents, category, stock_quantity, image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            &id,
            &input.title,
            &input.description,
            input.price_cents,
            &category,
            input.stock_quantity,
            &input.image_url,
            now
        ],
    )?;

    Ok(Product {
        id,
        title: input.title.clone(),
        description: input.description.clone(),
        price_cents: input.price_cents,
        category,
        stock_quantity: input.stock_quantity,
        image_url: input.image_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn update_product(
    conn: &Connection,
    id: &str,
    input: &UpdateProduct,
) -> Result<Option<Product>> {
    let mut builder = UpdateBuilder::new("products", id)
        .with_updated_at()
        .set_opt("title", input.title.clone())
        .set_opt("description", input.description.clone())
        .set_opt("price_cents", input.price_cents)
        .set_opt(
            "category",
            input.category.as_ref().map(|c| c.trim().to_lowercase()),
        )
        .set_opt("stock_quantity", input.stock_quantity);

    if let Some(ref image_url) = input.image_url {
        builder = builder.set_nullable("image_url", image_url.clone());
    }

    builder.execute_returning(conn, PRODUCT_COLS)
}

pub fn delete_product(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// Optional catalog filters, applied in SQL.
#[derive(Debug, Default, Clone)]
pub struct ProductFilters {
    /// Case-insensitive substring match on title
    pub search: Option<String>,
    /// Exact match; compared lowercased like the stored value
    pub category: Option<String>,
}

impl ProductFilters {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref search) = self.search {
            clauses.push("title LIKE ?");
            values.push(format!("%{}%", search).into());
        }
        if let Some(ref category) = self.category {
            clauses.push("category = ?");
            values.push(category.trim().to_lowercase().into());
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

pub fn list_products(
    conn: &Connection,
    filters: &ProductFilters,
    sort: ProductSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>> {
    let (where_sql, mut values) = filters.where_clause();
    let sql = format!(
        "SELECT {} FROM products{} ORDER BY {} LIMIT ? OFFSET ?",
        PRODUCT_COLS,
        where_sql,
        sort.order_clause()
    );
    values.push(limit.into());
    values.push(offset.into());

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), Product::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_products(conn: &Connection, filters: &ProductFilters) -> Result<i64> {
    let (where_sql, values) = filters.where_clause();
    let sql = format!("SELECT COUNT(*) FROM products{}", where_sql);
    conn.query_row(&sql, rusqlite::params_from_iter(values), |row| row.get(0))
        .map_err(Into::into)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT category FROM products ORDER BY category")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Atomically decrement a product's stock by `quantity`.
///
/// The arithmetic runs inside the UPDATE so concurrent confirmations for the
/// same product cannot lose a decrement. There is deliberately no floor at
/// zero: the checkout-time availability check is advisory, and a confirmed
/// payment is deducted even when competing orders already drained the stock.
/// Returns false if no product matched.
pub fn decrement_product_stock(conn: &Connection, id: &str, quantity: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE products SET stock_quantity = stock_quantity - ?1, updated_at = ?2 WHERE id = ?3",
        params![quantity, now(), id],
    )?;
    Ok(affected > 0)
}

/// Products at or below the low-stock threshold, most depleted first.
pub fn low_stock_products(conn: &Connection, threshold: i64) -> Result<Vec<LowStockProduct>> {
    query_all(
        conn,
        "SELECT id, title, stock_quantity, category FROM products
         WHERE stock_quantity <= ?1 ORDER BY stock_quantity ASC, title ASC",
        &[&threshold],
    )
}

// ============ Orders ============

/// Create an order in `pending` with no payment session attached yet.
///
/// The total is computed here from the item snapshots, so it can never
/// disagree with them. The items are stored as a JSON array on the row.
pub fn create_order(conn: &Connection, user_id: &str, items: &[OrderItem]) -> Result<Order> {
    if items.is_empty() {
        return Err(AppError::Validation(msg::CART_EMPTY.into()));
    }

    let id = gen_id();
    let now = now();
    let total: i64 = items
        .iter()
        .map(|item| item.quantity * item.unit_price_cents)
        .sum();
    let items_json = serde_json::to_string(items)?;

    conn.execute(
        "INSERT INTO orders (id, user_id, items, total_amount_cents, payment_session_id, payment_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, NULL, 'pending', ?5, ?5)",
        params![&id, user_id, &items_json, total, now],
    )?;

    Ok(Order {
        id,
        user_id: user_id.to_string(),
        items: items.to_vec(),
        total_amount_cents: total,
        payment_session_id: None,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

/// A user's orders, newest first. Rowid breaks created_at ties so two
/// orders placed in the same second come back in insertion order.
pub fn list_orders_by_user(conn: &Connection, user_id: &str) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            ORDER_COLS
        ),
        &[&user_id],
    )
}

/// Attach the real payment session handle once the provider responds.
pub fn attach_payment_session(conn: &Connection, order_id: &str, session_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET payment_session_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![session_id, now(), order_id],
    )?;
    Ok(affected > 0)
}

/// Atomically claim the `pending → paid` transition.
///
/// Compare-and-swap in a single statement: of any number of concurrent
/// deliveries of the same completion event, exactly one sees a row change
/// and proceeds to deduct stock.
///
/// Returns:
/// - `Ok(true)` if this call won the transition (order was pending)
/// - `Ok(false)` if the order was already settled (paid or failed)
pub fn try_mark_order_paid(conn: &Connection, order_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET payment_status = 'paid', updated_at = ?1
         WHERE id = ?2 AND payment_status = 'pending'",
        params![now(), order_id],
    )?;
    Ok(affected > 0)
}

/// Mark an order failed, but only while it is still pending - a late
/// expiry event must never clobber a paid order.
pub fn mark_order_failed_if_pending(conn: &Connection, order_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET payment_status = 'failed', updated_at = ?1
         WHERE id = ?2 AND payment_status = 'pending'",
        params![now(), order_id],
    )?;
    Ok(affected > 0)
}

pub fn count_orders(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .map_err(Into::into)
}

pub fn count_paid_orders(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE payment_status = 'paid'",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Revenue counts paid orders only; pending and failed attempts are not
/// money.
pub fn total_revenue_cents(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(total_amount_cents), 0) FROM orders WHERE payment_status = 'paid'",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// All orders joined with customer identity, newest first, paginated.
pub fn list_orders_with_customers(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<Vec<OrderWithCustomer>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders o JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC, o.rowid DESC LIMIT ?1 OFFSET ?2",
            ORDER_WITH_CUSTOMER_COLS
        ),
        &[&limit, &offset],
    )
}
