mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::DynPaymentGateway;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database pool (users, products, orders)
    pub db: DbPool,
    /// Payment provider client; trait object so tests can substitute a fake
    pub gateway: DynPaymentGateway,
    /// Frontend origin; checkout success/cancel redirects point here
    pub client_url: String,
    /// Secret for signing session JWTs
    pub jwt_secret: String,
    /// Whether to set the Secure flag on session cookies (off in dev over http)
    pub secure_cookies: bool,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        // Writers wait instead of failing fast under concurrent webhooks
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")
    });
    Pool::builder().max_size(10).build(manager)
}
