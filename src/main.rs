use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::Config;
use storefront::db::{create_pool, init_db, queries, AppState};
use storefront::handlers;
use storefront::models::{CreateProduct, CreateUser, UserRole};
use storefront::payments::StripeClient;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Storefront backend: catalog, auth, and checkout with webhook fulfillment")]
struct Cli {
    /// Seed the database with dev data (admin user + sample catalog)
    #[arg(long)]
    seed: bool,
}

/// Seeds an admin login and a small catalog for local development.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state
        .db
        .get()
        .expect("Failed to get db connection for seeding");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    let password = "admin123";
    let password_hash = bcrypt::hash(password, 12).expect("Failed to hash seed password");
    let admin = queries::create_user(
        &conn,
        &CreateUser {
            name: "Dev Admin".to_string(),
            email: "admin@storefront.local".to_string(),
            password_hash,
            role: UserRole::Admin,
        },
    )
    .expect("Failed to create dev admin");

    let catalog = [
        ("Mechanical Keyboard", "Tenkeyless, hot-swappable switches", 8900, "peripherals", 25),
        ("Vertical Mouse", "Ergonomic wireless mouse", 4500, "peripherals", 40),
        ("4K Monitor", "27-inch IPS panel", 32900, "displays", 8),
        ("Laptop Stand", "Aluminium, foldable", 2900, "accessories", 60),
        ("USB-C Dock", "Dual display, 100W passthrough", 12900, "accessories", 15),
    ];
    for (title, description, price_cents, category, stock) in catalog {
        queries::create_product(
            &conn,
            &CreateProduct {
                title: title.to_string(),
                description: description.to_string(),
                price_cents,
                category: category.to_string(),
                stock_quantity: stock,
                image_url: None,
            },
        )
        .expect("Failed to create seed product");
    }

    tracing::info!("============================================");
    tracing::info!("SEEDED DEV DATA");
    tracing::info!("Admin login: {} / {}", admin.email, password);
    tracing::info!("Catalog: {} products", catalog.len());
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Provider credentials are injected here, once; nothing deeper in the
    // call graph reads the environment.
    let gateway = Arc::new(StripeClient::new(
        &config.stripe_secret_key,
        &config.stripe_webhook_secret,
    ));

    let state = AppState {
        db: db_pool,
        gateway,
        client_url: config.client_url.clone(),
        jwt_secret: config.jwt_secret.clone(),
        secure_cookies: !config.dev_mode,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set STOREFRONT_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(config.rate_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storefront server listening on {}", addr);

    // into_make_service_with_connect_info so the per-IP rate limiter can
    // see peer addresses
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
