use std::env;

/// Per-IP rate limit tiers, in requests per minute.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Endpoints that call the payment provider (checkout)
    pub strict_rpm: u32,
    /// Credential endpoints (register, login)
    pub standard_rpm: u32,
    /// Lightweight endpoints (health)
    pub relaxed_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 10,
            standard_rpm: 30,
            relaxed_rpm: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Frontend origin; checkout success/cancel redirects point here
    pub client_url: String,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub dev_mode: bool,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("STOREFRONT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let client_url = env::var("CLIENT_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if !dev_mode {
                tracing::warn!("JWT_SECRET not set, using an insecure default");
            }
            "dev-secret-change-me".to_string()
        });

        let rate_limit = RateLimitConfig {
            strict_rpm: env_rpm("RATE_LIMIT_STRICT_RPM", 10),
            standard_rpm: env_rpm("RATE_LIMIT_STANDARD_RPM", 30),
            relaxed_rpm: env_rpm("RATE_LIMIT_RELAXED_RPM", 60),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "storefront.db".to_string()),
            client_url,
            jwt_secret,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            dev_mode,
            rate_limit,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_rpm(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
