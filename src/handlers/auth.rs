//! Registration, login, and session management.
//!
//! Sessions are HS256 JWTs in an httpOnly cookie. Unknown email and wrong
//! password produce the identical 401 so the endpoint can't be used to
//! probe which addresses have accounts.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{AuthUser, Json};
use crate::jwt;
use crate::models::{CreateUser, LoginRequest, RegisterRequest, UserRole};
use crate::rate_limit;
use crate::response::ok;

const BCRYPT_COST: u32 = 12;

pub fn router(rate_limit_config: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .layer(rate_limit::standard_layer(rate_limit_config.standard_rpm))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((jwt::COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(jwt::TOKEN_TTL_DAYS))
        .build()
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    request.validate()?;

    let conn = state.db.get()?;
    if queries::get_user_by_email(&conn, &request.email)?.is_some() {
        return Err(AppError::Validation(msg::EMAIL_TAKEN.into()));
    }

    let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = queries::create_user(
        &conn,
        &CreateUser {
            name: request.name.trim().to_string(),
            email: request.email,
            password_hash,
            role: UserRole::User,
        },
    )?;

    let token = jwt::sign_token(&state.jwt_secret, &user.id)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    Ok((StatusCode::CREATED, jar, ok(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_email(&conn, &request.email)?
        .ok_or_else(|| AppError::Unauthorized(msg::INVALID_CREDENTIALS.to_string()))?;

    let matches = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;
    if !matches {
        return Err(AppError::Unauthorized(msg::INVALID_CREDENTIALS.to_string()));
    }

    let token = jwt::sign_token(&state.jwt_secret, &user.id)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    Ok((jar, ok(user)))
}

pub async fn logout(jar: CookieJar) -> Result<impl IntoResponse> {
    // `CookieJar::remove` only emits the expiring Set-Cookie when the
    // request carried the cookie; build the removal cookie directly so the
    // session is cleared unconditionally.
    let mut removal = Cookie::build((jwt::COOKIE_NAME, "")).path("/").build();
    removal.make_removal();
    let jar = jar.add(removal);
    Ok((jar, ok(serde_json::json!({ "message": "Logged out" }))))
}

pub async fn me(AuthUser(user): AuthUser) -> Result<impl IntoResponse> {
    Ok(ok(user))
}
