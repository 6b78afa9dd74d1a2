use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Basic email format validation.
///
/// Intentionally permissive - one @, non-empty local part, domain with at
/// least one dot. Not meant to be RFC 5322 compliant, just a sanity check
/// before the address becomes a unique key.
fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::Validation(msg::INVALID_EMAIL.into()));
    }

    let local_part = parts[0];
    let domain_part = parts[1];

    if local_part.is_empty() || local_part.contains(' ') {
        return Err(AppError::Validation(msg::INVALID_EMAIL.into()));
    }

    if domain_part.is_empty()
        || !domain_part.contains('.')
        || domain_part.starts_with('.')
        || domain_part.ends_with('.')
    {
        return Err(AppError::Validation(msg::INVALID_EMAIL.into()));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer or admin account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input to `queries::create_user` - the password is already hashed by the
/// time it reaches the database layer.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(msg::NAME_REQUIRED.into()));
        }
        if self.name.trim().len() > 50 {
            return Err(AppError::Validation(msg::NAME_TOO_LONG.into()));
        }
        validate_email_format(&self.email)?;
        if self.password.len() < 6 {
            return Err(AppError::Validation(msg::PASSWORD_TOO_SHORT.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    #[test]
    fn accepts_plain_address() {
        assert!(register("alice@example.com").validate().is_ok());
    }

    #[test]
    fn rejects_missing_at() {
        assert!(register("alice.example.com").validate().is_err());
    }

    #[test]
    fn rejects_dotless_domain() {
        assert!(register("alice@localhost").validate().is_err());
    }

    #[test]
    fn rejects_short_password() {
        let mut req = register("alice@example.com");
        req.password = "12345".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("superuser".parse::<UserRole>().is_err());
    }
}
