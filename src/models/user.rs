// src/models/user.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::LazyLock;
use validator::Validate;

static ENROLLMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("enrollment regex"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique enrollment number; doubles as the login identifier.
    pub enrollment_number: String,

    pub full_name: String,

    pub department: String,

    /// 1..=8 for students; 0 for the seeded admin account.
    pub semester: i32,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'. Assigned at registration, immutable.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub enrollment_number: String,
    pub full_name: String,
    pub department: String,
    pub semester: i32,
    pub role: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<User> for MeResponse {
    fn from(u: User) -> Self {
        MeResponse {
            id: u.id,
            enrollment_number: u.enrollment_number,
            full_name: u.full_name,
            department: u.department,
            semester: u.semester,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(
        length(min = 3, max = 50, message = "Enrollment number length must be between 3 and 50 characters."),
        custom(function = validate_enrollment_number)
    )]
    pub enrollment_number: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 1, max = 100))]
    pub department: String,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8."))]
    pub semester: i32,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub enrollment_number: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

fn validate_enrollment_number(value: &str) -> Result<(), validator::ValidationError> {
    if !ENROLLMENT_RE.is_match(value) {
        return Err(validator::ValidationError::new("invalid_enrollment_number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_numbers_are_alphanumeric() {
        assert!(validate_enrollment_number("210303105001").is_ok());
        assert!(validate_enrollment_number("CE-2021_14").is_ok());
        assert!(validate_enrollment_number("bad number").is_err());
        assert!(validate_enrollment_number("admin@quiz.com").is_err());
        assert!(validate_enrollment_number("-leading").is_err());
    }
}
