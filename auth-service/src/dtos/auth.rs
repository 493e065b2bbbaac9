use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Role, SanitizedUser};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful login: a session token plus the public identity fields.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SanitizedUser,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_rejects_bad_email() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn register_request_rejects_short_password() {
        let req = RegisterRequest {
            email: "a@x.com".to_string(),
            password: "short".to_string(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn register_request_parses_known_role() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"password1","role":"researcher"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Some(Role::Researcher));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn register_request_rejects_unknown_role() {
        let result: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"email":"a@x.com","password":"password1","role":"overlord"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn verify_otp_request_requires_six_digit_code() {
        let req = VerifyOtpRequest {
            email: "b@x.com".to_string(),
            otp: "1234".to_string(),
            password: "password1".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
