use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Request body for login; the identifier is an email or a phone number.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckUserRequest {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct CheckUserResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub phone: String,
}

/// Request body for the OTP signup variant: one code per channel.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(rename = "otpEmail")]
    pub otp_email: String,
    #[serde(rename = "otpPhone")]
    pub otp_phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimUsernameRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Response returned after signup or login, alongside the session cookie.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub username: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_otp_request_uses_camel_case_keys() {
        let payload: VerifyOtpRequest = serde_json::from_str(
            r#"{"email":"a@x.com","phone":"9999999999","password":"Abcd123@",
                "otpEmail":"123456","otpPhone":"654321"}"#,
        )
        .unwrap();
        assert_eq!(payload.otp_email, "123456");
        assert_eq!(payload.otp_phone, "654321");
    }

    #[test]
    fn public_user_has_no_password_field() {
        let public = PublicUser {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            phone: "9999999999".into(),
            username: Some("runner".into()),
        };
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("runner"));
    }
}
