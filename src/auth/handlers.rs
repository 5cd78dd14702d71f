use axum::{
    extract::{FromRef, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, CheckUserRequest, CheckUserResponse, ClaimUsernameRequest, LoginRequest,
            MessageResponse, SendOtpRequest, SessionResponse, SignupRequest, VerifyOtpRequest,
        },
        extractors::SessionUser,
        jwt::JwtKeys,
        password,
        repo_types::User,
        session, validate,
    },
    error::{AuthError, FieldError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/check-user", post(check_user))
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session/verify", get(verify_session))
}

pub fn username_routes() -> Router<AppState> {
    Router::new().route("/username/claim", post(claim_username))
}

/// Issue a session token for the user and wrap it in a Set-Cookie value.
fn issue_session_cookie(
    state: &AppState,
    user: &User,
) -> Result<axum::http::HeaderValue, AuthError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.issue(user.id)?;
    session::session_cookie(&token, keys.max_age_secs())
        .map_err(|e| AuthError::Internal(e.into()))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Response, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.phone = payload.phone.trim().to_string();

    let problems = validate::validate_signup(&payload.email, &payload.phone, &payload.password);
    if !problems.is_empty() {
        warn!(email = %payload.email, "signup validation failed");
        return Err(AuthError::Validation(problems));
    }

    if User::find_by_email_or_phone(&state.db, &payload.email, &payload.phone)
        .await?
        .is_some()
    {
        warn!(email = %payload.email, "signup identifier already registered");
        return Err(AuthError::Conflict);
    }

    let hash = password::hash_blocking(payload.password).await?;
    let user = User::create(&state.db, &payload.email, &payload.phone, &hash).await?;

    let cookie = issue_session_cookie(&state, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User registered successfully!",
            user: user.into(),
        }),
    )
        .into_response())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    payload.identifier = payload.identifier.trim().to_lowercase();

    let mut problems = Vec::new();
    if payload.identifier.is_empty() {
        problems.push(FieldError {
            field: "identifier",
            message: "All fields required.".into(),
        });
    }
    if payload.password.is_empty() {
        problems.push(FieldError {
            field: "password",
            message: "All fields required.".into(),
        });
    }
    if !problems.is_empty() {
        return Err(AuthError::Validation(problems));
    }

    // Unknown identifier and wrong password must be indistinguishable.
    let user = match User::find_by_identifier(&state.db, &payload.identifier).await? {
        Some(user) => user,
        None => {
            warn!(identifier = %payload.identifier, "login unknown identifier");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let ok = password::verify_blocking(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let cookie = issue_session_cookie(&state, &user)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful",
            user: user.into(),
        }),
    )
        .into_response())
}

pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, session::clear_session_cookie())],
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}

#[instrument(skip(state))]
pub async fn verify_session(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<SessionResponse>, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Json(SessionResponse { user: user.into() }))
}

#[instrument(skip(state, payload))]
pub async fn check_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CheckUserRequest>,
) -> Result<Json<CheckUserResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.phone = payload.phone.trim().to_string();

    let exists = User::find_by_email_or_phone(&state.db, &payload.email, &payload.phone)
        .await?
        .is_some();

    Ok(Json(CheckUserResponse { exists }))
}

#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.phone = payload.phone.trim().to_string();

    let mut problems = Vec::new();
    if !validate::is_valid_email(&payload.email) {
        problems.push(FieldError {
            field: "email",
            message: "Invalid email format.".into(),
        });
    }
    if !validate::is_valid_phone(&payload.phone) {
        problems.push(FieldError {
            field: "phone",
            message: "Phone number must be 10 digits.".into(),
        });
    }
    if !problems.is_empty() {
        return Err(AuthError::Validation(problems));
    }

    let email_code = state.otp.issue(&payload.email);
    let phone_code = state.otp.issue(&payload.phone);

    // Delivery goes through an external channel; logged here in its place.
    info!(
        email = %payload.email,
        phone = %payload.phone,
        %email_code,
        %phone_code,
        "otp codes issued"
    );

    Ok(Json(MessageResponse {
        message: "OTP sent",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<VerifyOtpRequest>,
) -> Result<Response, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.phone = payload.phone.trim().to_string();

    // Both channels must check out before anything is written.
    if !state.otp.verify(&payload.email, &payload.otp_email)
        || !state.otp.verify(&payload.phone, &payload.otp_phone)
    {
        warn!(email = %payload.email, "otp mismatch");
        return Err(AuthError::OtpInvalidOrExpired);
    }

    let problems = validate::validate_signup(&payload.email, &payload.phone, &payload.password);
    if !problems.is_empty() {
        return Err(AuthError::Validation(problems));
    }

    if User::find_by_email_or_phone(&state.db, &payload.email, &payload.phone)
        .await?
        .is_some()
    {
        return Err(AuthError::Conflict);
    }

    let hash = password::hash_blocking(payload.password).await?;
    let user = User::create(&state.db, &payload.email, &payload.phone, &hash).await?;

    state.otp.consume(&payload.email);
    state.otp.consume(&payload.phone);

    info!(user_id = %user.id, email = %user.email, "user registered via otp");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully!",
        }),
    )
        .into_response())
}

#[instrument(skip(state, payload))]
pub async fn claim_username(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(mut payload): Json<ClaimUsernameRequest>,
) -> Result<Json<SessionResponse>, AuthError> {
    payload.username = payload.username.trim().to_lowercase();

    if !validate::is_valid_username(&payload.username) {
        return Err(AuthError::Validation(vec![FieldError {
            field: "username",
            message: "Username must be 3-20 characters of a-z, 0-9 or _.".into(),
        }]));
    }

    let user = User::claim_username(&state.db, user_id, &payload.username).await?;

    info!(user_id = %user.id, "username claimed");
    Ok(Json(SessionResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn session_response_serialization() {
        let response = SessionResponse {
            user: crate::auth::dto::PublicUser {
                id: Uuid::new_v4(),
                email: "test@example.com".to_string(),
                phone: "9999999999".to_string(),
                username: None,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("user"));
    }
}
