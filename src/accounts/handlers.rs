use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    accounts::dto::{
        LoginRequest, MessageResponse, RequestResetRequest, ResetPasswordRequest, SignupRequest,
        VerifyRequest,
    },
    error::AccountError,
    state::AppState,
};

type ApiResult<T> = Result<T, AccountError>;

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify", post(verify))
        .route("/login", post(login))
        .route("/request-reset", post(request_reset))
        .route("/reset-password", post(reset_password))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable request body");
            Err(AccountError::Invalid("Malformed request body"))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let req = body(payload)?;
    state
        .accounts
        .signup(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Signup successful")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let req = body(payload)?;
    state
        .accounts
        .verify(
            req.email.as_deref().unwrap_or_default(),
            req.token.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(MessageResponse::new("Account verified")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let req = body(payload)?;
    state
        .accounts
        .login(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(MessageResponse::new("Login successful")))
}

#[instrument(skip(state, payload))]
pub async fn request_reset(
    State(state): State<AppState>,
    payload: Result<Json<RequestResetRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let req = body(payload)?;
    state
        .accounts
        .request_reset(req.email.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(MessageResponse::new("Reset token sent")))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let req = body(payload)?;
    state
        .accounts
        .reset_password(
            req.token.as_deref().unwrap_or_default(),
            req.new_password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}
