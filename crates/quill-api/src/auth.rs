use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use quill_core::{Core, Error};
use quill_types::api::{
    ForgotPasswordRequest, ImagePayload, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, ResetTokenResponse, SecurityAnswerRequest, SecurityQuestionResponse,
    UpdateBioRequest,
};

use crate::blocking;
use crate::blogs::decode_image;
use crate::error::ApiResult;
use crate::middleware::{Claims, create_token};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub core: Core,
    pub jwt_secret: String,
    pub session_hours: i64,
}

fn issue_session(state: &AppState, username: String, channel: String) -> ApiResult<LoginResponse> {
    let token = create_token(&state.jwt_secret, &username, &channel, state.session_hours)
        .map_err(Error::Storage)?;
    Ok(LoginResponse {
        username,
        channel,
        token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = blocking(&state, move |core| {
        core.register(
            &req.username,
            &req.email,
            &req.password,
            &req.channel,
            &req.security_question,
            &req.security_answer,
        )
    })
    .await?;

    let session = issue_session(&state, user.username, user.channel)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session =
        blocking(&state, move |core| core.authenticate(&req.username, &req.password)).await?;

    info!("{} logged in", session.username);
    Ok(Json(issue_session(&state, session.username, session.channel)?))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ResetTokenResponse>> {
    let reset_token =
        blocking(&state, move |core| core.request_password_reset(&req.username, &req.email)).await?;
    Ok(Json(ResetTokenResponse { reset_token }))
}

pub async fn security_question(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<SecurityQuestionResponse>> {
    let question = blocking(&state, move |core| {
        core.security_question(&username)?.ok_or(Error::NotFound("user"))
    })
    .await?;
    Ok(Json(SecurityQuestionResponse { question }))
}

pub async fn security_answer(
    State(state): State<AppState>,
    Json(req): Json<SecurityAnswerRequest>,
) -> ApiResult<Json<ResetTokenResponse>> {
    let reset_token = blocking(&state, move |core| {
        core.recover_with_security_answer(&req.username, &req.answer)
    })
    .await?;
    Ok(Json(ResetTokenResponse { reset_token }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    if req.password != req.confirm_password {
        return Err(Error::invalid("confirm_password", "mismatch").into());
    }

    blocking(&state, move |core| core.reset_password(&req.token, &req.password)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Own account --

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let profile = blocking(&state, move |core| core.profile(&claims.sub)).await?;
    Ok(Json(profile))
}

pub async fn update_bio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateBioRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = blocking(&state, move |core| {
        core.update_bio(&claims.sub, &req.bio)?;
        core.profile(&claims.sub)
    })
    .await?;
    Ok(Json(profile))
}

pub async fn update_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ImagePayload>,
) -> ApiResult<impl IntoResponse> {
    let upload = decode_image(req)?;
    let profile = blocking(&state, move |core| {
        core.set_profile_picture(&claims.sub, &upload)?;
        core.profile(&claims.sub)
    })
    .await?;
    Ok(Json(profile))
}
