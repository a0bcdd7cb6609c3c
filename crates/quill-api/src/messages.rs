use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use quill_types::api::{MessageHistoryResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::{blocking, capped};
use crate::error::ApiResult;
use crate::middleware::Claims;
use crate::social::LimitQuery;

pub async fn conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let list = blocking(&state, move |core| core.conversations(&claims.sub)).await?;
    Ok(Json(list))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<LimitQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageHistoryResponse>> {
    let with = username.clone();
    let messages = blocking(&state, move |core| {
        core.get_user(&username)?;
        core.history(&claims.sub, &username, capped(query.limit))
    })
    .await?;
    Ok(Json(MessageHistoryResponse { with, messages }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |core| core.send(&claims.sub, &username, &req.text)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
