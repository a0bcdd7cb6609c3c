use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use quill_types::api::{CountResponse, FollowResponse, UserProfileResponse};

use crate::auth::AppState;
use crate::{blocking, capped};
use crate::error::ApiResult;
use crate::middleware::Claims;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserProfileResponse>> {
    let response = blocking(&state, move |core| {
        Ok(UserProfileResponse {
            profile: core.profile(&username)?,
            is_following: core.is_following(&claims.sub, &username)?,
            blogs: core.blogs_by_author(&username)?,
        })
    })
    .await?;
    Ok(Json(response))
}

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<FollowResponse>> {
    let followers_count = blocking(&state, move |core| {
        core.follow(&claims.sub, &username)?;
        core.followers_count(&username)
    })
    .await?;
    Ok(Json(FollowResponse {
        following: true,
        followers_count,
    }))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<FollowResponse>> {
    let followers_count = blocking(&state, move |core| {
        core.unfollow(&claims.sub, &username)?;
        core.followers_count(&username)
    })
    .await?;
    Ok(Json(FollowResponse {
        following: false,
        followers_count,
    }))
}

// -- Notifications --

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let limit = capped(query.limit);
    let notifications =
        blocking(&state, move |core| core.list_notifications(&claims.sub, limit)).await?;
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<CountResponse>> {
    let count = blocking(&state, move |core| core.unread_count(&claims.sub)).await?;
    Ok(Json(CountResponse { count }))
}

/// Responds with how many notifications were marked.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<CountResponse>> {
    let marked = blocking(&state, move |core| core.mark_all_read(&claims.sub)).await?;
    Ok(Json(CountResponse {
        count: marked as u64,
    }))
}
