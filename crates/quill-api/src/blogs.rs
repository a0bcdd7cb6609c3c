use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;

use quill_core::{Error, ImageUpload};
use quill_types::api::{
    BlogDetailResponse, CommentRequest, CreateBlogRequest, ImagePayload, LikeResponse,
    UpdateBlogRequest,
};

use crate::auth::AppState;
use crate::{blocking, capped};
use crate::error::ApiResult;
use crate::middleware::Claims;

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    /// Free-text search over title, content and author.
    pub q: Option<String>,
    pub author: Option<String>,
    pub limit: Option<u32>,
}

pub(crate) fn decode_image(payload: ImagePayload) -> Result<ImageUpload, Error> {
    let bytes = B64
        .decode(payload.data.as_bytes())
        .map_err(|_| Error::invalid("images", "bad_base64"))?;
    Ok(ImageUpload::new(payload.filename, bytes))
}

pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = capped(query.limit);
    let blogs = blocking(&state, move |core| match (query.author, query.q) {
        (Some(author), _) => core.blogs_by_author(&author),
        (None, Some(q)) => core.search_blogs(&q, limit),
        (None, None) => core.list_blogs(limit),
    })
    .await?;
    Ok(Json(blogs))
}

pub async fn create_blog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBlogRequest>,
) -> ApiResult<impl IntoResponse> {
    let images = req
        .images
        .into_iter()
        .map(decode_image)
        .collect::<Result<Vec<_>, _>>()?;

    let blog = blocking(&state, move |core| {
        core.create_blog(&claims.sub, &req.title, &req.content, &images)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<BlogDetailResponse>> {
    let detail = blocking(&state, move |core| {
        Ok(BlogDetailResponse {
            blog: core.get_blog(id)?,
            comments: core.comments(id)?,
            is_liked: core.is_liked(&claims.sub, id)?,
        })
    })
    .await?;
    Ok(Json(detail))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateBlogRequest>,
) -> ApiResult<impl IntoResponse> {
    let blog = blocking(&state, move |core| {
        core.edit_blog(&claims.sub, id, &req.title, &req.content)
    })
    .await?;
    Ok(Json(blog))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |core| core.delete_blog(&claims.sub, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Comments and likes --

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let comments = blocking(&state, move |core| core.comments(id)).await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment = blocking(&state, move |core| core.add_comment(&claims.sub, id, &req.text)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<LikeResponse>> {
    let (liked, likes_count) =
        blocking(&state, move |core| core.toggle_like(&claims.sub, id)).await?;
    Ok(Json(LikeResponse { liked, likes_count }))
}
