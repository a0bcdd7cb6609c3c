//! JSON-over-HTTP surface for quill. Handlers stay thin: decode the request,
//! run the core call on the blocking pool, map the result.

pub mod auth;
pub mod blogs;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod social;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use quill_core::{Core, Error};

use crate::auth::AppState;
use crate::error::ApiError;

/// Upper bound for any caller-supplied `limit` query parameter.
pub const MAX_PAGE_LIMIT: u32 = 200;

pub(crate) fn capped(limit: Option<u32>) -> Option<u32> {
    limit.map(|limit| limit.min(MAX_PAGE_LIMIT))
}

/// Run a core call off the async runtime. The database is synchronous.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Core) -> quill_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.core))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            Error::Storage(e.into())
        })?;
    Ok(result?)
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/security-question/{username}", get(auth::security_question))
        .route("/auth/security-answer", post(auth::security_answer))
        .route("/auth/reset-password", post(auth::reset_password));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/me/bio", put(auth::update_bio))
        .route("/me/picture", put(auth::update_picture))
        .route("/blogs", get(blogs::list_blogs).post(blogs::create_blog))
        .route(
            "/blogs/{id}",
            get(blogs::get_blog)
                .put(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        .route(
            "/blogs/{id}/comments",
            get(blogs::list_comments).post(blogs::add_comment),
        )
        .route("/blogs/{id}/like", post(blogs::toggle_like))
        .route("/users/{username}", get(social::user_profile))
        .route(
            "/users/{username}/follow",
            post(social::follow).delete(social::unfollow),
        )
        .route("/notifications", get(social::list_notifications))
        .route("/notifications/count", get(social::unread_count))
        .route("/notifications/read", post(social::mark_read))
        .route("/conversations", get(messages::conversations))
        .route(
            "/conversations/{username}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
