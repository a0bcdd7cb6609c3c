use serde::{Deserialize, Serialize};

use crate::models::{Blog, Comment, Message, Profile};

// -- JWT Claims --

/// JWT claims issued on login. `sub` is the username, which is the primary
/// identity key everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub channel: String,
    pub exp: usize,
}

// -- Errors --

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub errors: Vec<String>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub channel: String,
    pub security_question: String,
    pub security_answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub channel: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityAnswerRequest {
    pub username: String,
    pub answer: String,
}

/// The reset token is returned to the requester, who is expected to carry it
/// to the reset form out of band.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct SecurityQuestionResponse {
    pub question: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBioRequest {
    pub bio: String,
}

// -- Blogs --

/// An uploaded image. `data` is base64 (standard alphabet).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagePayload {
    pub filename: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBlogRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct BlogDetailResponse {
    #[serde(flatten)]
    pub blog: Blog,
    pub comments: Vec<Comment>,
    pub is_liked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: u64,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub is_following: bool,
    pub blogs: Vec<Blog>,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
    pub followers_count: u64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageHistoryResponse {
    pub with: String,
    pub messages: Vec<Message>,
}
