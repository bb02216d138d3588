use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, ProfileResponse, ProfileUpdateResponse,
            RegisterRequest, UpdateProfileRequest,
        },
        error::AuthError,
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{self, ProfileUpdate},
        session::{cleared_cookie, session_cookie},
    },
    state::AppState,
};

type SetCookie = [(HeaderName, String); 1];

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

fn issue_cookie(state: &AppState, keys: &JwtKeys, token: &str) -> SetCookie {
    [(
        header::SET_COOKIE,
        session_cookie(&state.config.session, token, keys.ttl.as_secs()),
    )]
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, SetCookie, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload?;
    let user = services::register(
        state.users.as_ref(),
        payload,
        state.config.allow_admin_signup,
    )
    .await?;

    // Registration logs the new account in.
    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;
    let cookie = issue_cookie(&state, &keys, &token);

    Ok((
        StatusCode::CREATED,
        cookie,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(SetCookie, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let (token, user) = services::login(state.users.as_ref(), &keys, payload).await?;
    let cookie = issue_cookie(&state, &keys, &token);

    Ok((
        cookie,
        Json(AuthResponse {
            message: "Login successful",
            token,
            user: user.into(),
        }),
    ))
}

/// Stateless tokens cannot be revoked; logout tells the browser to drop the cookie.
#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> (SetCookie, Json<MessageResponse>) {
    if let Some(user) = user {
        info!(user_id = %user.user_id, "user logged out");
    }
    (
        [(header::SET_COOKIE, cleared_cookie(&state.config.session))],
        Json(MessageResponse {
            message: "Logout successful",
        }),
    )
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id, role = auth.role.as_str()))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AuthError> {
    let user = services::get_profile(state.users.as_ref(), auth.user_id).await?;
    Ok(Json(ProfileResponse { user: user.into() }))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileUpdateResponse>, AuthError> {
    let Json(payload) = payload?;
    let response = match services::update_profile(state.users.as_ref(), auth.user_id, payload).await? {
        ProfileUpdate::Updated(user) => ProfileUpdateResponse {
            message: "Profile updated successfully",
            updated: true,
            user: user.into(),
        },
        ProfileUpdate::Unchanged(user) => ProfileUpdateResponse {
            message: "No changes detected.",
            updated: false,
            user: user.into(),
        },
    };
    Ok(Json(response))
}
