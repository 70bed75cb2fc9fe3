use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AccessResponse, AdminDeleteRequest, AdminUpdateRequest, LoginRequest, LoginResponse,
        LogoutRequest, MessageResponse, RegisterRequest, UserUpdateRequest,
    },
    repo_types::User,
    services,
};
use crate::{
    auth::{cookies, AuthUser},
    error::AppResult,
    extract::ApiJson,
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/refresh/", post(refresh))
        .route("/logout/", post(logout))
        .route("/user-info/", get(user_info))
        .route("/user-update/", axum::routing::put(update_me).patch(update_me))
        .route(
            "/user-manage/",
            get(manage_list)
                .post(manage_create)
                .put(manage_update)
                .delete(manage_delete),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = services::register(&state, payload, false).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let session = services::login(&state, payload).await?;

    let secure = state.config.cookie_secure;
    let mut headers = HeaderMap::new();
    cookies::set_access(&mut headers, &session.access, secure)?;
    cookies::set_refresh(&mut headers, &session.refresh, secure)?;

    Ok((
        headers,
        Json(LoginResponse {
            user: session.user,
            access: session.access,
            refresh: session.refresh,
        }),
    ))
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<AccessResponse>)> {
    let token = cookies::read(&headers, cookies::REFRESH_COOKIE);
    let access = services::refresh(&state, token).await?;

    let mut out = HeaderMap::new();
    cookies::set_access(&mut out, &access, state.config.cookie_secure)?;
    Ok((out, Json(AccessResponse { access })))
}

#[instrument(skip(state, headers, payload))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<LogoutRequest>>,
) -> AppResult<(StatusCode, HeaderMap, Json<MessageResponse>)> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let token = body
        .refresh
        .or_else(|| cookies::read(&headers, cookies::REFRESH_COOKIE));
    services::logout(&state, token).await?;

    let mut out = HeaderMap::new();
    cookies::clear_session(&mut out, state.config.cookie_secure)?;
    Ok((
        StatusCode::RESET_CONTENT,
        out,
        Json(MessageResponse {
            message: "Logout successful".into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn user_info(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<User>> {
    Ok(Json(services::current_user(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(services::update_profile(&state, user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn manage_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(services::admin_list(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn manage_create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = services::admin_create(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn manage_update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<AdminUpdateRequest>,
) -> AppResult<Json<User>> {
    let user = services::admin_update(&state, user_id, payload.user_id, payload.changes).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn manage_delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<AdminDeleteRequest>,
) -> AppResult<StatusCode> {
    services::admin_delete(&state, user_id, payload.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
