use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AddMemberRequest, FamilyMemberResponse, FamilyRequest, RelabelRequest},
    repo_types::Family,
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn family_routes() -> Router<AppState> {
    Router::new()
        .route("/families/", get(list_families).post(create_family))
        .route(
            "/families/:id/",
            get(get_family)
                .put(rename_family)
                .patch(rename_family)
                .delete(delete_family),
        )
        .route("/family-members/", get(list_members).post(add_member))
        .route(
            "/family-members/:id/",
            get(get_member)
                .put(relabel_member)
                .patch(relabel_member)
                .delete(remove_member),
        )
}

#[instrument(skip(state))]
pub async fn list_families(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Family>>> {
    Ok(Json(services::list_families(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_family(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<FamilyRequest>,
) -> AppResult<(StatusCode, Json<Family>)> {
    let family = services::create_family(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

#[instrument(skip(state))]
pub async fn get_family(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Family>> {
    Ok(Json(services::get_family(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn rename_family(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<FamilyRequest>,
) -> AppResult<Json<Family>> {
    Ok(Json(services::rename_family(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_family(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_family(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<FamilyMemberResponse>>> {
    Ok(Json(services::list_edges(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<FamilyMemberResponse>)> {
    let edge = services::add_edge(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

#[instrument(skip(state))]
pub async fn get_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<FamilyMemberResponse>> {
    Ok(Json(services::get_edge(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn relabel_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RelabelRequest>,
) -> AppResult<Json<FamilyMemberResponse>> {
    Ok(Json(services::relabel_edge(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::remove_edge(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
