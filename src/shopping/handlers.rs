use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{ItemRequest, SearchQuery, ShoppingListRequest},
    repo_types::{ShoppingList, ShoppingListItem},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopping-lists/", get(list_lists).post(create_list))
        .route(
            "/shopping-lists/:id/",
            get(get_list)
                .put(update_list)
                .patch(update_list)
                .delete(delete_list),
        )
        .route("/shopping-list-items/", get(list_items).post(create_item))
        .route(
            "/shopping-list-items/:id/",
            get(get_item)
                .put(replace_item)
                .patch(patch_item)
                .delete(delete_item),
        )
}

#[instrument(skip(state))]
pub async fn list_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Vec<ShoppingList>>> {
    Ok(Json(services::list_lists(&state, user_id, query).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ShoppingListRequest>,
) -> AppResult<(StatusCode, Json<ShoppingList>)> {
    let list = services::create_list(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[instrument(skip(state))]
pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ShoppingList>> {
    Ok(Json(services::get_list(&state, user_id, id).await?))
}

/// Lists have no required fields beyond defaults, so PUT behaves like PATCH.
#[instrument(skip(state, payload))]
pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ShoppingListRequest>,
) -> AppResult<Json<ShoppingList>> {
    Ok(Json(services::update_list(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_list(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Vec<ShoppingListItem>>> {
    Ok(Json(services::list_items(&state, user_id, query).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ItemRequest>,
) -> AppResult<(StatusCode, Json<ShoppingListItem>)> {
    let item = services::create_item(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::get_item(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn replace_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ItemRequest>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::update_item(&state, user_id, id, payload, false).await?))
}

#[instrument(skip(state, payload))]
pub async fn patch_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ItemRequest>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::update_item(&state, user_id, id, payload, true).await?))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_item(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
