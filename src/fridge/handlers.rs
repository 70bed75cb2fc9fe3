use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CategoryRequest, FoodListResponse, FoodRequest, SuccessResponse},
    filter::FoodQuery,
    repo_types::{Category, Food},
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
        .route("/foods/add_food/", post(add_food))
        .route("/foods/compartment/:compartment/", get(list_foods))
        .route("/foods/:id/", put(replace_food).patch(patch_food))
        .route("/foods/:id/delete/", delete(delete_food))
        .route("/categories/", get(list_categories))
        .route("/categories/add/", post(add_category))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(compartment): ApiPath<String>,
    ApiQuery(query): ApiQuery<FoodQuery>,
) -> AppResult<Json<FoodListResponse>> {
    let foods = services::list_foods(&state, &compartment, query).await?;
    Ok(Json(FoodListResponse { foods }))
}

#[instrument(skip(state, payload))]
pub async fn add_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiJson(payload): ApiJson<FoodRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<Food>>)> {
    let food = services::add_food(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Food added.", food)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn replace_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<FoodRequest>,
) -> AppResult<Json<SuccessResponse<Food>>> {
    let food = services::update_food(&state, id, payload, false).await?;
    Ok(Json(SuccessResponse::new("Food updated.", food)))
}

#[instrument(skip(state, payload))]
pub async fn patch_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<FoodRequest>,
) -> AppResult<Json<SuccessResponse<Food>>> {
    let food = services::update_food(&state, id, payload, true).await?;
    Ok(Json(SuccessResponse::new("Food updated.", food)))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_food(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(services::list_categories(&state).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_category(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<Category>>)> {
    let category = services::add_category(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Category added.", category)),
    ))
}
