use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        MealPlanCreated, MealPlanDeleted, MealPlanRequest, MealPlanUpdated, PlanQuery,
        RecipeCreated, RecipeDeleted, RecipeForm, RecipeQuery, RecipeUpdated,
    },
    pagination::Page,
    repo_types::{MealPlan, Recipe},
    services,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    images::services::UploadItem,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/list/", get(list_recipes))
        .route("/recipes/:id/", get(get_recipe))
        .route("/recipes/:id/image/", get(recipe_image))
        .route("/plans/list/", get(list_plans))
        .route("/plans/:id/", get(get_plan))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/create/", post(create_recipe))
        .route("/recipes/update/:id/", patch(update_recipe))
        .route("/recipes/delete/:id/", delete(delete_recipe))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
        .route("/plans/create/", post(create_plan))
        .route("/plans/update/:id/", patch(update_plan))
        .route("/plans/delete/:id/", delete(delete_plan))
}

/// Collects the text fields and the optional `image` file of a recipe form.
async fn read_form(mut mp: Multipart) -> AppResult<RecipeForm> {
    let mut form = RecipeForm::default();
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        AppError::validation(e.body_text())
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::field("image", e.body_text()))?;
                if !body.is_empty() {
                    form.image = Some(UploadItem {
                        body,
                        content_type,
                        filename,
                    });
                }
            }
            Some(key @ ("title" | "ingredients" | "instructions")) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::field(key, e.body_text()))?;
                match key {
                    "title" => form.title = Some(text),
                    "ingredients" => form.ingredients = Some(text),
                    _ => form.instructions = Some(text),
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecipeQuery>,
) -> AppResult<Json<Page<Recipe>>> {
    Ok(Json(services::list_recipes(&state, query).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(services::get_recipe(&state, id).await?))
}

/// 307 to a short-lived presigned URL of the recipe image.
#[instrument(skip(state))]
pub async fn recipe_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Redirect> {
    let url = services::recipe_image_url(&state, id).await?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, mp))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    mp: Multipart,
) -> AppResult<(StatusCode, Json<RecipeCreated>)> {
    let form = read_form(mp).await?;
    let recipe = services::create_recipe(&state, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeCreated {
            message: format!("Recipe '{}' created.", recipe.title),
            created_recipe: recipe,
        }),
    ))
}

#[instrument(skip(state, mp))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    mp: Multipart,
) -> AppResult<Json<RecipeUpdated>> {
    let form = read_form(mp).await?;
    let recipe = services::update_recipe(&state, id, form).await?;
    Ok(Json(RecipeUpdated {
        message: format!("Recipe '{}' updated.", recipe.title),
        updated_recipe: recipe,
    }))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<RecipeDeleted>> {
    let recipe = services::delete_recipe(&state, id).await?;
    Ok(Json(RecipeDeleted {
        message: format!("Recipe '{}' deleted.", recipe.title),
        deleted_recipe: recipe,
    }))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PlanQuery>,
) -> AppResult<Json<Vec<MealPlan>>> {
    Ok(Json(services::list_plans(&state, query).await?))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MealPlan>> {
    Ok(Json(services::get_plan(&state, id).await?))
}

fn plan_label(plan: &MealPlan) -> String {
    format!("{} on {}", plan.meal_type, plan.date)
}

#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiJson(payload): ApiJson<MealPlanRequest>,
) -> AppResult<(StatusCode, Json<MealPlanCreated>)> {
    let plan = services::create_plan(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MealPlanCreated {
            message: format!("Meal plan '{}' created.", plan_label(&plan)),
            created_meal_plan: plan,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_plan(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<MealPlanRequest>,
) -> AppResult<Json<MealPlanUpdated>> {
    let plan = services::update_plan(&state, id, payload).await?;
    Ok(Json(MealPlanUpdated {
        message: format!("Meal plan '{}' updated.", plan_label(&plan)),
        updated_meal_plan: plan,
    }))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MealPlanDeleted>> {
    let plan = services::delete_plan(&state, id).await?;
    Ok(Json(MealPlanDeleted {
        message: format!("Meal plan '{}' deleted.", plan_label(&plan)),
        deleted_meal_plan: plan,
    }))
}
