use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{MealPlanRequest, PlanQuery, RecipeForm, RecipeQuery};
use super::pagination::{Page, PageRequest};
use super::repo_types::{MealPlan, MealPlanChanges, NewMealPlan, NewRecipe, Recipe, RecipeChanges};
use crate::{
    dates::parse_iso_date,
    error::{AppError, AppResult, FieldErrors},
    images::services::{delete_image, presign, upload_recipe_image},
    state::AppState,
    validation::{check_text, require},
};

const RECIPE_NOT_FOUND: &str = "Recipe does not exist.";
const PLAN_NOT_FOUND: &str = "Meal plan does not exist.";
const BAD_DATE: &str = "Date has wrong format. Use YYYY-MM-DD.";

pub async fn list_recipes(st: &AppState, query: RecipeQuery) -> AppResult<Page<Recipe>> {
    let req = PageRequest::resolve(&query.page, &st.config.pagination)?;
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let count = st.recipes.count(search).await?;
    req.check_in_range(count)?;
    let results = st.recipes.page(search, req.size, req.offset()).await?;
    Ok(Page::new(req, count, results))
}

pub async fn get_recipe(st: &AppState, id: Uuid) -> AppResult<Recipe> {
    st.recipes
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(RECIPE_NOT_FOUND))
}

fn check_recipe_text(form: &RecipeForm, errors: &mut FieldErrors) {
    if let Some(title) = &form.title {
        check_text(errors, "title", title, 255);
    }
}

pub async fn create_recipe(st: &AppState, mut form: RecipeForm) -> AppResult<Recipe> {
    let mut errors = FieldErrors::default();
    require(&mut errors, "title", &form.title);
    check_recipe_text(&form, &mut errors);
    errors.into_result()?;

    let stored = match form.image.take() {
        Some(img) => Some(upload_recipe_image(st, img).await?),
        None => None,
    };
    let new = NewRecipe {
        title: form.title.map(|t| t.trim().to_string()).unwrap_or_default(),
        ingredients: form.ingredients.unwrap_or_default(),
        instructions: form.instructions.unwrap_or_default(),
        image_name: stored.as_ref().map(|s| s.name.clone()),
        img_url: stored.as_ref().map(|s| s.key.clone()),
    };

    match st.recipes.create(new).await {
        Ok(recipe) => {
            info!(recipe_id = %recipe.id, title = %recipe.title, "recipe created");
            Ok(recipe)
        }
        Err(e) => {
            if let Some(s) = stored {
                delete_image(st, &s.key).await;
            }
            Err(e)
        }
    }
}

/// Partial update; a new image replaces and removes the previous one.
pub async fn update_recipe(st: &AppState, id: Uuid, mut form: RecipeForm) -> AppResult<Recipe> {
    let existing = get_recipe(st, id).await?;
    let mut errors = FieldErrors::default();
    check_recipe_text(&form, &mut errors);
    errors.into_result()?;

    let stored = match form.image.take() {
        Some(img) => Some(upload_recipe_image(st, img).await?),
        None => None,
    };
    let changes = RecipeChanges {
        title: form.title.map(|t| t.trim().to_string()),
        ingredients: form.ingredients,
        instructions: form.instructions,
        image_name: stored.as_ref().map(|s| s.name.clone()),
        img_url: stored.as_ref().map(|s| s.key.clone()),
    };

    let recipe = match st.recipes.update(existing.id, &changes).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(s) = stored {
                delete_image(st, &s.key).await;
            }
            return Err(e);
        }
    };
    if let (Some(_), Some(old)) = (&stored, &existing.img_url) {
        delete_image(st, old).await;
    }
    info!(recipe_id = %recipe.id, "recipe updated");
    Ok(recipe)
}

/// Deletes the recipe (and through the cascade its meal plans), then its image.
pub async fn delete_recipe(st: &AppState, id: Uuid) -> AppResult<Recipe> {
    let recipe = get_recipe(st, id).await?;
    if !st.recipes.delete(recipe.id).await? {
        return Err(AppError::not_found(RECIPE_NOT_FOUND));
    }
    if let Some(key) = &recipe.img_url {
        delete_image(st, key).await;
    }
    info!(recipe_id = %recipe.id, "recipe deleted");
    Ok(recipe)
}

/// Presigned link to the recipe's stored image.
pub async fn recipe_image_url(st: &AppState, id: Uuid) -> AppResult<String> {
    let recipe = get_recipe(st, id).await?;
    let Some(key) = recipe.img_url else {
        return Err(AppError::not_found("Recipe has no image."));
    };
    Ok(presign(st, &key).await?)
}

pub async fn list_plans(st: &AppState, query: PlanQuery) -> AppResult<Vec<MealPlan>> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(parse_iso_date(raw).ok_or_else(|| {
            warn!(date = %raw, "meal plan date filter rejected");
            AppError::field("date", BAD_DATE)
        })?),
        None => None,
    };
    let meal_type = query
        .meal_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    st.meal_plans.list(date, meal_type).await
}

pub async fn get_plan(st: &AppState, id: Uuid) -> AppResult<MealPlan> {
    st.meal_plans
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(PLAN_NOT_FOUND))
}

async fn validate_plan(st: &AppState, req: MealPlanRequest, full: bool) -> AppResult<MealPlanChanges> {
    let mut errors = FieldErrors::default();
    if full {
        require(&mut errors, "date", &req.date);
        require(&mut errors, "meal_type", &req.meal_type);
        require(&mut errors, "recipe_id", &req.recipe_id);
    }

    let mut changes = MealPlanChanges::default();
    if let Some(raw) = &req.date {
        match parse_iso_date(raw) {
            Some(d) => changes.date = Some(d),
            None => errors.add("date", BAD_DATE),
        }
    }
    if let Some(day) = req.day_of_week {
        check_text(&mut errors, "day_of_week", &day, 10);
        changes.day_of_week = Some(day.trim().to_string());
    }
    if let Some(meal_type) = req.meal_type {
        check_text(&mut errors, "meal_type", &meal_type, 50);
        changes.meal_type = Some(meal_type.trim().to_string());
    }
    if let Some(recipe_id) = req.recipe_id {
        if st.recipes.find(recipe_id).await?.is_some() {
            changes.recipe_id = Some(recipe_id);
        } else {
            errors.add(
                "recipe_id",
                format!("Invalid pk \"{recipe_id}\" - object does not exist."),
            );
        }
    }
    errors.into_result()?;
    Ok(changes)
}

pub async fn create_plan(st: &AppState, req: MealPlanRequest) -> AppResult<MealPlan> {
    let changes = validate_plan(st, req, true).await?;
    let (Some(date), Some(meal_type), Some(recipe_id)) =
        (changes.date, changes.meal_type, changes.recipe_id)
    else {
        return Err(AppError::validation("Invalid input."));
    };
    let day_of_week = changes
        .day_of_week
        .unwrap_or_else(|| date.weekday().to_string());

    let plan = st
        .meal_plans
        .create(NewMealPlan {
            date,
            day_of_week,
            meal_type,
            recipe_id,
        })
        .await?;
    info!(plan_id = %plan.id, date = %plan.date, meal_type = %plan.meal_type, "meal plan created");
    Ok(plan)
}

pub async fn update_plan(st: &AppState, id: Uuid, req: MealPlanRequest) -> AppResult<MealPlan> {
    let existing = get_plan(st, id).await?;
    let changes = validate_plan(st, req, false).await?;
    let plan = st.meal_plans.update(existing.id, &changes).await?;
    info!(plan_id = %plan.id, "meal plan updated");
    Ok(plan)
}

pub async fn delete_plan(st: &AppState, id: Uuid) -> AppResult<MealPlan> {
    let plan = get_plan(st, id).await?;
    if !st.meal_plans.delete(plan.id).await? {
        return Err(AppError::not_found(PLAN_NOT_FOUND));
    }
    info!(plan_id = %plan.id, "meal plan deleted");
    Ok(plan)
}
