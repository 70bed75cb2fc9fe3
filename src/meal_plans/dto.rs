use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pagination::PageParams;
use super::repo_types::{MealPlan, Recipe};
use crate::images::services::UploadItem;

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

/// Multipart recipe body: text fields plus an optional `image` file.
#[derive(Default)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image: Option<UploadItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    pub date: Option<String>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MealPlanRequest {
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub meal_type: Option<String>,
    pub recipe_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RecipeCreated {
    pub message: String,
    pub created_recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct RecipeUpdated {
    pub message: String,
    pub updated_recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct RecipeDeleted {
    pub message: String,
    pub deleted_recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct MealPlanCreated {
    pub message: String,
    pub created_meal_plan: MealPlan,
}

#[derive(Debug, Serialize)]
pub struct MealPlanUpdated {
    pub message: String,
    pub updated_meal_plan: MealPlan,
}

#[derive(Debug, Serialize)]
pub struct MealPlanDeleted {
    pub message: String,
    pub deleted_meal_plan: MealPlan,
}
