use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub image_name: Option<String>,
    pub cleaned_ingredients: Option<String>,
    /// Object-store key of the image, not a URL.
    pub img_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub image_name: Option<String>,
    pub img_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image_name: Option<String>,
    pub img_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealPlan {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub day_of_week: String,
    pub meal_type: String,
    pub recipe: Recipe,
}

/// Meal plan joined with its recipe; recipe columns carry a `recipe_` prefix.
#[derive(Debug, FromRow)]
pub struct MealPlanRow {
    pub id: Uuid,
    pub date: Date,
    pub day_of_week: String,
    pub meal_type: String,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub recipe_ingredients: String,
    pub recipe_instructions: String,
    pub recipe_image_name: Option<String>,
    pub recipe_cleaned_ingredients: Option<String>,
    pub recipe_img_url: Option<String>,
    pub recipe_created_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            date: r.date,
            day_of_week: r.day_of_week,
            meal_type: r.meal_type,
            recipe: Recipe {
                id: r.recipe_id,
                title: r.recipe_title,
                ingredients: r.recipe_ingredients,
                instructions: r.recipe_instructions,
                image_name: r.recipe_image_name,
                cleaned_ingredients: r.recipe_cleaned_ingredients,
                img_url: r.recipe_img_url,
                created_at: r.recipe_created_at,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub date: Date,
    pub day_of_week: String,
    pub meal_type: String,
    pub recipe_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct MealPlanChanges {
    pub date: Option<Date>,
    pub day_of_week: Option<String>,
    pub meal_type: Option<String>,
    pub recipe_id: Option<Uuid>,
}
