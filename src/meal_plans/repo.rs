use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use super::repo_types::{
    MealPlan, MealPlanChanges, MealPlanRow, NewMealPlan, NewRecipe, Recipe, RecipeChanges,
};
use crate::{
    error::{AppError, AppResult},
    validation::contains_pattern,
};

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Recipes whose title, ingredients or instructions contain `search`.
    async fn count(&self, search: Option<&str>) -> AppResult<i64>;
    async fn page(&self, search: Option<&str>, limit: i64, offset: i64) -> AppResult<Vec<Recipe>>;
    async fn find(&self, id: Uuid) -> AppResult<Option<Recipe>>;
    async fn create(&self, recipe: NewRecipe) -> AppResult<Recipe>;
    async fn update(&self, id: Uuid, changes: &RecipeChanges) -> AppResult<Recipe>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    async fn list(&self, date: Option<Date>, meal_type: Option<&str>) -> AppResult<Vec<MealPlan>>;
    async fn find(&self, id: Uuid) -> AppResult<Option<MealPlan>>;
    async fn create(&self, plan: NewMealPlan) -> AppResult<MealPlan>;
    async fn update(&self, id: Uuid, changes: &MealPlanChanges) -> AppResult<MealPlan>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

const RECIPE_COLUMNS: &str = "id, title, ingredients, instructions, image_name, \
                              cleaned_ingredients, img_url, created_at";

#[derive(Clone)]
pub struct PgRecipeRepository {
    db: PgPool,
}

impl PgRecipeRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_recipe_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = contains_pattern(term);
        qb.push(" WHERE title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ingredients ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR instructions ILIKE ")
            .push_bind(pattern);
    }
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn count(&self, search: Option<&str>) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes");
        push_recipe_search(&mut qb, search);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.db).await?;
        Ok(count)
    }

    async fn page(&self, search: Option<&str>, limit: i64, offset: i64) -> AppResult<Vec<Recipe>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes"));
        push_recipe_search(&mut qb, search);
        qb.push(" ORDER BY created_at, id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<Recipe>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, recipe: NewRecipe) -> AppResult<Recipe> {
        let row = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (id, title, ingredients, instructions, image_name, img_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&recipe.title)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.image_name)
        .bind(&recipe.img_url)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: &RecipeChanges) -> AppResult<Recipe> {
        let row = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes SET
                title        = COALESCE($2, title),
                ingredients  = COALESCE($3, ingredients),
                instructions = COALESCE($4, instructions),
                image_name   = COALESCE($5, image_name),
                img_url      = COALESCE($6, img_url)
            WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.ingredients)
        .bind(&changes.instructions)
        .bind(&changes.image_name)
        .bind(&changes.img_url)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

const PLAN_SELECT: &str = r#"
    SELECT mp.id, mp.date, mp.day_of_week, mp.meal_type,
           r.id AS recipe_id,
           r.title AS recipe_title,
           r.ingredients AS recipe_ingredients,
           r.instructions AS recipe_instructions,
           r.image_name AS recipe_image_name,
           r.cleaned_ingredients AS recipe_cleaned_ingredients,
           r.img_url AS recipe_img_url,
           r.created_at AS recipe_created_at
      FROM meal_plans mp
      JOIN recipes r ON r.id = mp.recipe_id
"#;

#[derive(Clone)]
pub struct PgMealPlanRepository {
    db: PgPool,
}

impl PgMealPlanRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Option<MealPlan>> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!("{PLAN_SELECT} WHERE mp.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl MealPlanRepository for PgMealPlanRepository {
    async fn list(&self, date: Option<Date>, meal_type: Option<&str>) -> AppResult<Vec<MealPlan>> {
        let mut qb = QueryBuilder::<Postgres>::new(PLAN_SELECT);
        qb.push(" WHERE TRUE");
        if let Some(date) = date {
            qb.push(" AND mp.date = ").push_bind(date);
        }
        if let Some(meal_type) = meal_type {
            qb.push(" AND mp.meal_type ILIKE ")
                .push_bind(contains_pattern(meal_type));
        }
        qb.push(" ORDER BY mp.date, mp.id");
        let rows = qb.build_query_as::<MealPlanRow>().fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<MealPlan>> {
        self.fetch(id).await
    }

    async fn create(&self, plan: NewMealPlan) -> AppResult<MealPlan> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO meal_plans (id, date, day_of_week, meal_type, recipe_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plan.date)
        .bind(&plan.day_of_week)
        .bind(&plan.meal_type)
        .bind(plan.recipe_id)
        .fetch_one(&self.db)
        .await?;
        self.fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found("Meal plan does not exist."))
    }

    async fn update(&self, id: Uuid, changes: &MealPlanChanges) -> AppResult<MealPlan> {
        sqlx::query(
            r#"
            UPDATE meal_plans SET
                date        = COALESCE($2, date),
                day_of_week = COALESCE($3, day_of_week),
                meal_type   = COALESCE($4, meal_type),
                recipe_id   = COALESCE($5, recipe_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.date)
        .bind(&changes.day_of_week)
        .bind(&changes.meal_type)
        .bind(changes.recipe_id)
        .execute(&self.db)
        .await?;
        self.fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found("Meal plan does not exist."))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM meal_plans WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
