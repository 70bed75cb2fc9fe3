use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filter::FoodFilter;
use super::repo_types::{Category, Food, FoodChanges, NewFood};
use crate::{error::AppResult, validation::contains_pattern};

#[async_trait]
pub trait FoodRepository: Send + Sync {
    async fn list(&self, filter: &FoodFilter) -> AppResult<Vec<Food>>;
    async fn find(&self, id: Uuid) -> AppResult<Option<Food>>;
    async fn create(&self, food: NewFood) -> AppResult<Food>;
    async fn update(&self, id: Uuid, changes: &FoodChanges) -> AppResult<Food>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    /// Case-insensitive lookup by name.
    async fn find_category(&self, name: &str) -> AppResult<Option<Category>>;
    async fn create_category(&self, name: &str) -> AppResult<Category>;
}

const FOOD_COLUMNS: &str = "f.id, f.name, f.category_id, c.name AS category, f.compartment, \
                            f.location, f.quantity, f.registered_date, f.expiry_date, f.note";

#[derive(Clone)]
pub struct PgFoodRepository {
    db: PgPool,
}

impl PgFoodRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, term: &str) {
    let pattern = contains_pattern(term);
    qb.push(" AND (");
    let mut first = true;
    for column in ["f.name", "c.name", "f.location", "f.note"] {
        if !first {
            qb.push(" OR ");
        }
        first = false;
        qb.push(column).push(" ILIKE ").push_bind(pattern.clone());
    }
    qb.push(" OR f.quantity::text LIKE ").push_bind(pattern.clone());
    for column in ["f.registered_date", "f.expiry_date"] {
        for part in ["DAY", "MONTH", "YEAR"] {
            qb.push(format!(" OR EXTRACT({part} FROM {column})::int::text LIKE "))
                .push_bind(pattern.clone());
        }
    }
    qb.push(")");
}

#[async_trait]
impl FoodRepository for PgFoodRepository {
    async fn list(&self, filter: &FoodFilter) -> AppResult<Vec<Food>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {FOOD_COLUMNS} FROM foods f JOIN categories c ON c.id = f.category_id \
             WHERE f.compartment = "
        ));
        qb.push_bind(filter.compartment);

        if let Some(term) = &filter.search {
            push_search(&mut qb, term);
        }
        if let Some(quantity) = filter.quantity {
            qb.push(" AND f.quantity = ").push_bind(quantity);
        }
        if let Some(date) = filter.registered_date {
            qb.push(" AND f.registered_date = ").push_bind(date);
        }
        if let Some(date) = filter.expiry_date {
            qb.push(" AND f.expiry_date = ").push_bind(date);
        }
        qb.push(" ORDER BY f.expiry_date, f.name");

        let foods = qb.build_query_as::<Food>().fetch_all(&self.db).await?;
        Ok(foods)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Food>> {
        let food = sqlx::query_as::<_, Food>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods f JOIN categories c ON c.id = f.category_id \
             WHERE f.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(food)
    }

    async fn create(&self, food: NewFood) -> AppResult<Food> {
        let food = sqlx::query_as::<_, Food>(&format!(
            r#"
            WITH f AS (
                INSERT INTO foods (id, name, category_id, compartment, location, quantity,
                                   registered_date, expiry_date, note)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT {FOOD_COLUMNS} FROM f JOIN categories c ON c.id = f.category_id
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&food.name)
        .bind(food.category_id)
        .bind(food.compartment)
        .bind(&food.location)
        .bind(food.quantity)
        .bind(food.registered_date)
        .bind(food.expiry_date)
        .bind(&food.note)
        .fetch_one(&self.db)
        .await?;
        Ok(food)
    }

    async fn update(&self, id: Uuid, changes: &FoodChanges) -> AppResult<Food> {
        let food = sqlx::query_as::<_, Food>(&format!(
            r#"
            WITH f AS (
                UPDATE foods SET
                    name        = COALESCE($2, name),
                    category_id = COALESCE($3, category_id),
                    compartment = COALESCE($4, compartment),
                    location    = COALESCE($5, location),
                    quantity    = COALESCE($6, quantity),
                    expiry_date = COALESCE($7, expiry_date),
                    note        = COALESCE($8, note)
                WHERE id = $1
                RETURNING *
            )
            SELECT {FOOD_COLUMNS} FROM f JOIN categories c ON c.id = f.category_id
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.category_id)
        .bind(changes.compartment)
        .bind(&changes.location)
        .bind(changes.quantity)
        .bind(changes.expiry_date)
        .bind(&changes.note)
        .fetch_one(&self.db)
        .await?;
        Ok(food)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_category(&self, name: &str) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM categories WHERE lower(name) = lower($1) LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_category(&self, name: &str) -> AppResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}
