use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{
    ItemChanges, NewItem, NewShoppingList, ShoppingList, ShoppingListChanges, ShoppingListItem,
};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait ShoppingRepository: Send + Sync {
    /// Lists created by `user`, shared with them, or owned by one of `family_ids`.
    async fn lists_for(&self, user_id: Uuid, family_ids: &[Uuid]) -> AppResult<Vec<ShoppingList>>;
    async fn find_list(&self, id: Uuid) -> AppResult<Option<ShoppingList>>;
    /// Inserts the list and its share set atomically.
    async fn create_list(&self, list: NewShoppingList) -> AppResult<ShoppingList>;
    async fn update_list(&self, id: Uuid, changes: &ShoppingListChanges) -> AppResult<ShoppingList>;
    async fn delete_list(&self, id: Uuid) -> AppResult<bool>;

    async fn items_in(&self, list_ids: &[Uuid]) -> AppResult<Vec<ShoppingListItem>>;
    async fn find_item(&self, id: Uuid) -> AppResult<Option<ShoppingListItem>>;
    async fn create_item(&self, item: NewItem) -> AppResult<ShoppingListItem>;
    async fn update_item(&self, id: Uuid, changes: &ItemChanges) -> AppResult<ShoppingListItem>;
    async fn delete_item(&self, id: Uuid) -> AppResult<bool>;
}

const LIST_COLUMNS: &str = r#"
    l.id, l.family_id, l.created_by, l.name, l.date, l.week, l.created_at, l.updated_at,
    ARRAY(SELECT s.user_id FROM shopping_list_shares s
           WHERE s.shopping_list_id = l.id ORDER BY s.user_id) AS shared_with
"#;

const ITEM_COLUMNS: &str = "id, shopping_list_id, item, quantity, category, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgShoppingRepository {
    db: PgPool,
}

impl PgShoppingRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn replace_shares(
    tx: &mut Transaction<'_, Postgres>,
    list_id: Uuid,
    users: &[Uuid],
) -> AppResult<()> {
    sqlx::query("DELETE FROM shopping_list_shares WHERE shopping_list_id = $1")
        .bind(list_id)
        .execute(&mut **tx)
        .await?;
    if !users.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO shopping_list_shares (shopping_list_id, user_id)
            SELECT $1, u FROM UNNEST($2::uuid[]) AS u
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(list_id)
        .bind(users)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn fetch_list(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<ShoppingList> {
    let list = sqlx::query_as::<_, ShoppingList>(&format!(
        "SELECT {LIST_COLUMNS} FROM shopping_lists l WHERE l.id = $1"
    ))
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(list)
}

#[async_trait]
impl ShoppingRepository for PgShoppingRepository {
    async fn lists_for(&self, user_id: Uuid, family_ids: &[Uuid]) -> AppResult<Vec<ShoppingList>> {
        let lists = sqlx::query_as::<_, ShoppingList>(&format!(
            r#"
            SELECT {LIST_COLUMNS}
              FROM shopping_lists l
             WHERE l.created_by = $1
                OR l.family_id = ANY($2)
                OR EXISTS (SELECT 1 FROM shopping_list_shares s
                            WHERE s.shopping_list_id = l.id AND s.user_id = $1)
             ORDER BY l.created_at, l.id
            "#
        ))
        .bind(user_id)
        .bind(family_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(lists)
    }

    async fn find_list(&self, id: Uuid) -> AppResult<Option<ShoppingList>> {
        let list = sqlx::query_as::<_, ShoppingList>(&format!(
            "SELECT {LIST_COLUMNS} FROM shopping_lists l WHERE l.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(list)
    }

    async fn create_list(&self, list: NewShoppingList) -> AppResult<ShoppingList> {
        let mut tx = self.db.begin().await?;
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO shopping_lists (id, family_id, created_by, name, date, week)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(list.family_id)
        .bind(list.created_by)
        .bind(&list.name)
        .bind(list.date)
        .bind(&list.week)
        .execute(&mut *tx)
        .await?;
        replace_shares(&mut tx, id, &list.shared_with).await?;
        let created = fetch_list(&mut tx, id).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_list(&self, id: Uuid, changes: &ShoppingListChanges) -> AppResult<ShoppingList> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query(
            r#"
            UPDATE shopping_lists SET
                family_id  = CASE WHEN $2 THEN $3 ELSE family_id END,
                name       = COALESCE($4, name),
                date       = CASE WHEN $5 THEN $6 ELSE date END,
                week       = CASE WHEN $7 THEN $8 ELSE week END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.family_id.is_some())
        .bind(changes.family_id.flatten())
        .bind(&changes.name)
        .bind(changes.date.is_some())
        .bind(changes.date.flatten())
        .bind(changes.week.is_some())
        .bind(changes.week.clone().flatten())
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Not found."));
        }
        if let Some(users) = &changes.shared_with {
            replace_shares(&mut tx, id, users).await?;
        }
        let updated = fetch_list(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_list(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM shopping_lists WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn items_in(&self, list_ids: &[Uuid]) -> AppResult<Vec<ShoppingListItem>> {
        let items = sqlx::query_as::<_, ShoppingListItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM shopping_list_items
             WHERE shopping_list_id = ANY($1)
             ORDER BY created_at, id
            "#
        ))
        .bind(list_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<ShoppingListItem>> {
        let item = sqlx::query_as::<_, ShoppingListItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_list_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    async fn create_item(&self, item: NewItem) -> AppResult<ShoppingListItem> {
        let created = sqlx::query_as::<_, ShoppingListItem>(&format!(
            r#"
            INSERT INTO shopping_list_items (id, shopping_list_id, item, quantity, category, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(item.shopping_list_id)
        .bind(&item.item)
        .bind(item.quantity)
        .bind(&item.category)
        .bind(item.status)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn update_item(&self, id: Uuid, changes: &ItemChanges) -> AppResult<ShoppingListItem> {
        let updated = sqlx::query_as::<_, ShoppingListItem>(&format!(
            r#"
            UPDATE shopping_list_items SET
                shopping_list_id = COALESCE($2, shopping_list_id),
                item             = COALESCE($3, item),
                quantity         = COALESCE($4, quantity),
                category         = CASE WHEN $5 THEN $6 ELSE category END,
                status           = COALESCE($7, status),
                updated_at       = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.shopping_list_id)
        .bind(&changes.item)
        .bind(changes.quantity)
        .bind(changes.category.is_some())
        .bind(changes.category.clone().flatten())
        .bind(changes.status)
        .fetch_one(&self.db)
        .await?;
        Ok(updated)
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM shopping_list_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
