use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Family, FamilyMember, FamilyMemberRow, NewEdge};
use crate::error::AppResult;

#[async_trait]
pub trait FamilyRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> AppResult<Option<Family>>;
    /// Families the user created or appears in, as declarer or as target.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Family>>;
    async fn create(&self, name: &str, created_by: Uuid) -> AppResult<Family>;
    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Family>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    /// True when any edge of the family has the user on either end.
    async fn has_member(&self, family_id: Uuid, user_id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait FamilyGraphRepository: Send + Sync {
    async fn find_edge(&self, id: Uuid) -> AppResult<Option<FamilyMemberRow>>;
    async fn edge_exists(&self, family_id: Uuid, user_id: Uuid, related_to: Uuid) -> AppResult<bool>;
    /// Inserts the edges in one transaction. A clash on the first edge is a
    /// conflict; later edges that already exist are skipped.
    async fn insert_edges(&self, edges: &[NewEdge]) -> AppResult<Vec<FamilyMember>>;
    /// Removes both directions between `a` and `b` in the family.
    async fn delete_pair(&self, family_id: Uuid, a: Uuid, b: Uuid) -> AppResult<u64>;
    async fn edges_declared_by(&self, user_id: Uuid) -> AppResult<Vec<FamilyMemberRow>>;
    async fn relabel(&self, id: Uuid, relationship: &str) -> AppResult<()>;
}

const FAMILY_COLUMNS: &str = "id, name, created_by, created_at, updated_at";

const EDGE_ROW_SELECT: &str = r#"
    SELECT fm.id, fm.family_id, fm.user_id, fm.related_to, fm.relationship,
           u.email AS related_to_email,
           u.full_name AS related_to_full_name,
           u.username AS related_to_username
      FROM family_members fm
      JOIN users u ON u.id = fm.related_to
"#;

const INSERT_EDGE: &str = r#"
    INSERT INTO family_members (id, family_id, user_id, related_to, relationship)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, family_id, user_id, related_to, relationship
"#;

const INSERT_EDGE_IF_ABSENT: &str = r#"
    INSERT INTO family_members (id, family_id, user_id, related_to, relationship)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT ON CONSTRAINT family_members_edge_key DO NOTHING
    RETURNING id, family_id, user_id, related_to, relationship
"#;

#[derive(Clone)]
pub struct PgFamilyRepository {
    db: PgPool,
}

impl PgFamilyRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FamilyRepository for PgFamilyRepository {
    async fn find(&self, id: Uuid) -> AppResult<Option<Family>> {
        let family = sqlx::query_as::<_, Family>(&format!(
            "SELECT {FAMILY_COLUMNS} FROM families WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(family)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Family>> {
        let families = sqlx::query_as::<_, Family>(&format!(
            r#"
            SELECT {FAMILY_COLUMNS}
              FROM families f
             WHERE f.created_by = $1
                OR EXISTS (SELECT 1 FROM family_members fm
                            WHERE fm.family_id = f.id
                              AND (fm.user_id = $1 OR fm.related_to = $1))
             ORDER BY f.created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(families)
    }

    async fn create(&self, name: &str, created_by: Uuid) -> AppResult<Family> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            INSERT INTO families (id, name, created_by)
            VALUES ($1, $2, $3)
            RETURNING {FAMILY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;
        Ok(family)
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Family> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            UPDATE families SET name = $2, updated_at = now()
             WHERE id = $1
            RETURNING {FAMILY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;
        Ok(family)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM families WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn has_member(&self, family_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM family_members
                            WHERE family_id = $1 AND (user_id = $2 OR related_to = $2))
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }
}

#[async_trait]
impl FamilyGraphRepository for PgFamilyRepository {
    async fn find_edge(&self, id: Uuid) -> AppResult<Option<FamilyMemberRow>> {
        let row = sqlx::query_as::<_, FamilyMemberRow>(&format!("{EDGE_ROW_SELECT} WHERE fm.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn edge_exists(&self, family_id: Uuid, user_id: Uuid, related_to: Uuid) -> AppResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM family_members
                            WHERE family_id = $1 AND user_id = $2 AND related_to = $3)
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(related_to)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }

    async fn insert_edges(&self, edges: &[NewEdge]) -> AppResult<Vec<FamilyMember>> {
        let mut tx = self.db.begin().await?;
        let mut inserted = Vec::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            // Only the first edge may conflict. Later ones yield to a concurrent insert.
            let sql = if i == 0 { INSERT_EDGE } else { INSERT_EDGE_IF_ABSENT };
            let row = sqlx::query_as::<_, FamilyMember>(sql)
                .bind(Uuid::new_v4())
                .bind(edge.family_id)
                .bind(edge.user_id)
                .bind(edge.related_to)
                .bind(&edge.relationship)
                .fetch_optional(&mut *tx)
                .await?;
            inserted.extend(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete_pair(&self, family_id: Uuid, a: Uuid, b: Uuid) -> AppResult<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM family_members
             WHERE family_id = $1
               AND ((user_id = $2 AND related_to = $3) OR (user_id = $3 AND related_to = $2))
            "#,
        )
        .bind(family_id)
        .bind(a)
        .bind(b)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }

    async fn edges_declared_by(&self, user_id: Uuid) -> AppResult<Vec<FamilyMemberRow>> {
        let rows = sqlx::query_as::<_, FamilyMemberRow>(&format!(
            "{EDGE_ROW_SELECT} WHERE fm.user_id = $1 ORDER BY u.full_name"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn relabel(&self, id: Uuid, relationship: &str) -> AppResult<()> {
        sqlx::query("UPDATE family_members SET relationship = $2 WHERE id = $1")
            .bind(id)
            .bind(relationship)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
