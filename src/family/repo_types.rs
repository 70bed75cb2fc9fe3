use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Directed edge: `user_id` calls `related_to` by `relationship` within `family_id`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FamilyMember {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub related_to: Uuid,
    pub relationship: String,
}

#[derive(Debug, Clone)]
pub struct NewEdge {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub related_to: Uuid,
    pub relationship: String,
}

/// Edge joined with the target user's contact fields.
#[derive(Debug, Clone, FromRow)]
pub struct FamilyMemberRow {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub related_to: Uuid,
    pub relationship: String,
    pub related_to_email: String,
    pub related_to_full_name: String,
    pub related_to_username: String,
}
