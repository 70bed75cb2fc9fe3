use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::FamilyMemberRow;

/// Body of `POST /family-members/`; clients send `familyId`.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    #[serde(rename = "familyId", alias = "family_id")]
    pub family_id: Option<Uuid>,
    pub email: Option<String>,
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelabelRequest {
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FamilyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FamilyMemberResponse {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub related_to: Uuid,
    pub relationship: String,
    pub related_to_email: String,
    pub related_to_name: String,
}

impl From<FamilyMemberRow> for FamilyMemberResponse {
    fn from(row: FamilyMemberRow) -> Self {
        let related_to_name = [
            &row.related_to_full_name,
            &row.related_to_username,
            &row.related_to_email,
        ]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_default();

        Self {
            id: row.id,
            family_id: row.family_id,
            user_id: row.user_id,
            related_to: row.related_to,
            relationship: row.relationship,
            related_to_email: row.related_to_email,
            related_to_name,
        }
    }
}
