use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{AddMemberRequest, FamilyMemberResponse, FamilyRequest, RelabelRequest};
use super::repo_types::{Family, NewEdge};
use crate::{
    error::{AppError, AppResult, FieldErrors},
    state::AppState,
    validation::{check_text, require},
};

/// Label given to the reverse edge when the target had not declared one.
pub const RECIPROCAL_RELATIONSHIP: &str = "acquaintance";

const EDGE_NOT_FOUND: &str = "Family member not found.";
const FAMILY_NOT_FOUND: &str = "Family does not exist.";

/// Creator of the family, or present in any of its edges.
pub async fn belongs_to(st: &AppState, family: &Family, user_id: Uuid) -> AppResult<bool> {
    if family.created_by == Some(user_id) {
        return Ok(true);
    }
    st.families.has_member(family.id, user_id).await
}

fn check_relationship(errors: &mut FieldErrors, relationship: &str) {
    check_text(errors, "relationship", relationship, 50);
}

/// Declares `actor -> target` and ensures a reverse edge exists.
pub async fn add_edge(
    st: &AppState,
    actor: Uuid,
    req: AddMemberRequest,
) -> AppResult<FamilyMemberResponse> {
    let mut errors = FieldErrors::default();
    let family_id = require(&mut errors, "familyId", &req.family_id).copied();
    let email = require(&mut errors, "email", &req.email).map(|e| e.trim().to_lowercase());
    let relationship = require(&mut errors, "relationship", &req.relationship)
        .map(|r| r.trim().to_string());
    if let Some(relationship) = &relationship {
        check_relationship(&mut errors, relationship);
    }
    errors.into_result()?;
    let (Some(family_id), Some(email), Some(relationship)) = (family_id, email, relationship)
    else {
        return Err(AppError::validation("Invalid input."));
    };

    let family = st
        .families
        .find(family_id)
        .await?
        .ok_or_else(|| AppError::not_found(FAMILY_NOT_FOUND))?;
    let target = st
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User with this email does not exist."))?;

    if !belongs_to(st, &family, actor).await? {
        warn!(%actor, family_id = %family.id, "edge creation outside own family");
        return Err(AppError::PermissionDenied(
            "You are not a member of this family.".into(),
        ));
    }
    if st
        .family_graph
        .edge_exists(family.id, actor, target.id)
        .await?
    {
        return Err(AppError::Conflict(
            "User is already a member of this family.".into(),
        ));
    }

    let mut edges = vec![NewEdge {
        family_id: family.id,
        user_id: actor,
        related_to: target.id,
        relationship,
    }];
    let has_reverse = st
        .family_graph
        .edge_exists(family.id, target.id, actor)
        .await?;
    let reciprocal = !has_reverse && target.id != actor;
    if reciprocal {
        edges.push(NewEdge {
            family_id: family.id,
            user_id: target.id,
            related_to: actor,
            relationship: RECIPROCAL_RELATIONSHIP.into(),
        });
    }

    let inserted = st.family_graph.insert_edges(&edges).await?;
    let forward = inserted
        .first()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("edge insert returned no rows")))?;
    info!(
        family_id = %family.id,
        %actor,
        related_to = %target.id,
        reciprocal,
        "family edge created"
    );

    edge_for(st, actor, forward.id).await
}

/// Loads an edge the actor declared; anything else is reported as missing.
async fn edge_for(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<FamilyMemberResponse> {
    match st.family_graph.find_edge(id).await? {
        Some(row) if row.user_id == actor => Ok(row.into()),
        _ => Err(AppError::not_found(EDGE_NOT_FOUND)),
    }
}

pub async fn list_edges(st: &AppState, actor: Uuid) -> AppResult<Vec<FamilyMemberResponse>> {
    let rows = st.family_graph.edges_declared_by(actor).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_edge(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<FamilyMemberResponse> {
    edge_for(st, actor, id).await
}

/// Changes the label of one edge; the reverse edge keeps its own label.
pub async fn relabel_edge(
    st: &AppState,
    actor: Uuid,
    id: Uuid,
    req: RelabelRequest,
) -> AppResult<FamilyMemberResponse> {
    let edge = edge_for(st, actor, id).await?;
    let mut errors = FieldErrors::default();
    let relationship = require(&mut errors, "relationship", &req.relationship)
        .map(|r| r.trim().to_string());
    if let Some(relationship) = &relationship {
        check_relationship(&mut errors, relationship);
    }
    errors.into_result()?;
    let Some(relationship) = relationship else {
        return Err(AppError::validation("Invalid input."));
    };

    st.family_graph.relabel(edge.id, &relationship).await?;
    edge_for(st, actor, edge.id).await
}

/// Deletes the edge and its reverse.
pub async fn remove_edge(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<()> {
    let edge = edge_for(st, actor, id).await?;
    let removed = st
        .family_graph
        .delete_pair(edge.family_id, edge.user_id, edge.related_to)
        .await?;
    info!(family_id = %edge.family_id, %actor, related_to = %edge.related_to, removed, "family edge removed");
    Ok(())
}

fn family_name(req: &FamilyRequest) -> AppResult<String> {
    let mut errors = FieldErrors::default();
    let name = require(&mut errors, "name", &req.name).map(|n| n.trim().to_string());
    if let Some(name) = &name {
        check_text(&mut errors, "name", name, 100);
    }
    errors.into_result()?;
    name.ok_or_else(|| AppError::validation("Invalid input."))
}

pub async fn list_families(st: &AppState, actor: Uuid) -> AppResult<Vec<Family>> {
    st.families.list_for_user(actor).await
}

pub async fn create_family(st: &AppState, actor: Uuid, req: FamilyRequest) -> AppResult<Family> {
    let name = family_name(&req)?;
    let family = st.families.create(&name, actor).await?;
    info!(family_id = %family.id, %actor, "family created");
    Ok(family)
}

/// A family visible to the actor, else `NotFound`.
pub async fn get_family(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<Family> {
    let family = st
        .families
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(FAMILY_NOT_FOUND))?;
    if !belongs_to(st, &family, actor).await? {
        return Err(AppError::not_found(FAMILY_NOT_FOUND));
    }
    Ok(family)
}

pub async fn rename_family(
    st: &AppState,
    actor: Uuid,
    id: Uuid,
    req: FamilyRequest,
) -> AppResult<Family> {
    let family = get_family(st, actor, id).await?;
    let name = family_name(&req)?;
    st.families.rename(family.id, &name).await
}

pub async fn delete_family(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<()> {
    let family = get_family(st, actor, id).await?;
    st.families.delete(family.id).await?;
    info!(family_id = %family.id, %actor, "family deleted");
    Ok(())
}
