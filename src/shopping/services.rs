use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{ItemRequest, SearchQuery, ShoppingListRequest};
use super::query;
use super::repo_types::{
    ItemChanges, ItemStatus, NewItem, NewShoppingList, ShoppingList, ShoppingListChanges,
    ShoppingListItem,
};
use crate::{
    dates::parse_iso_date,
    error::{AppError, AppResult, FieldErrors},
    family::services::belongs_to,
    state::AppState,
    validation::{check_max_len, check_text, require},
};

pub const DEFAULT_LIST_NAME: &str = "My Shopping List";

const NOT_FOUND: &str = "Not found.";
const MAX_QUANTITY: i64 = 100_000_000;

fn invalid_pk(id: Uuid) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Creator, a member of the owning family, or a user the list is shared with.
pub async fn can_access(st: &AppState, list: &ShoppingList, user_id: Uuid) -> AppResult<bool> {
    if list.created_by == user_id || list.shared_with.contains(&user_id) {
        return Ok(true);
    }
    let Some(family_id) = list.family_id else {
        return Ok(false);
    };
    match st.families.find(family_id).await? {
        Some(family) => belongs_to(st, &family, user_id).await,
        None => Ok(false),
    }
}

async fn visible_lists(st: &AppState, actor: Uuid) -> AppResult<Vec<ShoppingList>> {
    let family_ids: Vec<Uuid> = st
        .families
        .list_for_user(actor)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();
    st.shopping.lists_for(actor, &family_ids).await
}

async fn accessible_list(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<ShoppingList> {
    match st.shopping.find_list(id).await? {
        Some(list) if can_access(st, &list, actor).await? => Ok(list),
        _ => {
            debug!(%actor, list_id = %id, "shopping list not visible");
            Err(AppError::not_found(NOT_FOUND))
        }
    }
}

pub async fn list_lists(
    st: &AppState,
    actor: Uuid,
    q: SearchQuery,
) -> AppResult<Vec<ShoppingList>> {
    let lists = visible_lists(st, actor).await?;
    Ok(query::apply(lists, &q))
}

pub async fn get_list(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<ShoppingList> {
    accessible_list(st, actor, id).await
}

/// Checks a list body; outer `None`s in the result leave columns untouched.
async fn validate_list(
    st: &AppState,
    actor: Uuid,
    req: ShoppingListRequest,
) -> AppResult<ShoppingListChanges> {
    let mut errors = FieldErrors::default();
    let mut changes = ShoppingListChanges::default();

    if let Some(name) = &req.name {
        check_text(&mut errors, "name", name, 100);
        changes.name = Some(name.trim().to_string());
    }
    match req.date {
        Some(Some(raw)) => match parse_iso_date(&raw) {
            Some(date) => changes.date = Some(Some(date)),
            None => errors.add(
                "date",
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            ),
        },
        Some(None) => changes.date = Some(None),
        None => {}
    }
    if let Some(week) = req.week {
        let week = week.map(|w| w.trim().to_string()).filter(|w| !w.is_empty());
        if let Some(w) = &week {
            check_max_len(&mut errors, "week", w, 10);
        }
        changes.week = Some(week);
    }
    match req.family_id {
        Some(Some(family_id)) => match st.families.find(family_id).await? {
            Some(family) if belongs_to(st, &family, actor).await? => {
                changes.family_id = Some(Some(family.id));
            }
            Some(_) => errors.add("family_id", "You are not a member of this family."),
            None => errors.add("family_id", invalid_pk(family_id)),
        },
        Some(None) => changes.family_id = Some(None),
        None => {}
    }
    if let Some(ids) = req.shared_with_ids {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        let existing: HashSet<Uuid> = st.users.existing_ids(&ids).await?.into_iter().collect();
        for id in ids.iter().filter(|id| !existing.contains(id)) {
            errors.add("shared_with_ids", invalid_pk(*id));
        }
        changes.shared_with = Some(ids);
    }

    errors.into_result()?;
    Ok(changes)
}

pub async fn create_list(
    st: &AppState,
    actor: Uuid,
    req: ShoppingListRequest,
) -> AppResult<ShoppingList> {
    let changes = validate_list(st, actor, req).await?;
    let list = st
        .shopping
        .create_list(NewShoppingList {
            family_id: changes.family_id.flatten(),
            created_by: actor,
            name: changes.name.unwrap_or_else(|| DEFAULT_LIST_NAME.to_string()),
            date: changes.date.flatten(),
            week: changes.week.flatten(),
            shared_with: changes.shared_with.unwrap_or_default(),
        })
        .await?;
    info!(list_id = %list.id, %actor, shares = list.shared_with.len(), "shopping list created");
    Ok(list)
}

pub async fn update_list(
    st: &AppState,
    actor: Uuid,
    id: Uuid,
    req: ShoppingListRequest,
) -> AppResult<ShoppingList> {
    let list = accessible_list(st, actor, id).await?;
    let changes = validate_list(st, actor, req).await?;
    st.shopping.update_list(list.id, &changes).await
}

pub async fn delete_list(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<()> {
    let list = accessible_list(st, actor, id).await?;
    st.shopping.delete_list(list.id).await?;
    info!(list_id = %list.id, %actor, "shopping list deleted");
    Ok(())
}

pub async fn list_items(
    st: &AppState,
    actor: Uuid,
    q: SearchQuery,
) -> AppResult<Vec<ShoppingListItem>> {
    let list_ids: Vec<Uuid> = visible_lists(st, actor)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    let items = st.shopping.items_in(&list_ids).await?;
    Ok(query::apply(items, &q))
}

async fn accessible_item(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<ShoppingListItem> {
    let item = st
        .shopping
        .find_item(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    accessible_list(st, actor, item.shopping_list_id).await?;
    Ok(item)
}

pub async fn get_item(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<ShoppingListItem> {
    accessible_item(st, actor, id).await
}

fn check_quantity(errors: &mut FieldErrors, quantity: Decimal) {
    if quantity <= Decimal::ZERO {
        errors.add("quantity", "Ensure this value is greater than 0.");
    } else if quantity.normalize().scale() > 2 {
        errors.add("quantity", "Ensure that there are no more than 2 decimal places.");
    } else if quantity >= Decimal::from(MAX_QUANTITY) {
        errors.add("quantity", "Ensure that there are no more than 10 digits in total.");
    }
}

/// `full` demands every required field, as PUT does.
async fn validate_item(
    st: &AppState,
    actor: Uuid,
    req: ItemRequest,
    full: bool,
) -> AppResult<ItemChanges> {
    let mut errors = FieldErrors::default();
    if full {
        require(&mut errors, "shopping_list_id", &req.shopping_list_id);
        require(&mut errors, "item", &req.item);
        require(&mut errors, "quantity", &req.quantity);
    }
    let mut changes = ItemChanges::default();

    if let Some(list_id) = req.shopping_list_id {
        match st.shopping.find_list(list_id).await? {
            Some(list) if can_access(st, &list, actor).await? => {
                changes.shopping_list_id = Some(list.id);
            }
            _ => errors.add("shopping_list_id", invalid_pk(list_id)),
        }
    }
    if let Some(item) = &req.item {
        check_text(&mut errors, "item", item, 100);
        changes.item = Some(item.trim().to_string());
    }
    if let Some(quantity) = req.quantity {
        check_quantity(&mut errors, quantity);
        changes.quantity = Some(quantity);
    }
    if let Some(category) = req.category {
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(c) = &category {
            check_max_len(&mut errors, "category", c, 50);
        }
        changes.category = Some(category);
    }
    if let Some(raw) = &req.status {
        match ItemStatus::parse(raw) {
            Some(status) => changes.status = Some(status),
            None => errors.add("status", format!("\"{raw}\" is not a valid choice.")),
        }
    }

    errors.into_result()?;
    Ok(changes)
}

pub async fn create_item(
    st: &AppState,
    actor: Uuid,
    req: ItemRequest,
) -> AppResult<ShoppingListItem> {
    let changes = validate_item(st, actor, req, true).await?;
    let (Some(shopping_list_id), Some(item), Some(quantity)) =
        (changes.shopping_list_id, changes.item, changes.quantity)
    else {
        return Err(AppError::validation("Invalid input."));
    };
    let created = st
        .shopping
        .create_item(NewItem {
            shopping_list_id,
            item,
            quantity,
            category: changes.category.flatten(),
            status: changes.status.unwrap_or(ItemStatus::Pending),
        })
        .await?;
    info!(item_id = %created.id, list_id = %shopping_list_id, %actor, "shopping item added");
    Ok(created)
}

pub async fn update_item(
    st: &AppState,
    actor: Uuid,
    id: Uuid,
    req: ItemRequest,
    partial: bool,
) -> AppResult<ShoppingListItem> {
    let item = accessible_item(st, actor, id).await?;
    let changes = validate_item(st, actor, req, !partial).await?;
    st.shopping.update_item(item.id, &changes).await
}

pub async fn delete_item(st: &AppState, actor: Uuid, id: Uuid) -> AppResult<()> {
    let item = accessible_item(st, actor, id).await?;
    st.shopping.delete_item(item.id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{
        dto::{AddMemberRequest, FamilyRequest},
        services as family,
    };
    use crate::testing::register_user;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn named(name: &str) -> ShoppingListRequest {
        ShoppingListRequest {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn milk(list: &ShoppingList, quantity: &str) -> ItemRequest {
        ItemRequest {
            shopping_list_id: Some(list.id),
            item: Some("Milk".into()),
            quantity: Some(dec(quantity)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn lists_default_their_name_and_status() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let list = create_list(&st, anna.id, ShoppingListRequest::default())
            .await
            .unwrap();
        assert_eq!(list.name, DEFAULT_LIST_NAME);
        assert_eq!(list.created_by, anna.id);

        let item = create_item(&st, anna.id, milk(&list, "1.5")).await.unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.quantity, dec("1.5"));
    }

    #[tokio::test]
    async fn strangers_cannot_see_or_touch_a_list() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let eve = register_user(&st, "eve").await;
        let list = create_list(&st, anna.id, named("Groceries")).await.unwrap();
        let item = create_item(&st, anna.id, milk(&list, "1")).await.unwrap();

        assert!(list_lists(&st, eve.id, SearchQuery::default()).await.unwrap().is_empty());
        assert!(list_items(&st, eve.id, SearchQuery::default()).await.unwrap().is_empty());
        assert!(matches!(get_list(&st, eve.id, list.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(get_item(&st, eve.id, item.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            delete_list(&st, eve.id, list.id).await,
            Err(AppError::NotFound(_))
        ));

        // an inaccessible parent is reported against the field
        let err = create_item(&st, eve.id, milk(&list, "1")).await.unwrap_err();
        match err {
            AppError::Validation { errors, .. } => {
                assert!(errors.get("shopping_list_id").is_some())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn sharing_and_family_membership_grant_access() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let bea = register_user(&st, "bea").await;
        let carl = register_user(&st, "carl").await;

        let shared = create_list(
            &st,
            anna.id,
            ShoppingListRequest {
                shared_with_ids: Some(vec![carl.id, carl.id]),
                ..named("Party")
            },
        )
        .await
        .unwrap();
        assert_eq!(shared.shared_with, vec![carl.id]);
        assert_eq!(get_list(&st, carl.id, shared.id).await.unwrap().id, shared.id);

        let fam = family::create_family(&st, anna.id, FamilyRequest { name: Some("Smith".into()) })
            .await
            .unwrap();
        family::add_edge(
            &st,
            anna.id,
            AddMemberRequest {
                family_id: Some(fam.id),
                email: Some(bea.email.clone()),
                relationship: Some("sister".into()),
            },
        )
        .await
        .unwrap();
        let household = create_list(
            &st,
            anna.id,
            ShoppingListRequest {
                family_id: Some(Some(fam.id)),
                ..named("Household")
            },
        )
        .await
        .unwrap();

        let seen: Vec<String> = list_lists(&st, bea.id, SearchQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(seen, vec!["Household".to_string()]);
        create_item(&st, bea.id, milk(&household, "2")).await.unwrap();

        // carl is neither in the family nor allowed to attach it
        let err = create_list(
            &st,
            carl.id,
            ShoppingListRequest {
                family_id: Some(Some(fam.id)),
                ..named("Mine")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn updates_replace_shares_and_clear_fields() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let bea = register_user(&st, "bea").await;
        let list = create_list(
            &st,
            anna.id,
            ShoppingListRequest {
                week: Some(Some("2024-W21".into())),
                date: Some(Some("2024-05-25".into())),
                shared_with_ids: Some(vec![bea.id]),
                ..named("BBQ")
            },
        )
        .await
        .unwrap();

        let updated = update_list(
            &st,
            anna.id,
            list.id,
            ShoppingListRequest {
                week: Some(None),
                shared_with_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "BBQ");
        assert_eq!(updated.week, None);
        assert_eq!(updated.date, list.date);
        assert!(updated.shared_with.is_empty());
        assert!(matches!(get_list(&st, bea.id, list.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn bad_list_fields_are_reported() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let err = create_list(
            &st,
            anna.id,
            ShoppingListRequest {
                date: Some(Some("25/05/2024".into())),
                week: Some(Some("far too long week".into())),
                shared_with_ids: Some(vec![Uuid::new_v4()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        let AppError::Validation { errors, .. } = err else {
            panic!("expected validation error");
        };
        for field in ["date", "week", "shared_with_ids"] {
            assert!(errors.get(field).is_some(), "{field}");
        }
    }

    #[tokio::test]
    async fn item_quantity_and_status_are_checked() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let list = create_list(&st, anna.id, named("Groceries")).await.unwrap();

        for bad in ["0", "-1", "0.125", "100000000"] {
            assert!(
                create_item(&st, anna.id, milk(&list, bad)).await.is_err(),
                "{bad}"
            );
        }
        create_item(&st, anna.id, milk(&list, "0.10")).await.unwrap();

        let mut req = milk(&list, "1");
        req.status = Some("lost".into());
        assert!(create_item(&st, anna.id, req).await.is_err());
    }

    #[tokio::test]
    async fn put_needs_every_item_field_patch_does_not() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let list = create_list(&st, anna.id, named("Groceries")).await.unwrap();
        let item = create_item(&st, anna.id, milk(&list, "1")).await.unwrap();

        let only_status = || ItemRequest {
            status: Some("bought".into()),
            ..Default::default()
        };
        assert!(update_item(&st, anna.id, item.id, only_status(), false).await.is_err());
        let bought = update_item(&st, anna.id, item.id, only_status(), true)
            .await
            .unwrap();
        assert_eq!(bought.status, ItemStatus::Bought);
        assert_eq!(bought.item, "Milk");
    }

    #[tokio::test]
    async fn deleting_a_list_removes_its_items() {
        let st = AppState::fake();
        let anna = register_user(&st, "anna").await;
        let list = create_list(&st, anna.id, named("Groceries")).await.unwrap();
        let item = create_item(&st, anna.id, milk(&list, "1")).await.unwrap();

        delete_list(&st, anna.id, list.id).await.unwrap();
        assert!(matches!(get_item(&st, anna.id, item.id).await, Err(AppError::NotFound(_))));
    }
}
