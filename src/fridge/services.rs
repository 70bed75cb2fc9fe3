use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CategoryRequest, FoodRequest, FoodView};
use super::expiry::annotate;
use super::filter::{FoodFilter, FoodQuery};
use super::repo_types::{Category, Compartment, Food, FoodChanges, NewFood};
use crate::{
    dates::{parse_iso_date, today},
    error::{AppError, AppResult, FieldErrors},
    state::AppState,
    validation::{check_text, require},
};

const FOOD_NOT_FOUND: &str = "Food does not exist.";

/// Foods of one compartment matching the query, annotated against today.
pub async fn list_foods(st: &AppState, compartment: &str, query: FoodQuery) -> AppResult<Vec<FoodView>> {
    let filter = FoodFilter::parse(compartment, query).inspect_err(|e| {
        warn!(error = %e, "food filter rejected");
    })?;
    let foods = st.foods.list(&filter).await?;

    let today = today();
    Ok(foods
        .into_iter()
        .map(|food| {
            let (expiry_status, status_color) = annotate(food.expiry_date, today);
            FoodView {
                food,
                expiry_status,
                status_color,
            }
        })
        .collect())
}

/// Validates a write body. With `full`, every required field must be present
/// (create and PUT); otherwise only the provided fields are checked (PATCH).
async fn validate(st: &AppState, req: FoodRequest, full: bool) -> AppResult<FoodChanges> {
    let mut errors = FieldErrors::default();
    if full {
        require(&mut errors, "name", &req.name);
        require(&mut errors, "category", &req.category);
        require(&mut errors, "compartment", &req.compartment);
        require(&mut errors, "location", &req.location);
        require(&mut errors, "quantity", &req.quantity);
        require(&mut errors, "expiry_date", &req.expiry_date);
    }

    let mut changes = FoodChanges::default();
    if let Some(name) = req.name {
        check_text(&mut errors, "name", &name, 100);
        changes.name = Some(name.trim().to_string());
    }
    if let Some(category) = req.category {
        let category = category.trim();
        if category.is_empty() {
            errors.add("category", "This field may not be blank.");
        } else {
            match st.foods.find_category(category).await? {
                Some(found) => changes.category_id = Some(found.id),
                None => errors.add("category", format!("Category '{category}' does not exist.")),
            }
        }
    }
    if let Some(compartment) = req.compartment {
        match Compartment::parse(&compartment) {
            Some(c) => changes.compartment = Some(c),
            None => errors.add(
                "compartment",
                format!("\"{compartment}\" is not a valid choice."),
            ),
        }
    }
    if let Some(location) = req.location {
        check_text(&mut errors, "location", &location, 50);
        changes.location = Some(location.trim().to_string());
    }
    if let Some(quantity) = req.quantity {
        if quantity <= 0 {
            errors.add("quantity", "Quantity must be greater than 0.");
        } else {
            match i32::try_from(quantity) {
                Ok(q) => changes.quantity = Some(q),
                Err(_) => errors.add("quantity", "Quantity is too large."),
            }
        }
    }
    if let Some(raw) = req.expiry_date {
        match parse_iso_date(&raw) {
            Some(d) if d < today() => {
                errors.add("expiry_date", "Expiry date cannot be in the past.")
            }
            Some(d) => changes.expiry_date = Some(d),
            None => errors.add("expiry_date", "Date has wrong format. Use YYYY-MM-DD."),
        }
    }
    if let Some(note) = req.note {
        changes.note = Some(note);
    }

    if !errors.is_empty() {
        warn!(?errors, "food rejected");
    }
    errors.into_result()?;
    Ok(changes)
}

pub async fn add_food(st: &AppState, req: FoodRequest) -> AppResult<Food> {
    let changes = validate(st, req, true).await?;
    let FoodChanges {
        name: Some(name),
        category_id: Some(category_id),
        compartment: Some(compartment),
        location: Some(location),
        quantity: Some(quantity),
        expiry_date: Some(expiry_date),
        note,
    } = changes
    else {
        return Err(AppError::validation("Invalid input."));
    };

    let food = st
        .foods
        .create(NewFood {
            name,
            category_id,
            compartment,
            location,
            quantity,
            registered_date: today(),
            expiry_date,
            note: note.unwrap_or_default(),
        })
        .await?;
    info!(food_id = %food.id, name = %food.name, "food added");
    Ok(food)
}

/// `partial` distinguishes PATCH from PUT.
pub async fn update_food(st: &AppState, id: Uuid, req: FoodRequest, partial: bool) -> AppResult<Food> {
    if st.foods.find(id).await?.is_none() {
        return Err(AppError::not_found(FOOD_NOT_FOUND));
    }
    let changes = validate(st, req, !partial).await?;
    let food = st.foods.update(id, &changes).await?;
    info!(food_id = %food.id, "food updated");
    Ok(food)
}

pub async fn delete_food(st: &AppState, id: Uuid) -> AppResult<()> {
    if !st.foods.delete(id).await? {
        return Err(AppError::not_found(FOOD_NOT_FOUND));
    }
    info!(food_id = %id, "food deleted");
    Ok(())
}

pub async fn add_category(st: &AppState, req: CategoryRequest) -> AppResult<Category> {
    let mut errors = FieldErrors::default();
    let name = require(&mut errors, "name", &req.name).map(|n| n.trim().to_string());
    if let Some(name) = &name {
        check_text(&mut errors, "name", name, 50);
    }
    errors.into_result()?;
    let Some(name) = name else {
        return Err(AppError::validation("Invalid input."));
    };

    let category = st.foods.create_category(&name).await?;
    info!(category_id = %category.id, name = %category.name, "category added");
    Ok(category)
}

pub async fn list_categories(st: &AppState) -> AppResult<Vec<Category>> {
    st.foods.list_categories().await
}
