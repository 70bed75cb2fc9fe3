//! In-memory repositories and fixtures for service and router tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    auth::repo::TokenBlacklist,
    error::{AppError, AppResult},
    family::{
        repo::{FamilyGraphRepository, FamilyRepository},
        repo_types::{Family, FamilyMember, FamilyMemberRow, NewEdge},
    },
    fridge::{
        filter::FoodFilter,
        repo::FoodRepository,
        repo_types::{Category, Food, FoodChanges, NewFood},
    },
    meal_plans::{
        repo::{MealPlanRepository, RecipeRepository},
        repo_types::{MealPlan, MealPlanChanges, NewMealPlan, NewRecipe, Recipe, RecipeChanges},
    },
    shopping::{
        repo::ShoppingRepository,
        repo_types::{
            ItemChanges, NewItem, NewShoppingList, ShoppingList, ShoppingListChanges,
            ShoppingListItem,
        },
    },
    state::AppState,
    storage::StorageClient,
    users::{
        dto::RegisterRequest,
        repo::UserRepository,
        repo_types::{NewUser, User, UserChanges},
        services as users,
    },
    validation::icontains,
};

struct StoredPlan {
    id: Uuid,
    date: Date,
    day_of_week: String,
    meal_type: String,
    recipe_id: Uuid,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    revoked: HashSet<Uuid>,
    families: Vec<Family>,
    edges: Vec<FamilyMember>,
    categories: Vec<Category>,
    foods: Vec<Food>,
    recipes: Vec<Recipe>,
    plans: Vec<StoredPlan>,
    lists: Vec<ShoppingList>,
    items: Vec<ShoppingListItem>,
}

impl Tables {
    fn edge_row(&self, edge: &FamilyMember) -> Option<FamilyMemberRow> {
        let target = self.users.iter().find(|u| u.id == edge.related_to)?;
        Some(FamilyMemberRow {
            id: edge.id,
            family_id: edge.family_id,
            user_id: edge.user_id,
            related_to: edge.related_to,
            relationship: edge.relationship.clone(),
            related_to_email: target.email.clone(),
            related_to_full_name: target.full_name.clone(),
            related_to_username: target.username.clone(),
        })
    }

    fn plan(&self, plan: &StoredPlan) -> Option<MealPlan> {
        let recipe = self.recipes.iter().find(|r| r.id == plan.recipe_id)?;
        Some(MealPlan {
            id: plan.id,
            date: plan.date,
            day_of_week: plan.day_of_week.clone(),
            meal_type: plan.meal_type.clone(),
            recipe: recipe.clone(),
        })
    }

    fn delete_lists(&mut self, doomed: impl Fn(&ShoppingList) -> bool) {
        let ids: HashSet<Uuid> = self.lists.iter().filter(|l| doomed(l)).map(|l| l.id).collect();
        self.lists.retain(|l| !ids.contains(&l.id));
        self.items.retain(|i| !ids.contains(&i.shopping_list_id));
    }
}

/// Every repository trait over one set of tables, with the schema's unique
/// constraints and cascades emulated.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

fn missing() -> AppError {
    AppError::not_found("Not found.")
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("A user with that username already exists.".into()));
        }
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "A user with that email address already exists.".into(),
            ));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            age: user.age,
            phone_number: user.phone_number,
            address: user.address,
            is_admin: user.is_admin,
            password_hash: user.password_hash,
            created_at: now(),
            updated_at: now(),
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<User> {
        let mut t = self.lock();
        let user = t.users.iter_mut().find(|u| u.id == id).ok_or_else(missing)?;
        if let Some(v) = &changes.username {
            user.username = v.clone();
        }
        if let Some(v) = &changes.full_name {
            user.full_name = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = changes.age {
            user.age = Some(v);
        }
        if let Some(v) = &changes.phone_number {
            user.phone_number = Some(v.clone());
        }
        if let Some(v) = &changes.address {
            user.address = Some(v.clone());
        }
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        for family in t.families.iter_mut().filter(|f| f.created_by == Some(id)) {
            family.created_by = None;
        }
        t.edges.retain(|e| e.user_id != id && e.related_to != id);
        t.delete_lists(|l| l.created_by == id);
        for list in t.lists.iter_mut() {
            list.shared_with.retain(|u| *u != id);
        }
        Ok(true)
    }

    async fn existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        let t = self.lock();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| t.users.iter().any(|u| u.id == *id))
            .collect())
    }
}

#[async_trait]
impl TokenBlacklist for MemoryStore {
    async fn revoke(&self, jti: Uuid, _user_id: Uuid, _expires_at: OffsetDateTime) -> AppResult<()> {
        self.lock().revoked.insert(jti);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.lock().revoked.contains(&jti))
    }
}

#[async_trait]
impl FamilyRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Family>> {
        Ok(self.lock().families.iter().find(|f| f.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Family>> {
        let t = self.lock();
        Ok(t.families
            .iter()
            .filter(|f| {
                f.created_by == Some(user_id)
                    || t.edges.iter().any(|e| {
                        e.family_id == f.id && (e.user_id == user_id || e.related_to == user_id)
                    })
            })
            .cloned()
            .collect())
    }

    async fn create(&self, name: &str, created_by: Uuid) -> AppResult<Family> {
        let mut t = self.lock();
        if t.families.iter().any(|f| f.name == name) {
            return Err(AppError::Conflict(
                "family with this family name already exists.".into(),
            ));
        }
        let family = Family {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by: Some(created_by),
            created_at: now(),
            updated_at: now(),
        };
        t.families.push(family.clone());
        Ok(family)
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Family> {
        let mut t = self.lock();
        if t.families.iter().any(|f| f.name == name && f.id != id) {
            return Err(AppError::Conflict(
                "family with this family name already exists.".into(),
            ));
        }
        let family = t.families.iter_mut().find(|f| f.id == id).ok_or_else(missing)?;
        family.name = name.to_string();
        family.updated_at = now();
        Ok(family.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.families.len();
        t.families.retain(|f| f.id != id);
        t.edges.retain(|e| e.family_id != id);
        t.delete_lists(|l| l.family_id == Some(id));
        Ok(t.families.len() < before)
    }

    async fn has_member(&self, family_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.lock().edges.iter().any(|e| {
            e.family_id == family_id && (e.user_id == user_id || e.related_to == user_id)
        }))
    }
}

#[async_trait]
impl FamilyGraphRepository for MemoryStore {
    async fn find_edge(&self, id: Uuid) -> AppResult<Option<FamilyMemberRow>> {
        let t = self.lock();
        Ok(t.edges.iter().find(|e| e.id == id).and_then(|e| t.edge_row(e)))
    }

    async fn edge_exists(&self, family_id: Uuid, user_id: Uuid, related_to: Uuid) -> AppResult<bool> {
        Ok(self.lock().edges.iter().any(|e| {
            e.family_id == family_id && e.user_id == user_id && e.related_to == related_to
        }))
    }

    async fn insert_edges(&self, edges: &[NewEdge]) -> AppResult<Vec<FamilyMember>> {
        let mut t = self.lock();
        let exists = |t: &Tables, n: &NewEdge| {
            t.edges.iter().any(|e| {
                e.family_id == n.family_id && e.user_id == n.user_id && e.related_to == n.related_to
            })
        };
        if edges.first().is_some_and(|n| exists(&*t, n)) {
            return Err(AppError::Conflict("User is already a member of this family.".into()));
        }
        let mut inserted = Vec::with_capacity(edges.len());
        for n in edges {
            if exists(&*t, n) {
                continue;
            }
            let edge = FamilyMember {
                id: Uuid::new_v4(),
                family_id: n.family_id,
                user_id: n.user_id,
                related_to: n.related_to,
                relationship: n.relationship.clone(),
            };
            t.edges.push(edge.clone());
            inserted.push(edge);
        }
        Ok(inserted)
    }

    async fn delete_pair(&self, family_id: Uuid, a: Uuid, b: Uuid) -> AppResult<u64> {
        let mut t = self.lock();
        let before = t.edges.len();
        t.edges.retain(|e| {
            !(e.family_id == family_id
                && ((e.user_id == a && e.related_to == b) || (e.user_id == b && e.related_to == a)))
        });
        Ok((before - t.edges.len()) as u64)
    }

    async fn edges_declared_by(&self, user_id: Uuid) -> AppResult<Vec<FamilyMemberRow>> {
        let t = self.lock();
        let mut rows: Vec<FamilyMemberRow> = t
            .edges
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| t.edge_row(e))
            .collect();
        rows.sort_by(|a, b| a.related_to_full_name.cmp(&b.related_to_full_name));
        Ok(rows)
    }

    async fn relabel(&self, id: Uuid, relationship: &str) -> AppResult<()> {
        let mut t = self.lock();
        let edge = t.edges.iter_mut().find(|e| e.id == id).ok_or_else(missing)?;
        edge.relationship = relationship.to_string();
        Ok(())
    }
}

#[async_trait]
impl FoodRepository for MemoryStore {
    async fn list(&self, filter: &FoodFilter) -> AppResult<Vec<Food>> {
        let t = self.lock();
        let mut foods: Vec<Food> = t.foods.iter().filter(|f| filter.matches(f)).cloned().collect();
        foods.sort_by(|a, b| (a.expiry_date, &a.name).cmp(&(b.expiry_date, &b.name)));
        Ok(foods)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Food>> {
        Ok(self.lock().foods.iter().find(|f| f.id == id).cloned())
    }

    async fn create(&self, food: NewFood) -> AppResult<Food> {
        let mut t = self.lock();
        let category = t
            .categories
            .iter()
            .find(|c| c.id == food.category_id)
            .ok_or_else(|| AppError::validation("Referenced object does not exist."))?
            .name
            .clone();
        let created = Food {
            id: Uuid::new_v4(),
            name: food.name,
            category_id: food.category_id,
            category,
            compartment: food.compartment,
            location: food.location,
            quantity: food.quantity,
            registered_date: food.registered_date,
            expiry_date: food.expiry_date,
            note: food.note,
        };
        t.foods.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &FoodChanges) -> AppResult<Food> {
        let mut t = self.lock();
        let category = match changes.category_id {
            Some(cid) => Some(
                t.categories
                    .iter()
                    .find(|c| c.id == cid)
                    .ok_or_else(|| AppError::validation("Referenced object does not exist."))?
                    .clone(),
            ),
            None => None,
        };
        let food = t.foods.iter_mut().find(|f| f.id == id).ok_or_else(missing)?;
        if let Some(c) = category {
            food.category_id = c.id;
            food.category = c.name;
        }
        if let Some(v) = &changes.name {
            food.name = v.clone();
        }
        if let Some(v) = changes.compartment {
            food.compartment = v;
        }
        if let Some(v) = &changes.location {
            food.location = v.clone();
        }
        if let Some(v) = changes.quantity {
            food.quantity = v;
        }
        if let Some(v) = changes.expiry_date {
            food.expiry_date = v;
        }
        if let Some(v) = &changes.note {
            food.note = v.clone();
        }
        Ok(food.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.foods.len();
        t.foods.retain(|f| f.id != id);
        Ok(t.foods.len() < before)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
            .cloned())
    }

    async fn create_category(&self, name: &str) -> AppResult<Category> {
        let mut t = self.lock();
        if t.categories.iter().any(|c| c.name == name) {
            return Err(AppError::Conflict("Category name already exists.".into()));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        t.categories.push(category.clone());
        Ok(category)
    }
}

fn recipe_matches(recipe: &Recipe, search: Option<&str>) -> bool {
    match search {
        Some(term) => [&recipe.title, &recipe.ingredients, &recipe.instructions]
            .into_iter()
            .any(|field| icontains(field, term)),
        None => true,
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn count(&self, search: Option<&str>) -> AppResult<i64> {
        let t = self.lock();
        Ok(t.recipes.iter().filter(|r| recipe_matches(r, search)).count() as i64)
    }

    async fn page(&self, search: Option<&str>, limit: i64, offset: i64) -> AppResult<Vec<Recipe>> {
        let t = self.lock();
        Ok(t.recipes
            .iter()
            .filter(|r| recipe_matches(r, search))
            .skip(usize::try_from(offset).unwrap_or_default())
            .take(usize::try_from(limit).unwrap_or_default())
            .cloned()
            .collect())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        Ok(self.lock().recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, recipe: NewRecipe) -> AppResult<Recipe> {
        let created = Recipe {
            id: Uuid::new_v4(),
            title: recipe.title,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            image_name: recipe.image_name,
            cleaned_ingredients: None,
            img_url: recipe.img_url,
            created_at: now(),
        };
        self.lock().recipes.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &RecipeChanges) -> AppResult<Recipe> {
        let mut t = self.lock();
        let recipe = t.recipes.iter_mut().find(|r| r.id == id).ok_or_else(missing)?;
        if let Some(v) = &changes.title {
            recipe.title = v.clone();
        }
        if let Some(v) = &changes.ingredients {
            recipe.ingredients = v.clone();
        }
        if let Some(v) = &changes.instructions {
            recipe.instructions = v.clone();
        }
        if let Some(v) = &changes.image_name {
            recipe.image_name = Some(v.clone());
        }
        if let Some(v) = &changes.img_url {
            recipe.img_url = Some(v.clone());
        }
        Ok(recipe.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.recipes.len();
        t.recipes.retain(|r| r.id != id);
        t.plans.retain(|p| p.recipe_id != id);
        Ok(t.recipes.len() < before)
    }
}

#[async_trait]
impl MealPlanRepository for MemoryStore {
    async fn list(&self, date: Option<Date>, meal_type: Option<&str>) -> AppResult<Vec<MealPlan>> {
        let t = self.lock();
        let mut plans: Vec<MealPlan> = t
            .plans
            .iter()
            .filter(|p| date.map_or(true, |d| p.date == d))
            .filter(|p| meal_type.map_or(true, |m| icontains(&p.meal_type, m)))
            .filter_map(|p| t.plan(p))
            .collect();
        plans.sort_by_key(|p| p.date);
        Ok(plans)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<MealPlan>> {
        let t = self.lock();
        Ok(t.plans.iter().find(|p| p.id == id).and_then(|p| t.plan(p)))
    }

    async fn create(&self, plan: NewMealPlan) -> AppResult<MealPlan> {
        let mut t = self.lock();
        if !t.recipes.iter().any(|r| r.id == plan.recipe_id) {
            return Err(AppError::validation("Referenced object does not exist."));
        }
        let stored = StoredPlan {
            id: Uuid::new_v4(),
            date: plan.date,
            day_of_week: plan.day_of_week,
            meal_type: plan.meal_type,
            recipe_id: plan.recipe_id,
        };
        let view = t.plan(&stored).ok_or_else(missing)?;
        t.plans.push(stored);
        Ok(view)
    }

    async fn update(&self, id: Uuid, changes: &MealPlanChanges) -> AppResult<MealPlan> {
        let mut t = self.lock();
        if let Some(recipe_id) = changes.recipe_id {
            if !t.recipes.iter().any(|r| r.id == recipe_id) {
                return Err(AppError::validation("Referenced object does not exist."));
            }
        }
        let plan = t.plans.iter_mut().find(|p| p.id == id).ok_or_else(missing)?;
        if let Some(v) = changes.date {
            plan.date = v;
        }
        if let Some(v) = &changes.day_of_week {
            plan.day_of_week = v.clone();
        }
        if let Some(v) = &changes.meal_type {
            plan.meal_type = v.clone();
        }
        if let Some(v) = changes.recipe_id {
            plan.recipe_id = v;
        }
        let t = &*t;
        t.plans
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| t.plan(p))
            .ok_or_else(missing)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.plans.len();
        t.plans.retain(|p| p.id != id);
        Ok(t.plans.len() < before)
    }
}

fn sorted_unique(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}

#[async_trait]
impl ShoppingRepository for MemoryStore {
    async fn lists_for(&self, user_id: Uuid, family_ids: &[Uuid]) -> AppResult<Vec<ShoppingList>> {
        Ok(self
            .lock()
            .lists
            .iter()
            .filter(|l| {
                l.created_by == user_id
                    || l.family_id.is_some_and(|f| family_ids.contains(&f))
                    || l.shared_with.contains(&user_id)
            })
            .cloned()
            .collect())
    }

    async fn find_list(&self, id: Uuid) -> AppResult<Option<ShoppingList>> {
        Ok(self.lock().lists.iter().find(|l| l.id == id).cloned())
    }

    async fn create_list(&self, list: NewShoppingList) -> AppResult<ShoppingList> {
        let created = ShoppingList {
            id: Uuid::new_v4(),
            family_id: list.family_id,
            created_by: list.created_by,
            name: list.name,
            date: list.date,
            week: list.week,
            created_at: now(),
            updated_at: now(),
            shared_with: sorted_unique(list.shared_with),
        };
        self.lock().lists.push(created.clone());
        Ok(created)
    }

    async fn update_list(&self, id: Uuid, changes: &ShoppingListChanges) -> AppResult<ShoppingList> {
        let mut t = self.lock();
        let list = t.lists.iter_mut().find(|l| l.id == id).ok_or_else(missing)?;
        if let Some(v) = changes.family_id {
            list.family_id = v;
        }
        if let Some(v) = &changes.name {
            list.name = v.clone();
        }
        if let Some(v) = changes.date {
            list.date = v;
        }
        if let Some(v) = &changes.week {
            list.week = v.clone();
        }
        if let Some(v) = &changes.shared_with {
            list.shared_with = sorted_unique(v.clone());
        }
        list.updated_at = now();
        Ok(list.clone())
    }

    async fn delete_list(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.lists.len();
        t.delete_lists(|l| l.id == id);
        Ok(t.lists.len() < before)
    }

    async fn items_in(&self, list_ids: &[Uuid]) -> AppResult<Vec<ShoppingListItem>> {
        Ok(self
            .lock()
            .items
            .iter()
            .filter(|i| list_ids.contains(&i.shopping_list_id))
            .cloned()
            .collect())
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<ShoppingListItem>> {
        Ok(self.lock().items.iter().find(|i| i.id == id).cloned())
    }

    async fn create_item(&self, item: NewItem) -> AppResult<ShoppingListItem> {
        let created = ShoppingListItem {
            id: Uuid::new_v4(),
            shopping_list_id: item.shopping_list_id,
            item: item.item,
            quantity: item.quantity,
            category: item.category,
            status: item.status,
            created_at: now(),
            updated_at: now(),
        };
        self.lock().items.push(created.clone());
        Ok(created)
    }

    async fn update_item(&self, id: Uuid, changes: &ItemChanges) -> AppResult<ShoppingListItem> {
        let mut t = self.lock();
        let item = t.items.iter_mut().find(|i| i.id == id).ok_or_else(missing)?;
        if let Some(v) = changes.shopping_list_id {
            item.shopping_list_id = v;
        }
        if let Some(v) = &changes.item {
            item.item = v.clone();
        }
        if let Some(v) = changes.quantity {
            item.quantity = v;
        }
        if let Some(v) = &changes.category {
            item.category = v.clone();
        }
        if let Some(v) = changes.status {
            item.status = v;
        }
        item.updated_at = now();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.lock();
        let before = t.items.len();
        t.items.retain(|i| i.id != id);
        Ok(t.items.len() < before)
    }
}

/// Object store that only remembers which keys exist.
#[derive(Clone, Default)]
pub struct FakeStorage {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl FakeStorage {
    fn keys(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys().contains(key)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.keys().insert(key.to_string());
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.keys().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://storage.test/{key}?expires={seconds}"))
    }
}

/// Fake state plus a handle on its object store.
pub fn state_with_storage() -> (AppState, FakeStorage) {
    let storage = FakeStorage::default();
    let mut st = AppState::fake();
    st.storage = Arc::new(storage.clone());
    (st, storage)
}

pub fn registration(name: &str) -> RegisterRequest {
    RegisterRequest {
        username: Some(name.to_string()),
        full_name: Some(format!("{name} Tester")),
        email: Some(format!("{name}@example.com")),
        age: Some(30),
        phone_number: None,
        address: None,
        password: Some("password123".to_string()),
    }
}

pub async fn register_user(st: &AppState, name: &str) -> User {
    users::register(st, registration(name), false)
        .await
        .expect("registration succeeds")
}

/// Pool on the database named by `DATABASE_URL`, migrated. Used by the
/// `#[ignore]`d Postgres repository tests.
pub async fn pg_pool() -> sqlx::PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL points at a test database");
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("database is reachable");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("migrations apply");
    db
}

/// Account row with a unique username and email, stored through `repo`.
pub async fn stored_user(repo: &dyn UserRepository, name: &str) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    repo.create(NewUser {
        username: format!("{name}_{tag}"),
        full_name: format!("{name} Tester"),
        email: format!("{name}_{tag}@example.com"),
        age: None,
        phone_number: None,
        address: None,
        is_admin: false,
        password_hash: "not-a-hash".to_string(),
    })
    .await
    .expect("user insert succeeds")
}
