use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::logic::{compute_pre_pack_list, compute_shopping_list, PrePackList, ShoppingList};
use crate::model::{
    Category, DictionaryKind, Dish, DishSummary, Foodstuff, FoodstuffFilter, Id, Ingredient,
    MenuEntryRow, MenuSummary, NewDish, NewFoodstuff, NewIngredient, NewMenu, NewMenuEntry,
};
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

/// Error body of every endpoint: either a single `error` string (missing
/// resources, store failures) or a field-keyed `messages` map for
/// validation failures, matching the API's historical wire shape.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiError {
    Message { error: String },
    Validation { messages: HashMap<String, Vec<String>> },
}

impl ApiError {
    pub fn new(error: &str) -> Self {
        ApiError::Message {
            error: error.to_string(),
        }
    }

    pub fn validation(messages: HashMap<String, Vec<String>>) -> Self {
        ApiError::Validation { messages }
    }

    pub fn field_message(field: &str, message: &str) -> Self {
        let mut messages = HashMap::new();
        push_message(&mut messages, field, message);
        ApiError::Validation { messages }
    }
}

fn push_message(messages: &mut HashMap<String, Vec<String>>, field: &str, message: &str) {
    messages
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn internal_error(e: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(&e.to_string())),
    )
}

fn not_found(what: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(&format!("{} not found", what))),
    )
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Foodstuffs

#[derive(Debug, Serialize)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Serialize)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_link: Href,
}

/// Foodstuff listings keep the `{data, _links}` envelope of the original
/// API.
#[derive(Debug, Serialize)]
pub struct FoodstuffListResponse {
    pub data: Vec<Foodstuff>,
    pub _links: SelfLinks,
}

pub async fn list_foodstuffs<S: Store>(
    State(store): State<AppState<S>>,
    OriginalUri(uri): OriginalUri,
    Query(filter): Query<FoodstuffFilter>,
) -> Result<Json<FoodstuffListResponse>, (StatusCode, Json<ApiError>)> {
    match store.list_foodstuffs(&filter).await {
        Ok(foodstuffs) => Ok(Json(FoodstuffListResponse {
            data: foodstuffs,
            _links: SelfLinks {
                self_link: Href {
                    href: uri.to_string(),
                },
            },
        })),
        Err(e) => Err(internal_error(e)),
    }
}

async fn validate_foodstuff<S: Store>(
    store: &S,
    new: &NewFoodstuff,
    except_id: Option<Id>,
) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let mut messages = HashMap::new();

    if store
        .get_entry(DictionaryKind::StoreSection, new.store_section_id)
        .await?
        .is_none()
    {
        push_message(&mut messages, "store_section_id", "Bad choice for store_section_id");
    }
    if store.foodstuff_name_exists(&new.name, except_id).await? {
        push_message(&mut messages, "name", "Already exist");
    }

    Ok(messages)
}

pub async fn create_foodstuff<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(new): RequestJson<NewFoodstuff>,
) -> Result<(StatusCode, Json<Foodstuff>), (StatusCode, Json<ApiError>)> {
    let messages = validate_foodstuff(&*store, &new, None)
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.create_foodstuff(&new).await {
        Ok(foodstuff) => Ok((StatusCode::CREATED, Json(foodstuff))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn get_foodstuff<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<Json<Foodstuff>, (StatusCode, Json<ApiError>)> {
    match store.get_foodstuff(id).await {
        Ok(Some(foodstuff)) => Ok(Json(foodstuff)),
        Ok(None) => Err(not_found("Foodstuff")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn update_foodstuff<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
    RequestJson(new): RequestJson<NewFoodstuff>,
) -> Result<Json<Foodstuff>, (StatusCode, Json<ApiError>)> {
    let messages = validate_foodstuff(&*store, &new, Some(id))
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.update_foodstuff(id, &new).await {
        Ok(Some(foodstuff)) => Ok(Json(foodstuff)),
        Ok(None) => Err(not_found("Foodstuff")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_foodstuff<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.get_foodstuff(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found("Foodstuff")),
        Err(e) => return Err(internal_error(e)),
    }

    match store.foodstuff_in_use(id).await {
        Ok(true) => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiError::new("foodstuff already used in dishes")),
            ))
        }
        Ok(false) => {}
        Err(e) => return Err(internal_error(e)),
    }

    match store.delete_foodstuff(id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(internal_error(e)),
    }
}

// ---------------------------------------------------------------------------
// Dishes

/// Ingredient as rendered inside dish responses. `stage` and `pre_pack`
/// are omitted where the surrounding structure already groups by them.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientView {
    pub id: Id,
    pub foodstuff: String,
    pub amount: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_pack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,
}

impl IngredientView {
    fn new(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id,
            foodstuff: ingredient.foodstuff.name.clone(),
            amount: ingredient.amount,
            unit: ingredient.unit.name.clone(),
            stage: None,
            pre_pack: None,
            alternatives: if ingredient.alternatives.is_empty() {
                None
            } else {
                Some(
                    ingredient
                        .alternatives
                        .iter()
                        .map(|alt| alt.name.clone())
                        .collect(),
                )
            },
        }
    }

    fn with_tags(ingredient: &Ingredient) -> Self {
        let mut view = Self::new(ingredient);
        view.stage = Some(stage_name(ingredient));
        view.pre_pack = ingredient.pre_pack_type.as_ref().map(|p| p.name.clone());
        view
    }
}

fn stage_name(ingredient: &Ingredient) -> String {
    ingredient
        .stage
        .as_ref()
        .map(|stage| stage.name.clone())
        .unwrap_or_else(|| "other".to_string())
}

/// Group a dish's ingredients by stage name (missing stage → "other") and,
/// in parallel, collect the pre-pack-typed ones by pre-pack type name.
fn group_ingredients(
    dish: &Dish,
) -> (
    IndexMap<String, Vec<IngredientView>>,
    IndexMap<String, Vec<IngredientView>>,
) {
    let mut by_stage: IndexMap<String, Vec<IngredientView>> = IndexMap::new();
    let mut by_pre_pack: IndexMap<String, Vec<IngredientView>> = IndexMap::new();

    for ingredient in &dish.ingredients {
        let view = IngredientView::new(ingredient);
        by_stage
            .entry(stage_name(ingredient))
            .or_default()
            .push(view.clone());
        if let Some(pre_pack_type) = &ingredient.pre_pack_type {
            by_pre_pack
                .entry(pre_pack_type.name.clone())
                .or_default()
                .push(view);
        }
    }

    (by_stage, by_pre_pack)
}

#[derive(Debug, Serialize)]
pub struct ImgLink {
    pub url: String,
}

/// Full dish response: summary fields plus ingredients grouped by stage
/// and the pre-pack breakdown, mirroring the original detail payload.
#[derive(Debug, Serialize)]
pub struct DishDetailResponse {
    pub id: Id,
    pub name: String,
    pub portion: i32,
    pub cook_time: i32,
    pub all_time: i32,
    pub description: String,
    pub categories: Vec<Category>,
    pub recipe_ingredients: IndexMap<String, Vec<IngredientView>>,
    pub pre_pack: IndexMap<String, Vec<IngredientView>>,
    pub img: ImgLink,
}

pub async fn list_dishes<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<Vec<DishSummary>>, (StatusCode, Json<ApiError>)> {
    match store.list_dishes().await {
        Ok(dishes) => Ok(Json(dishes)),
        Err(e) => Err(internal_error(e)),
    }
}

async fn validate_dish<S: Store>(
    store: &S,
    new: &NewDish,
) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let mut messages = HashMap::new();

    if new.portion <= 0 {
        push_message(&mut messages, "portion", "Must be greater than 0");
    }
    for category_id in &new.categories {
        if store
            .get_entry(DictionaryKind::Category, *category_id)
            .await?
            .is_none()
        {
            push_message(&mut messages, "categories", "Bad choice for category_id");
        }
    }

    Ok(messages)
}

pub async fn create_dish<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(new): RequestJson<NewDish>,
) -> Result<(StatusCode, Json<DishSummary>), (StatusCode, Json<ApiError>)> {
    let messages = validate_dish(&*store, &new).await.map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.create_dish(&new).await {
        Ok(dish) => Ok((StatusCode::CREATED, Json(dish))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn get_dish<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<Json<DishDetailResponse>, (StatusCode, Json<ApiError>)> {
    match store.get_dish(id).await {
        Ok(Some(dish)) => {
            let (recipe_ingredients, pre_pack) = group_ingredients(&dish);
            Ok(Json(DishDetailResponse {
                id: dish.id,
                name: dish.name,
                portion: dish.portion,
                cook_time: dish.cook_time,
                all_time: dish.all_time,
                description: dish.description,
                categories: dish.categories,
                recipe_ingredients,
                pre_pack,
                img: ImgLink {
                    url: format!("/images/{}.jpg", id),
                },
            }))
        }
        Ok(None) => Err(not_found("Dish")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn update_dish<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
    RequestJson(new): RequestJson<NewDish>,
) -> Result<Json<DishSummary>, (StatusCode, Json<ApiError>)> {
    let messages = validate_dish(&*store, &new).await.map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.update_dish(id, &new).await {
        Ok(Some(dish)) => Ok(Json(dish)),
        Ok(None) => Err(not_found("Dish")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_dish<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.delete_dish(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found("Dish")),
        Err(e) => Err(internal_error(e)),
    }
}

// ---------------------------------------------------------------------------
// Ingredients

/// Validate an ingredient payload against the dictionaries and the dish it
/// belongs to. `current` is the ingredient being updated, if any; its own
/// foodstuff does not count as a duplicate.
async fn validate_ingredient<S: Store>(
    store: &S,
    dish: &Dish,
    new: &NewIngredient,
    current: Option<&Ingredient>,
) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let mut messages = HashMap::new();

    if new.amount < 0.0 {
        push_message(&mut messages, "amount", "Must not be negative");
    }
    if store
        .get_entry(DictionaryKind::Unit, new.unit_id)
        .await?
        .is_none()
    {
        push_message(&mut messages, "unit_id", "Bad choice for unit_id");
    }
    if let Some(stage_id) = new.stage_id {
        if store
            .get_entry(DictionaryKind::Stage, stage_id)
            .await?
            .is_none()
        {
            push_message(&mut messages, "stage_id", "Bad choice for stage_id");
        }
    }
    if let Some(pre_pack_type_id) = new.pre_pack_type_id {
        if store
            .get_entry(DictionaryKind::PrePackType, pre_pack_type_id)
            .await?
            .is_none()
        {
            push_message(
                &mut messages,
                "pre_pack_type_id",
                "Bad choice for pre_pack_type_id",
            );
        }
    }
    if store.get_foodstuff(new.foodstuff_id).await?.is_none() {
        push_message(&mut messages, "foodstuff_id", "Bad choice for foodstuff_id");
    }
    for alternative_id in &new.alternative_ids {
        if *alternative_id == new.foodstuff_id {
            push_message(
                &mut messages,
                "alternative_ids",
                "Must not contain the ingredient's own foodstuff",
            );
        } else if store.get_foodstuff(*alternative_id).await?.is_none() {
            push_message(
                &mut messages,
                "alternative_ids",
                "Bad choice for alternative_id",
            );
        }
    }

    // A foodstuff may appear only once per dish, directly or as another
    // ingredient's alternative.
    let foodstuff_unchanged = current.map(|c| c.foodstuff.id) == Some(new.foodstuff_id);
    if !foodstuff_unchanged {
        for existing in &dish.ingredients {
            if current.map(|c| c.id) == Some(existing.id) {
                continue;
            }
            if existing.foodstuff.id == new.foodstuff_id {
                push_message(
                    &mut messages,
                    "foodstuff_id",
                    &format!("Already added to dish {}", dish.id),
                );
            }
            if existing
                .alternatives
                .iter()
                .any(|alt| alt.id == new.foodstuff_id)
            {
                push_message(
                    &mut messages,
                    "foodstuff_id",
                    &format!("Already added as alternative to dish {}", dish.id),
                );
            }
        }
    }

    Ok(messages)
}

pub async fn list_ingredients<S: Store>(
    State(store): State<AppState<S>>,
    Path(dish_id): Path<Id>,
) -> Result<Json<IndexMap<String, Vec<IngredientView>>>, (StatusCode, Json<ApiError>)> {
    match store.get_dish(dish_id).await {
        Ok(Some(dish)) => {
            let mut by_stage: IndexMap<String, Vec<IngredientView>> = IndexMap::new();
            for ingredient in &dish.ingredients {
                let mut view = IngredientView::new(ingredient);
                view.pre_pack = ingredient.pre_pack_type.as_ref().map(|p| p.name.clone());
                by_stage.entry(stage_name(ingredient)).or_default().push(view);
            }
            Ok(Json(by_stage))
        }
        Ok(None) => Err(not_found("Dish")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn create_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    Path(dish_id): Path<Id>,
    RequestJson(new): RequestJson<NewIngredient>,
) -> Result<(StatusCode, Json<IngredientView>), (StatusCode, Json<ApiError>)> {
    let dish = match store.get_dish(dish_id).await {
        Ok(Some(dish)) => dish,
        Ok(None) => return Err(not_found("Dish")),
        Err(e) => return Err(internal_error(e)),
    };

    let messages = validate_ingredient(&*store, &dish, &new, None)
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.create_ingredient(dish_id, &new).await {
        Ok(ingredient) => Ok((
            StatusCode::CREATED,
            Json(IngredientView::with_tags(&ingredient)),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn get_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    Path((dish_id, id)): Path<(Id, Id)>,
) -> Result<Json<IngredientView>, (StatusCode, Json<ApiError>)> {
    match store.get_ingredient(dish_id, id).await {
        Ok(Some(ingredient)) => Ok(Json(IngredientView::with_tags(&ingredient))),
        Ok(None) => Err(not_found("Ingredient")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn update_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    Path((dish_id, id)): Path<(Id, Id)>,
    RequestJson(new): RequestJson<NewIngredient>,
) -> Result<Json<IngredientView>, (StatusCode, Json<ApiError>)> {
    let dish = match store.get_dish(dish_id).await {
        Ok(Some(dish)) => dish,
        Ok(None) => return Err(not_found("Dish")),
        Err(e) => return Err(internal_error(e)),
    };
    let current = match store.get_ingredient(dish_id, id).await {
        Ok(Some(ingredient)) => ingredient,
        Ok(None) => return Err(not_found("Ingredient")),
        Err(e) => return Err(internal_error(e)),
    };

    let messages = validate_ingredient(&*store, &dish, &new, Some(&current))
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.update_ingredient(dish_id, id, &new).await {
        Ok(Some(ingredient)) => Ok(Json(IngredientView::with_tags(&ingredient))),
        Ok(None) => Err(not_found("Ingredient")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_ingredient<S: Store>(
    State(store): State<AppState<S>>,
    Path((dish_id, id)): Path<(Id, Id)>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.delete_ingredient(dish_id, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found("Ingredient")),
        Err(e) => Err(internal_error(e)),
    }
}

// ---------------------------------------------------------------------------
// Menus

pub async fn list_menus<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<Vec<MenuSummary>>, (StatusCode, Json<ApiError>)> {
    match store.list_menus().await {
        Ok(menus) => Ok(Json(menus)),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn create_menu<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(new): RequestJson<NewMenu>,
) -> Result<(StatusCode, Json<MenuSummary>), (StatusCode, Json<ApiError>)> {
    if new.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::field_message("name", "Must not be empty")),
        ));
    }

    match store.create_menu(&new).await {
        Ok(menu) => Ok((StatusCode::CREATED, Json(menu))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn get_menu<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<Json<MenuSummary>, (StatusCode, Json<ApiError>)> {
    match store.get_menu(id).await {
        Ok(Some(menu)) => Ok(Json(menu)),
        Ok(None) => Err(not_found("Menu")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn update_menu<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
    RequestJson(new): RequestJson<NewMenu>,
) -> Result<Json<MenuSummary>, (StatusCode, Json<ApiError>)> {
    if new.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::field_message("name", "Must not be empty")),
        ));
    }

    match store.update_menu(id, &new).await {
        Ok(Some(menu)) => Ok(Json(menu)),
        Ok(None) => Err(not_found("Menu")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_menu<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.delete_menu(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found("Menu")),
        Err(e) => Err(internal_error(e)),
    }
}

// ---------------------------------------------------------------------------
// Menu entries

async fn validate_menu_entry<S: Store>(
    store: &S,
    menu_id: Id,
    new: &NewMenuEntry,
    current: Option<&MenuEntryRow>,
) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let mut messages = HashMap::new();

    if new.portion <= 0 {
        push_message(&mut messages, "portion", "Must be greater than 0");
    }
    if store.get_dish(new.dish_id).await?.is_none() {
        push_message(&mut messages, "dish_id", "Bad choice for dish_id");
    }

    // A dish may appear only once per menu
    let dish_unchanged = current.map(|c| c.dish_id) == Some(new.dish_id);
    if !dish_unchanged {
        let entries = store.list_menu_entries(menu_id).await?;
        if entries.iter().any(|entry| entry.dish_id == new.dish_id) {
            push_message(
                &mut messages,
                "dish_id",
                &format!("Already added to menu {}", menu_id),
            );
        }
    }

    Ok(messages)
}

pub async fn list_menu_entries<S: Store>(
    State(store): State<AppState<S>>,
    Path(menu_id): Path<Id>,
) -> Result<Json<Vec<MenuEntryRow>>, (StatusCode, Json<ApiError>)> {
    match store.get_menu(menu_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found("Menu")),
        Err(e) => return Err(internal_error(e)),
    }

    match store.list_menu_entries(menu_id).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn create_menu_entry<S: Store>(
    State(store): State<AppState<S>>,
    Path(menu_id): Path<Id>,
    RequestJson(new): RequestJson<NewMenuEntry>,
) -> Result<(StatusCode, Json<MenuEntryRow>), (StatusCode, Json<ApiError>)> {
    match store.get_menu(menu_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found("Menu")),
        Err(e) => return Err(internal_error(e)),
    }

    let messages = validate_menu_entry(&*store, menu_id, &new, None)
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.create_menu_entry(menu_id, &new).await {
        Ok(entry) => Ok((StatusCode::CREATED, Json(entry))),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn get_menu_entry<S: Store>(
    State(store): State<AppState<S>>,
    Path((menu_id, id)): Path<(Id, Id)>,
) -> Result<Json<MenuEntryRow>, (StatusCode, Json<ApiError>)> {
    match store.get_menu_entry(menu_id, id).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err(not_found("Menu entry")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn update_menu_entry<S: Store>(
    State(store): State<AppState<S>>,
    Path((menu_id, id)): Path<(Id, Id)>,
    RequestJson(new): RequestJson<NewMenuEntry>,
) -> Result<Json<MenuEntryRow>, (StatusCode, Json<ApiError>)> {
    let current = match store.get_menu_entry(menu_id, id).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return Err(not_found("Menu entry")),
        Err(e) => return Err(internal_error(e)),
    };

    let messages = validate_menu_entry(&*store, menu_id, &new, Some(&current))
        .await
        .map_err(internal_error)?;
    if !messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ApiError::validation(messages))));
    }

    match store.update_menu_entry(menu_id, id, &new).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err(not_found("Menu entry")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_menu_entry<S: Store>(
    State(store): State<AppState<S>>,
    Path((menu_id, id)): Path<(Id, Id)>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.delete_menu_entry(menu_id, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found("Menu entry")),
        Err(e) => Err(internal_error(e)),
    }
}

// ---------------------------------------------------------------------------
// Aggregation

/// Consolidated shopping list for a menu. The heavy lifting is in
/// `logic::compute_shopping_list`; this handler only loads the graph and
/// maps errors: unknown menu → 404, data-integrity failure → 500 (it is a
/// server-side data fault, not a client error).
pub async fn get_shopping_list<S: Store>(
    State(store): State<AppState<S>>,
    Path(menu_id): Path<Id>,
) -> Result<Json<ShoppingList>, (StatusCode, Json<ApiError>)> {
    let menu = match store.load_menu_graph(menu_id).await {
        Ok(Some(menu)) => menu,
        Ok(None) => return Err(not_found("Menu")),
        Err(e) => return Err(internal_error(e)),
    };

    match compute_shopping_list(&menu) {
        Ok(list) => Ok(Json(list)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

/// Per-dish pre-pack breakdown for a menu, same status mapping as the
/// shopping list.
pub async fn get_pre_pack_list<S: Store>(
    State(store): State<AppState<S>>,
    Path(menu_id): Path<Id>,
) -> Result<Json<PrePackList>, (StatusCode, Json<ApiError>)> {
    let menu = match store.load_menu_graph(menu_id).await {
        Ok(Some(menu)) => menu,
        Ok(None) => return Err(not_found("Menu")),
        Err(e) => return Err(internal_error(e)),
    };

    match compute_pre_pack_list(&menu) {
        Ok(list) => Ok(Json(list)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DictionaryEntry, Foodstuff, Menu, PrePackType, Stage, StoreSection, Unit,
    };
    use crate::store::traits::{DictionaryStore, DishStore, FoodstuffStore, MenuStore};

    fn foodstuff(id: Id, name: &str) -> Foodstuff {
        Foodstuff {
            id,
            name: name.to_string(),
            store_section: StoreSection {
                id: 1,
                name: "Vegetables".to_string(),
            },
        }
    }

    fn ingredient(id: Id, name: &str, stage: Option<&str>, pre_pack: Option<&str>) -> Ingredient {
        Ingredient {
            id,
            dish_id: 1,
            foodstuff: foodstuff(id, name),
            amount: 100.0,
            unit: Unit {
                id: 1,
                name: "g".to_string(),
            },
            stage: stage.map(|name| Stage {
                id: 1,
                name: name.to_string(),
            }),
            pre_pack_type: pre_pack.map(|name| PrePackType {
                id: 1,
                name: name.to_string(),
            }),
            alternatives: Vec::new(),
        }
    }

    fn dish(ingredients: Vec<Ingredient>) -> Dish {
        Dish {
            id: 1,
            name: "Soup".to_string(),
            description: String::new(),
            portion: 2,
            cook_time: 30,
            all_time: 45,
            categories: Vec::new(),
            ingredients,
        }
    }

    #[test]
    fn ingredients_group_by_stage_with_other_fallback() {
        let soup = dish(vec![
            ingredient(1, "Carrot", Some("prep"), None),
            ingredient(2, "Water", None, None),
            ingredient(3, "Onion", Some("prep"), None),
        ]);

        let (by_stage, by_pre_pack) = group_ingredients(&soup);
        assert_eq!(by_stage["prep"].len(), 2);
        assert_eq!(by_stage["other"].len(), 1);
        assert_eq!(by_stage["other"][0].foodstuff, "Water");
        assert!(by_pre_pack.is_empty());
    }

    #[test]
    fn only_tagged_ingredients_reach_the_pre_pack_grouping() {
        let soup = dish(vec![
            ingredient(1, "Peas", Some("cooking"), Some("Frozen")),
            ingredient(2, "Carrot", Some("cooking"), None),
        ]);

        let (_, by_pre_pack) = group_ingredients(&soup);
        assert_eq!(by_pre_pack.len(), 1);
        assert_eq!(by_pre_pack["Frozen"].len(), 1);
        assert_eq!(by_pre_pack["Frozen"][0].foodstuff, "Peas");
    }

    #[test]
    fn validation_errors_serialize_as_field_keyed_messages() {
        let error = ApiError::field_message("portion", "Must be greater than 0");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"messages": {"portion": ["Must be greater than 0"]}})
        );
    }

    #[test]
    fn plain_errors_serialize_as_error_string() {
        let json = serde_json::to_value(ApiError::new("Menu not found")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Menu not found"}));
    }

    /// In-memory store backing the validation tests. Only the lookups the
    /// handlers under test reach are implemented.
    #[derive(Default)]
    struct StubStore {
        foodstuffs: Vec<Foodstuff>,
        entries: Vec<(DictionaryKind, DictionaryEntry)>,
        foodstuff_used: bool,
    }

    fn stub_with(foodstuffs: Vec<Foodstuff>) -> StubStore {
        StubStore {
            foodstuffs,
            entries: vec![(
                DictionaryKind::Unit,
                DictionaryEntry {
                    id: 1,
                    name: "g".to_string(),
                },
            )],
            foodstuff_used: false,
        }
    }

    #[async_trait::async_trait]
    impl DictionaryStore for StubStore {
        async fn list_entries(&self, _kind: DictionaryKind) -> anyhow::Result<Vec<DictionaryEntry>> {
            unimplemented!()
        }
        async fn get_entry(
            &self,
            kind: DictionaryKind,
            id: Id,
        ) -> anyhow::Result<Option<DictionaryEntry>> {
            Ok(self
                .entries
                .iter()
                .find(|(k, entry)| *k == kind && entry.id == id)
                .map(|(_, entry)| entry.clone()))
        }
        async fn create_entry(
            &self,
            _kind: DictionaryKind,
            _name: &str,
        ) -> anyhow::Result<DictionaryEntry> {
            unimplemented!()
        }
        async fn update_entry(
            &self,
            _kind: DictionaryKind,
            _id: Id,
            _name: &str,
        ) -> anyhow::Result<Option<DictionaryEntry>> {
            unimplemented!()
        }
        async fn delete_entry(&self, _kind: DictionaryKind, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
        async fn entry_in_use(&self, _kind: DictionaryKind, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
    }

    #[async_trait::async_trait]
    impl FoodstuffStore for StubStore {
        async fn list_foodstuffs(&self, _filter: &FoodstuffFilter) -> anyhow::Result<Vec<Foodstuff>> {
            unimplemented!()
        }
        async fn get_foodstuff(&self, id: Id) -> anyhow::Result<Option<Foodstuff>> {
            Ok(self.foodstuffs.iter().find(|f| f.id == id).cloned())
        }
        async fn create_foodstuff(&self, _new: &NewFoodstuff) -> anyhow::Result<Foodstuff> {
            unimplemented!()
        }
        async fn update_foodstuff(
            &self,
            _id: Id,
            _new: &NewFoodstuff,
        ) -> anyhow::Result<Option<Foodstuff>> {
            unimplemented!()
        }
        async fn delete_foodstuff(&self, _id: Id) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn foodstuff_name_exists(
            &self,
            _name: &str,
            _except_id: Option<Id>,
        ) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn foodstuff_in_use(&self, _id: Id) -> anyhow::Result<bool> {
            Ok(self.foodstuff_used)
        }
    }

    #[async_trait::async_trait]
    impl DishStore for StubStore {
        async fn list_dishes(&self) -> anyhow::Result<Vec<DishSummary>> {
            unimplemented!()
        }
        async fn get_dish(&self, _id: Id) -> anyhow::Result<Option<Dish>> {
            unimplemented!()
        }
        async fn create_dish(&self, _new: &NewDish) -> anyhow::Result<DishSummary> {
            unimplemented!()
        }
        async fn update_dish(&self, _id: Id, _new: &NewDish) -> anyhow::Result<Option<DishSummary>> {
            unimplemented!()
        }
        async fn delete_dish(&self, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
        async fn create_ingredient(
            &self,
            _dish_id: Id,
            _new: &NewIngredient,
        ) -> anyhow::Result<Ingredient> {
            unimplemented!()
        }
        async fn get_ingredient(&self, _dish_id: Id, _id: Id) -> anyhow::Result<Option<Ingredient>> {
            unimplemented!()
        }
        async fn update_ingredient(
            &self,
            _dish_id: Id,
            _id: Id,
            _new: &NewIngredient,
        ) -> anyhow::Result<Option<Ingredient>> {
            unimplemented!()
        }
        async fn delete_ingredient(&self, _dish_id: Id, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
    }

    #[async_trait::async_trait]
    impl MenuStore for StubStore {
        async fn list_menus(&self) -> anyhow::Result<Vec<MenuSummary>> {
            unimplemented!()
        }
        async fn get_menu(&self, _id: Id) -> anyhow::Result<Option<MenuSummary>> {
            unimplemented!()
        }
        async fn create_menu(&self, _new: &NewMenu) -> anyhow::Result<MenuSummary> {
            unimplemented!()
        }
        async fn update_menu(&self, _id: Id, _new: &NewMenu) -> anyhow::Result<Option<MenuSummary>> {
            unimplemented!()
        }
        async fn delete_menu(&self, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
        async fn list_menu_entries(&self, _menu_id: Id) -> anyhow::Result<Vec<MenuEntryRow>> {
            unimplemented!()
        }
        async fn get_menu_entry(&self, _menu_id: Id, _id: Id) -> anyhow::Result<Option<MenuEntryRow>> {
            unimplemented!()
        }
        async fn create_menu_entry(
            &self,
            _menu_id: Id,
            _new: &NewMenuEntry,
        ) -> anyhow::Result<MenuEntryRow> {
            unimplemented!()
        }
        async fn update_menu_entry(
            &self,
            _menu_id: Id,
            _id: Id,
            _new: &NewMenuEntry,
        ) -> anyhow::Result<Option<MenuEntryRow>> {
            unimplemented!()
        }
        async fn delete_menu_entry(&self, _menu_id: Id, _id: Id) -> anyhow::Result<bool> {
            unimplemented!()
        }
        async fn load_menu_graph(&self, _menu_id: Id) -> anyhow::Result<Option<Menu>> {
            unimplemented!()
        }
    }

    impl Store for StubStore {}

    fn new_ingredient(foodstuff_id: Id, alternative_ids: Vec<Id>) -> NewIngredient {
        NewIngredient {
            foodstuff_id,
            amount: 50.0,
            unit_id: 1,
            stage_id: None,
            pre_pack_type_id: None,
            alternative_ids,
        }
    }

    #[tokio::test]
    async fn duplicate_foodstuff_in_dish_is_rejected() {
        let soup = dish(vec![ingredient(1, "Carrot", None, None)]);
        let store = stub_with(vec![foodstuff(1, "Carrot")]);

        let messages = validate_ingredient(&store, &soup, &new_ingredient(1, vec![]), None)
            .await
            .unwrap();
        assert_eq!(messages["foodstuff_id"], vec!["Already added to dish 1"]);
    }

    #[tokio::test]
    async fn foodstuff_used_as_an_alternative_is_rejected() {
        let mut water = ingredient(2, "Water", None, None);
        water.alternatives = vec![foodstuff(3, "Broth")];
        let soup = dish(vec![water]);
        let store = stub_with(vec![foodstuff(2, "Water"), foodstuff(3, "Broth")]);

        let messages = validate_ingredient(&store, &soup, &new_ingredient(3, vec![]), None)
            .await
            .unwrap();
        assert_eq!(
            messages["foodstuff_id"],
            vec!["Already added as alternative to dish 1"]
        );
    }

    #[tokio::test]
    async fn own_foodstuff_is_not_a_valid_alternative() {
        let soup = dish(vec![]);
        let store = stub_with(vec![foodstuff(2, "Water")]);

        let messages = validate_ingredient(&store, &soup, &new_ingredient(2, vec![2]), None)
            .await
            .unwrap();
        assert_eq!(
            messages["alternative_ids"],
            vec!["Must not contain the ingredient's own foodstuff"]
        );
    }

    #[tokio::test]
    async fn updating_an_ingredient_skips_its_own_row_in_the_duplicate_check() {
        let carrot = ingredient(1, "Carrot", None, None);
        let soup = dish(vec![carrot.clone()]);
        let store = stub_with(vec![foodstuff(1, "Carrot")]);

        let messages =
            validate_ingredient(&store, &soup, &new_ingredient(1, vec![]), Some(&carrot))
                .await
                .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_foodstuff_still_in_use_is_refused() {
        let mut store = stub_with(vec![foodstuff(1, "Carrot")]);
        store.foodstuff_used = true;

        let result = delete_foodstuff(State(Arc::new(store)), Path(1)).await;
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
