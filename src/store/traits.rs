use crate::model::{
    DictionaryEntry, DictionaryKind, Dish, DishSummary, Foodstuff, FoodstuffFilter, Id, Ingredient,
    Menu, MenuEntryRow, MenuSummary, NewDish, NewFoodstuff, NewIngredient, NewMenu, NewMenuEntry,
};
use anyhow::Result;

/// Generic CRUD over the five dictionary tables. A missing row is
/// `Ok(None)`; `delete_entry` returns whether a row was removed.
#[async_trait::async_trait]
pub trait DictionaryStore: Send + Sync {
    async fn list_entries(&self, kind: DictionaryKind) -> Result<Vec<DictionaryEntry>>;
    async fn get_entry(&self, kind: DictionaryKind, id: Id) -> Result<Option<DictionaryEntry>>;
    async fn create_entry(&self, kind: DictionaryKind, name: &str) -> Result<DictionaryEntry>;
    async fn update_entry(
        &self,
        kind: DictionaryKind,
        id: Id,
        name: &str,
    ) -> Result<Option<DictionaryEntry>>;
    async fn delete_entry(&self, kind: DictionaryKind, id: Id) -> Result<bool>;
    /// Whether any row still references this entry (foodstuffs for store
    /// sections, ingredients for units/stages/pre-pack types, dishes for
    /// categories). Deletes are refused while this holds.
    async fn entry_in_use(&self, kind: DictionaryKind, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait FoodstuffStore: Send + Sync {
    async fn list_foodstuffs(&self, filter: &FoodstuffFilter) -> Result<Vec<Foodstuff>>;
    async fn get_foodstuff(&self, id: Id) -> Result<Option<Foodstuff>>;
    async fn create_foodstuff(&self, new: &NewFoodstuff) -> Result<Foodstuff>;
    async fn update_foodstuff(&self, id: Id, new: &NewFoodstuff) -> Result<Option<Foodstuff>>;
    async fn delete_foodstuff(&self, id: Id) -> Result<bool>;
    /// Case-sensitive uniqueness check, optionally ignoring one row (used
    /// when renaming a foodstuff to its own current name).
    async fn foodstuff_name_exists(&self, name: &str, except_id: Option<Id>) -> Result<bool>;
    /// Whether any ingredient (directly or as an alternative) uses this
    /// foodstuff.
    async fn foodstuff_in_use(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait DishStore: Send + Sync {
    async fn list_dishes(&self) -> Result<Vec<DishSummary>>;
    /// Dish with its ingredients fully hydrated (foodstuffs, units,
    /// stages, pre-pack types, alternatives).
    async fn get_dish(&self, id: Id) -> Result<Option<Dish>>;
    async fn create_dish(&self, new: &NewDish) -> Result<DishSummary>;
    async fn update_dish(&self, id: Id, new: &NewDish) -> Result<Option<DishSummary>>;
    async fn delete_dish(&self, id: Id) -> Result<bool>;

    async fn create_ingredient(&self, dish_id: Id, new: &NewIngredient) -> Result<Ingredient>;
    async fn get_ingredient(&self, dish_id: Id, id: Id) -> Result<Option<Ingredient>>;
    async fn update_ingredient(
        &self,
        dish_id: Id,
        id: Id,
        new: &NewIngredient,
    ) -> Result<Option<Ingredient>>;
    async fn delete_ingredient(&self, dish_id: Id, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait MenuStore: Send + Sync {
    async fn list_menus(&self) -> Result<Vec<MenuSummary>>;
    async fn get_menu(&self, id: Id) -> Result<Option<MenuSummary>>;
    async fn create_menu(&self, new: &NewMenu) -> Result<MenuSummary>;
    async fn update_menu(&self, id: Id, new: &NewMenu) -> Result<Option<MenuSummary>>;
    async fn delete_menu(&self, id: Id) -> Result<bool>;

    async fn list_menu_entries(&self, menu_id: Id) -> Result<Vec<MenuEntryRow>>;
    async fn get_menu_entry(&self, menu_id: Id, id: Id) -> Result<Option<MenuEntryRow>>;
    async fn create_menu_entry(&self, menu_id: Id, new: &NewMenuEntry) -> Result<MenuEntryRow>;
    async fn update_menu_entry(
        &self,
        menu_id: Id,
        id: Id,
        new: &NewMenuEntry,
    ) -> Result<Option<MenuEntryRow>>;
    async fn delete_menu_entry(&self, menu_id: Id, id: Id) -> Result<bool>;

    /// Load the whole menu graph (entries, dishes, ingredients,
    /// foodstuffs, store sections, units, stages, pre-pack types and
    /// alternatives) eagerly, as one internally consistent read. The
    /// aggregation engine consumes this and performs no I/O of its own.
    async fn load_menu_graph(&self, menu_id: Id) -> Result<Option<Menu>>;
}

pub trait Store: DictionaryStore + FoodstuffStore + DishStore + MenuStore + Send + Sync {}
