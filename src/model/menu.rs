use crate::model::{Dish, Id};
use serde::{Deserialize, Serialize};

/// A named collection of dish instances. When returned by
/// `load_menu_graph` the entries are fully hydrated down to store
/// sections and units, so the aggregation engine never re-fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: Id,
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

/// One dish included in a menu at a requested serving count. `portion`
/// is the requested count, distinct from the dish's baseline portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: Id,
    pub menu_id: Id,
    pub dish: Dish,
    pub portion: i32,
}

/// Menu without its entries, as returned by menu CRUD endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSummary {
    pub id: Id,
    pub name: String,
}

/// Flat menu entry row, as returned by menu-dish CRUD endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntryRow {
    pub id: Id,
    pub menu_id: Id,
    pub dish_id: Id,
    pub portion: i32,
}

/// Input model for creating or renaming a menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMenu {
    pub name: String,
}

/// Input model for adding a dish instance to a menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMenuEntry {
    pub dish_id: Id,
    pub portion: i32,
}
