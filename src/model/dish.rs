use crate::model::{Category, Foodstuff, Id, PrePackType, Stage, Unit};
use serde::{Deserialize, Serialize};

/// One ingredient line of a dish: a quantity of one foodstuff, with an
/// optional cooking stage, an optional pre-pack tag, and the foodstuffs
/// declared interchangeable with it. `amount` is the quantity needed for
/// the dish's baseline `portion` count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub dish_id: Id,
    pub foodstuff: Foodstuff,
    pub amount: f64,
    pub unit: Unit,
    pub stage: Option<Stage>,
    pub pre_pack_type: Option<PrePackType>,
    pub alternatives: Vec<Foodstuff>,
}

/// A recipe. `portion` is the serving count the ingredient amounts were
/// recorded for; the aggregation engine scales from it. Must be > 0; a
/// zero here is a data-integrity violation, not a valid dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub portion: i32,
    pub cook_time: i32,
    pub all_time: i32,
    pub categories: Vec<Category>,
    pub ingredients: Vec<Ingredient>,
}

/// Dish without its ingredient list, as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishSummary {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub portion: i32,
    pub cook_time: i32,
    pub all_time: i32,
    pub categories: Vec<Category>,
}

/// Input model for creating or updating a dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDish {
    pub name: String,
    pub description: String,
    pub portion: i32,
    pub cook_time: i32,
    pub all_time: i32,
    pub categories: Vec<Id>,
}

/// Input model for creating or updating an ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub foodstuff_id: Id,
    pub amount: f64,
    pub unit_id: Id,
    pub stage_id: Option<Id>,
    pub pre_pack_type_id: Option<Id>,
    #[serde(default)]
    pub alternative_ids: Vec<Id>,
}
