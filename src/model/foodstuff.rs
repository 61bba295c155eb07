use crate::model::{Id, StoreSection};
use serde::{Deserialize, Serialize};

/// A purchasable grocery item, shelved under exactly one store section.
/// The section is embedded rather than referenced by id because every
/// consumer (CRUD responses and the aggregation engine alike) needs the
/// section name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Foodstuff {
    pub id: Id,
    pub name: String,
    pub store_section: StoreSection,
}

/// Input model for creating or updating a foodstuff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFoodstuff {
    pub name: String,
    pub store_section_id: Id,
}

/// Optional query filter for foodstuff listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodstuffFilter {
    pub store_section_id: Option<Id>,
}
