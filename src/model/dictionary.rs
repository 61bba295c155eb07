use crate::model::Id;
use serde::{Deserialize, Serialize};

/// A row in one of the five dictionary tables. All dictionaries share the
/// same `{id, name}` shape, so the CRUD surface treats them generically and
/// picks the table via `DictionaryKind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: Id,
    pub name: String,
}

/// Input model for creating or renaming a dictionary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDictionaryEntry {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    StoreSection,
    Unit,
    Stage,
    Category,
    PrePackType,
}

impl DictionaryKind {
    /// Backing table name. Static strings only; these are interpolated into
    /// SQL, never taken from input.
    pub fn table(&self) -> &'static str {
        match self {
            DictionaryKind::StoreSection => "d_store_section",
            DictionaryKind::Unit => "d_unit",
            DictionaryKind::Stage => "d_stage",
            DictionaryKind::Category => "d_category",
            DictionaryKind::PrePackType => "d_pre_pack_type",
        }
    }

    /// Field name used in validation error payloads
    pub fn field(&self) -> &'static str {
        match self {
            DictionaryKind::StoreSection => "store_section_id",
            DictionaryKind::Unit => "unit_id",
            DictionaryKind::Stage => "stage_id",
            DictionaryKind::Category => "category_id",
            DictionaryKind::PrePackType => "pre_pack_type_id",
        }
    }
}

// Concrete dictionary views used inside the hydrated menu graph. They are
// the same rows as `DictionaryEntry`, typed per table so the aggregation
// engine cannot mix a unit up with a stage.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrePackType {
    pub id: Id,
    pub name: String,
}
