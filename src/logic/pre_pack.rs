use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::logic::{merge_quantity, scale_amount, AggregationError, QuantityLine};
use crate::model::Menu;

/// Per-dish pre-pack breakdown of a menu: dish name → `DishPrePack`.
/// Only dishes contributing at least one pre-pack-typed ingredient appear.
pub type PrePackList = IndexMap<String, DishPrePack>;

/// Pre-pack groupings of one dish instance. `portion` is the requested
/// serving count of the menu entry, carried as an annotation; the flattened
/// map serializes each pre-pack type name next to it:
/// `{"portion": 4, "Frozen": {"Peas": [{"amount": …, "unit": …}]}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishPrePack {
    pub portion: i32,
    #[serde(flatten)]
    pub groups: IndexMap<String, IndexMap<String, Vec<QuantityLine>>>,
}

/// Compute the pre-pack list for a hydrated menu.
///
/// Same traversal and scaling as the shopping list (entries by id
/// descending, ingredients in stored order), restricted to ingredients
/// that carry a pre-pack type. Grouping is dish name → pre-pack type name
/// → foodstuff name; alternatives are not folded into the key here. A dish
/// instance with no pre-pack-typed ingredients is omitted entirely.
pub fn compute_pre_pack_list(menu: &Menu) -> Result<PrePackList, AggregationError> {
    let mut result = PrePackList::new();

    for entry in menu.entries.iter().sorted_by(|a, b| b.id.cmp(&a.id)) {
        for ingredient in &entry.dish.ingredients {
            let Some(pre_pack_type) = &ingredient.pre_pack_type else {
                continue;
            };
            let scaled = scale_amount(ingredient.amount, entry.dish.portion, entry.portion)?;

            // The result is keyed by dish name, so two entries whose
            // dishes share a name fold into one block and the portion of
            // the first-traversed entry wins. See DESIGN.md.
            let dish_pre_pack = result
                .entry(entry.dish.name.clone())
                .or_insert_with(|| DishPrePack {
                    portion: entry.portion,
                    groups: IndexMap::new(),
                });
            let goods = dish_pre_pack
                .groups
                .entry(pre_pack_type.name.clone())
                .or_default();
            let lines = goods.entry(ingredient.foodstuff.name.clone()).or_default();
            merge_quantity(lines, scaled, &ingredient.unit.name);
        }
    }

    Ok(result)
}
