use indexmap::IndexMap;
use itertools::Itertools;

use crate::logic::{grocery_line, merge_quantity, scale_amount, AggregationError, GroceryKey, QuantityLine};
use crate::model::Menu;

/// Consolidated grocery needs of a menu: store section name → grocery
/// label → quantity lines. Sections and labels keep first-seen insertion
/// order, which is deterministic because entries are traversed in a fixed
/// order.
pub type ShoppingList = IndexMap<String, IndexMap<String, Vec<QuantityLine>>>;

#[derive(Debug)]
struct GroceryRow {
    label: String,
    lines: Vec<QuantityLine>,
}

/// Compute the shopping list for a hydrated menu.
///
/// Entries are traversed by entry id descending, the canonical listing
/// order used across the API, so repeated calls over unchanged data
/// produce byte-identical output. Within an entry, ingredients keep their
/// stored order. Each ingredient amount is scaled from the dish's baseline
/// portion to the entry's requested portion, then merged into the bucket
/// for its store section and grocery key; amounts with the same unit sum,
/// differing units stay separate lines.
///
/// An empty menu yields an empty map.
pub fn compute_shopping_list(menu: &Menu) -> Result<ShoppingList, AggregationError> {
    // section name -> merge key -> row
    let mut sections: IndexMap<String, IndexMap<GroceryKey, GroceryRow>> = IndexMap::new();

    for entry in menu.entries.iter().sorted_by(|a, b| b.id.cmp(&a.id)) {
        for ingredient in &entry.dish.ingredients {
            let scaled = scale_amount(ingredient.amount, entry.dish.portion, entry.portion)?;
            let (label, key) = grocery_line(&ingredient.foodstuff, &ingredient.alternatives);

            let rows = sections
                .entry(ingredient.foodstuff.store_section.name.clone())
                .or_default();
            let row = rows.entry(key).or_insert_with(|| GroceryRow {
                label,
                lines: Vec::new(),
            });
            merge_quantity(&mut row.lines, scaled, &ingredient.unit.name);
        }
    }

    let mut result = ShoppingList::new();
    for (section_name, rows) in sections {
        let goods = result.entry(section_name).or_default();
        for (_, row) in rows {
            // Distinct merge keys can still render to the same label (a
            // foodstuff literally named "Water/Broth" next to a "Water"
            // with alternative "Broth"); fold their lines together so no
            // quantity is ever dropped.
            let lines = goods.entry(row.label).or_default();
            for line in row.lines {
                merge_quantity(lines, line.amount, &line.unit);
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dish, Foodstuff, Ingredient, Menu, MenuEntry, StoreSection, Unit};

    fn section(id: i64, name: &str) -> StoreSection {
        StoreSection {
            id,
            name: name.to_string(),
        }
    }

    fn foodstuff(id: i64, name: &str, store_section: StoreSection) -> Foodstuff {
        Foodstuff {
            id,
            name: name.to_string(),
            store_section,
        }
    }

    fn ingredient(id: i64, foodstuff: Foodstuff, amount: f64, unit: &str) -> Ingredient {
        Ingredient {
            id,
            dish_id: 0,
            foodstuff,
            amount,
            unit: Unit {
                id,
                name: unit.to_string(),
            },
            stage: None,
            pre_pack_type: None,
            alternatives: Vec::new(),
        }
    }

    fn dish(id: i64, name: &str, portion: i32, ingredients: Vec<Ingredient>) -> Dish {
        Dish {
            id,
            name: name.to_string(),
            description: String::new(),
            portion,
            cook_time: 30,
            all_time: 60,
            categories: Vec::new(),
            ingredients,
        }
    }

    fn menu(entries: Vec<MenuEntry>) -> Menu {
        Menu {
            id: 1,
            name: "Dinner".to_string(),
            entries,
        }
    }

    fn entry(id: i64, dish: Dish, portion: i32) -> MenuEntry {
        MenuEntry {
            id,
            menu_id: 1,
            dish,
            portion,
        }
    }

    #[test]
    fn scales_single_ingredient_to_requested_portion() {
        // Soup is written for 2 servings, requested at 4: 100g -> 200g
        let carrot = foodstuff(1, "Carrot", section(1, "Vegetables"));
        let soup = dish(1, "Soup", 2, vec![ingredient(1, carrot, 100.0, "g")]);
        let list = compute_shopping_list(&menu(vec![entry(1, soup, 4)])).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(
            list["Vegetables"]["Carrot"],
            vec![QuantityLine::new(200.0, "g")]
        );
    }

    #[test]
    fn alternatives_extend_the_label_and_section_comes_from_primary() {
        let carrot = foodstuff(1, "Carrot", section(1, "Vegetables"));
        let mut water = ingredient(2, foodstuff(2, "Water", section(2, "Liquids")), 50.0, "ml");
        water.alternatives = vec![foodstuff(3, "Broth", section(2, "Liquids"))];

        let soup = dish(
            1,
            "Soup",
            2,
            vec![ingredient(1, carrot, 100.0, "g"), water],
        );
        let list = compute_shopping_list(&menu(vec![entry(1, soup, 4)])).unwrap();

        assert_eq!(
            list["Liquids"]["Water/Broth"],
            vec![QuantityLine::new(100.0, "ml")]
        );
    }

    #[test]
    fn differing_units_stay_separate_lines() {
        let veg = section(1, "Vegetables");
        let soup = dish(
            1,
            "Soup",
            2,
            vec![
                ingredient(1, foodstuff(1, "Carrot", veg.clone()), 500.0, "g"),
                ingredient(2, foodstuff(1, "Carrot", veg), 0.5, "kg"),
            ],
        );
        let list = compute_shopping_list(&menu(vec![entry(1, soup, 2)])).unwrap();

        assert_eq!(
            list["Vegetables"]["Carrot"],
            vec![QuantityLine::new(500.0, "g"), QuantityLine::new(0.5, "kg")]
        );
    }

    #[test]
    fn same_unit_amounts_sum_across_dishes() {
        let veg = section(1, "Vegetables");
        let soup = dish(
            1,
            "Soup",
            2,
            vec![ingredient(1, foodstuff(1, "Carrot", veg.clone()), 100.0, "g")],
        );
        let stew = dish(
            2,
            "Stew",
            4,
            vec![ingredient(2, foodstuff(1, "Carrot", veg), 200.0, "g")],
        );
        let list =
            compute_shopping_list(&menu(vec![entry(1, soup, 4), entry(2, stew, 4)])).unwrap();

        // 100 * 4/2 + 200 * 4/4 = 400
        assert_eq!(
            list["Vegetables"]["Carrot"],
            vec![QuantityLine::new(400.0, "g")]
        );
    }

    #[test]
    fn totals_do_not_depend_on_entry_order() {
        let veg = section(1, "Vegetables");
        let soup = dish(
            1,
            "Soup",
            2,
            vec![ingredient(1, foodstuff(1, "Carrot", veg.clone()), 100.0, "g")],
        );
        let stew = dish(
            2,
            "Stew",
            4,
            vec![ingredient(2, foodstuff(1, "Carrot", veg), 200.0, "g")],
        );

        let forward =
            compute_shopping_list(&menu(vec![entry(1, soup.clone(), 4), entry(2, stew.clone(), 4)]))
                .unwrap();
        let reversed =
            compute_shopping_list(&menu(vec![entry(2, stew, 4), entry(1, soup, 4)])).unwrap();

        assert_eq!(forward, reversed);
    }

    #[test]
    fn entries_are_traversed_by_id_descending() {
        let soup = dish(
            1,
            "Soup",
            2,
            vec![ingredient(
                1,
                foodstuff(1, "Carrot", section(1, "Vegetables")),
                100.0,
                "g",
            )],
        );
        let cake = dish(
            2,
            "Cake",
            4,
            vec![ingredient(2, foodstuff(2, "Flour", section(2, "Baking")), 300.0, "g")],
        );

        let list =
            compute_shopping_list(&menu(vec![entry(1, soup, 2), entry(5, cake, 4)])).unwrap();

        // Entry 5 comes first, so its section is inserted first.
        let sections: Vec<&String> = list.keys().collect();
        assert_eq!(sections, vec!["Baking", "Vegetables"]);
    }

    #[test]
    fn foodstuff_with_and_without_alternatives_stays_two_rows() {
        let veg = section(1, "Vegetables");
        let bare = ingredient(1, foodstuff(1, "Water", veg.clone()), 50.0, "ml");
        let mut with_alt = ingredient(2, foodstuff(1, "Water", veg), 30.0, "ml");
        with_alt.alternatives = vec![foodstuff(3, "Broth", section(2, "Liquids"))];

        let soup = dish(1, "Soup", 1, vec![bare, with_alt]);
        let list = compute_shopping_list(&menu(vec![entry(1, soup, 1)])).unwrap();

        let goods = &list["Vegetables"];
        assert_eq!(goods.len(), 2);
        assert_eq!(goods["Water"], vec![QuantityLine::new(50.0, "ml")]);
        assert_eq!(goods["Water/Broth"], vec![QuantityLine::new(30.0, "ml")]);
    }

    #[test]
    fn colliding_labels_fold_together_instead_of_replacing() {
        // Distinct merge keys, identical rendered label
        let liquids = section(2, "Liquids");
        let literal = ingredient(1, foodstuff(1, "Water/Broth", liquids.clone()), 300.0, "ml");
        let mut with_alt = ingredient(2, foodstuff(2, "Water", liquids.clone()), 500.0, "ml");
        with_alt.alternatives = vec![foodstuff(3, "Broth", liquids)];

        let soup = dish(1, "Soup", 1, vec![literal, with_alt]);
        let list = compute_shopping_list(&menu(vec![entry(1, soup, 1)])).unwrap();

        assert_eq!(list["Liquids"].len(), 1);
        assert_eq!(
            list["Liquids"]["Water/Broth"],
            vec![QuantityLine::new(800.0, "ml")]
        );
    }

    #[test]
    fn empty_menu_yields_empty_map() {
        let list = compute_shopping_list(&menu(vec![])).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let soup = dish(
            1,
            "Soup",
            2,
            vec![ingredient(
                1,
                foodstuff(1, "Carrot", section(1, "Vegetables")),
                100.0,
                "g",
            )],
        );
        let m = menu(vec![entry(1, soup, 4)]);

        let first = compute_shopping_list(&m).unwrap();
        let second = compute_shopping_list(&m).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn zero_baseline_portion_propagates_data_integrity_error() {
        let soup = dish(
            1,
            "Soup",
            0,
            vec![ingredient(
                1,
                foodstuff(1, "Carrot", section(1, "Vegetables")),
                100.0,
                "g",
            )],
        );
        let err = compute_shopping_list(&menu(vec![entry(1, soup, 4)])).unwrap_err();
        assert!(matches!(err, AggregationError::DataIntegrity(_)));
    }
}
