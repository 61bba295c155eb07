use crate::model::{Foodstuff, Id};

/// Canonical merge identity of one grocery row: the primary foodstuff plus
/// the declared alternatives, in declared order. Two ingredient lines land
/// in the same row only when both match exactly, so the same foodstuff
/// with and without alternatives yields two distinct rows. That mirrors
/// the system's historical behavior and is deliberately not unified here.
///
/// Kept separate from the display label so merge identity never depends on
/// string formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroceryKey {
    pub foodstuff_id: Id,
    pub alternative_ids: Vec<Id>,
}

/// Resolve the display label and merge key for one ingredient line. The
/// label is the foodstuff name, extended with `/`-joined alternative names
/// when alternatives are declared.
pub fn grocery_line(foodstuff: &Foodstuff, alternatives: &[Foodstuff]) -> (String, GroceryKey) {
    let mut label = foodstuff.name.clone();
    for alternative in alternatives {
        label.push('/');
        label.push_str(&alternative.name);
    }

    let key = GroceryKey {
        foodstuff_id: foodstuff.id,
        alternative_ids: alternatives.iter().map(|alt| alt.id).collect(),
    };

    (label, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoreSection;

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

    #[test]
    fn label_is_plain_name_without_alternatives() {
        let (label, key) = grocery_line(&foodstuff(1, "Carrot"), &[]);
        assert_eq!(label, "Carrot");
        assert_eq!(
            key,
            GroceryKey {
                foodstuff_id: 1,
                alternative_ids: vec![],
            }
        );
    }

    #[test]
    fn label_joins_alternatives_in_declared_order() {
        let alts = vec![foodstuff(2, "Broth"), foodstuff(3, "Stock")];
        let (label, key) = grocery_line(&foodstuff(1, "Water"), &alts);
        assert_eq!(label, "Water/Broth/Stock");
        assert_eq!(key.alternative_ids, vec![2, 3]);
    }

    #[test]
    fn same_foodstuff_with_and_without_alternatives_is_two_keys() {
        let (_, bare) = grocery_line(&foodstuff(1, "Water"), &[]);
        let (_, with_alt) = grocery_line(&foodstuff(1, "Water"), &[foodstuff(2, "Broth")]);
        assert_ne!(bare, with_alt);
    }

    #[test]
    fn alternative_order_matters_for_identity() {
        let (_, ab) = grocery_line(
            &foodstuff(1, "Water"),
            &[foodstuff(2, "Broth"), foodstuff(3, "Stock")],
        );
        let (_, ba) = grocery_line(
            &foodstuff(1, "Water"),
            &[foodstuff(3, "Stock"), foodstuff(2, "Broth")],
        );
        assert_ne!(ab, ba);
    }
}
