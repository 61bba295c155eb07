//! Demonstration data: a handful of dictionary entries, foodstuffs, two
//! dishes and one menu. Loaded on startup when LOAD_SEED_DATA=true.

use anyhow::Result;
use log::info;

use crate::model::{
    DictionaryKind, NewDish, NewFoodstuff, NewIngredient, NewMenu, NewMenuEntry,
};
use crate::store::traits::Store;

pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    // Dictionaries
    let vegetables = store
        .create_entry(DictionaryKind::StoreSection, "Vegetables")
        .await?;
    let liquids = store
        .create_entry(DictionaryKind::StoreSection, "Liquids")
        .await?;
    let grains = store
        .create_entry(DictionaryKind::StoreSection, "Grains")
        .await?;

    let gram = store.create_entry(DictionaryKind::Unit, "g").await?;
    let milliliter = store.create_entry(DictionaryKind::Unit, "ml").await?;
    let piece = store.create_entry(DictionaryKind::Unit, "pcs").await?;

    let prep = store.create_entry(DictionaryKind::Stage, "prep").await?;
    let cooking = store.create_entry(DictionaryKind::Stage, "cooking").await?;

    let soups = store.create_entry(DictionaryKind::Category, "Soups").await?;
    let sides = store.create_entry(DictionaryKind::Category, "Sides").await?;

    let frozen = store
        .create_entry(DictionaryKind::PrePackType, "Frozen")
        .await?;

    info!("seed: dictionaries created");

    // Foodstuffs
    let carrot = store
        .create_foodstuff(&NewFoodstuff {
            name: "Carrot".to_string(),
            store_section_id: vegetables.id,
        })
        .await?;
    let onion = store
        .create_foodstuff(&NewFoodstuff {
            name: "Onion".to_string(),
            store_section_id: vegetables.id,
        })
        .await?;
    let peas = store
        .create_foodstuff(&NewFoodstuff {
            name: "Green peas".to_string(),
            store_section_id: vegetables.id,
        })
        .await?;
    let water = store
        .create_foodstuff(&NewFoodstuff {
            name: "Water".to_string(),
            store_section_id: liquids.id,
        })
        .await?;
    let broth = store
        .create_foodstuff(&NewFoodstuff {
            name: "Broth".to_string(),
            store_section_id: liquids.id,
        })
        .await?;
    let rice = store
        .create_foodstuff(&NewFoodstuff {
            name: "Rice".to_string(),
            store_section_id: grains.id,
        })
        .await?;

    info!("seed: foodstuffs created");

    // Dishes
    let soup = store
        .create_dish(&NewDish {
            name: "Vegetable soup".to_string(),
            description: "A light everyday soup.".to_string(),
            portion: 2,
            cook_time: 30,
            all_time: 45,
            categories: vec![soups.id],
        })
        .await?;
    store
        .create_ingredient(
            soup.id,
            &NewIngredient {
                foodstuff_id: carrot.id,
                amount: 100.0,
                unit_id: gram.id,
                stage_id: Some(prep.id),
                pre_pack_type_id: None,
                alternative_ids: vec![],
            },
        )
        .await?;
    store
        .create_ingredient(
            soup.id,
            &NewIngredient {
                foodstuff_id: water.id,
                amount: 500.0,
                unit_id: milliliter.id,
                stage_id: Some(cooking.id),
                pre_pack_type_id: None,
                alternative_ids: vec![broth.id],
            },
        )
        .await?;
    store
        .create_ingredient(
            soup.id,
            &NewIngredient {
                foodstuff_id: peas.id,
                amount: 150.0,
                unit_id: gram.id,
                stage_id: Some(cooking.id),
                pre_pack_type_id: Some(frozen.id),
                alternative_ids: vec![],
            },
        )
        .await?;

    let pilaf = store
        .create_dish(&NewDish {
            name: "Rice pilaf".to_string(),
            description: "Rice with onion, cooked in broth.".to_string(),
            portion: 4,
            cook_time: 40,
            all_time: 50,
            categories: vec![sides.id],
        })
        .await?;
    store
        .create_ingredient(
            pilaf.id,
            &NewIngredient {
                foodstuff_id: rice.id,
                amount: 300.0,
                unit_id: gram.id,
                stage_id: Some(prep.id),
                pre_pack_type_id: None,
                alternative_ids: vec![],
            },
        )
        .await?;
    store
        .create_ingredient(
            pilaf.id,
            &NewIngredient {
                foodstuff_id: onion.id,
                amount: 1.0,
                unit_id: piece.id,
                stage_id: Some(prep.id),
                pre_pack_type_id: None,
                alternative_ids: vec![],
            },
        )
        .await?;

    info!("seed: dishes created");

    // A menu with both dishes at scaled-up portions
    let menu = store
        .create_menu(&NewMenu {
            name: "Family dinner".to_string(),
        })
        .await?;
    store
        .create_menu_entry(
            menu.id,
            &NewMenuEntry {
                dish_id: soup.id,
                portion: 4,
            },
        )
        .await?;
    store
        .create_menu_entry(
            menu.id,
            &NewMenuEntry {
                dish_id: pilaf.id,
                portion: 6,
            },
        )
        .await?;

    info!("seed: menu created");

    Ok(())
}
