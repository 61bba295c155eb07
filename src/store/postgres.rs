use anyhow::{anyhow, Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Row};
use std::collections::HashMap;

use crate::model::{
    Category, DictionaryEntry, DictionaryKind, Dish, DishSummary, Foodstuff, FoodstuffFilter, Id,
    Ingredient, Menu, MenuEntry, MenuEntryRow, MenuSummary, NewDish, NewFoodstuff, NewIngredient,
    NewMenu, NewMenuEntry, PrePackType, Stage, StoreSection, Unit,
};
use crate::store::traits::{DictionaryStore, DishStore, FoodstuffStore, MenuStore, Store};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn foodstuff_from_row(row: &sqlx::postgres::PgRow) -> Foodstuff {
    Foodstuff {
        id: row.get("id"),
        name: row.get("name"),
        store_section: StoreSection {
            id: row.get("store_section_id"),
            name: row.get("store_section_name"),
        },
    }
}

const FOODSTUFF_SELECT: &str = "SELECT f.id, f.name, s.id AS store_section_id, s.name AS store_section_name \
     FROM foodstuff f JOIN d_store_section s ON s.id = f.store_section_id";

/// Hydrate ingredients for a set of dishes, including foodstuffs, store
/// sections, units, stages, pre-pack types and alternatives. Returned per
/// dish id, in stored (insertion) order.
async fn fetch_ingredients_for_dishes(
    conn: &mut PgConnection,
    dish_ids: &[Id],
) -> Result<HashMap<Id, Vec<Ingredient>>> {
    if dish_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        "SELECT i.id, i.dish_id, i.amount, \
                f.id AS foodstuff_id, f.name AS foodstuff_name, \
                ss.id AS store_section_id, ss.name AS store_section_name, \
                u.id AS unit_id, u.name AS unit_name, \
                st.id AS stage_id, st.name AS stage_name, \
                pp.id AS pre_pack_type_id, pp.name AS pre_pack_type_name \
         FROM ingredient i \
         JOIN foodstuff f ON f.id = i.foodstuff_id \
         JOIN d_store_section ss ON ss.id = f.store_section_id \
         JOIN d_unit u ON u.id = i.unit_id \
         LEFT JOIN d_stage st ON st.id = i.stage_id \
         LEFT JOIN d_pre_pack_type pp ON pp.id = i.pre_pack_type_id \
         WHERE i.dish_id = ANY($1) \
         ORDER BY i.id",
    )
    .bind(dish_ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch ingredients")?;

    let mut ingredients: Vec<Ingredient> = rows
        .iter()
        .map(|row| Ingredient {
            id: row.get("id"),
            dish_id: row.get("dish_id"),
            foodstuff: Foodstuff {
                id: row.get("foodstuff_id"),
                name: row.get("foodstuff_name"),
                store_section: StoreSection {
                    id: row.get("store_section_id"),
                    name: row.get("store_section_name"),
                },
            },
            amount: row.get("amount"),
            unit: Unit {
                id: row.get("unit_id"),
                name: row.get("unit_name"),
            },
            stage: row
                .get::<Option<Id>, _>("stage_id")
                .map(|id| Stage {
                    id,
                    name: row.get("stage_name"),
                }),
            pre_pack_type: row
                .get::<Option<Id>, _>("pre_pack_type_id")
                .map(|id| PrePackType {
                    id,
                    name: row.get("pre_pack_type_name"),
                }),
            alternatives: Vec::new(),
        })
        .collect();

    // Attach alternatives in declared order
    let ingredient_ids: Vec<Id> = ingredients.iter().map(|i| i.id).collect();
    let alt_rows = sqlx::query(
        "SELECT ia.ingredient_id, f.id, f.name, \
                ss.id AS store_section_id, ss.name AS store_section_name \
         FROM ingredient_alternatives ia \
         JOIN foodstuff f ON f.id = ia.foodstuff_id \
         JOIN d_store_section ss ON ss.id = f.store_section_id \
         WHERE ia.ingredient_id = ANY($1) \
         ORDER BY ia.id",
    )
    .bind(&ingredient_ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch ingredient alternatives")?;

    let mut alternatives: HashMap<Id, Vec<Foodstuff>> = HashMap::new();
    for row in &alt_rows {
        alternatives
            .entry(row.get("ingredient_id"))
            .or_default()
            .push(Foodstuff {
                id: row.get("id"),
                name: row.get("name"),
                store_section: StoreSection {
                    id: row.get("store_section_id"),
                    name: row.get("store_section_name"),
                },
            });
    }
    for ingredient in &mut ingredients {
        if let Some(alts) = alternatives.remove(&ingredient.id) {
            ingredient.alternatives = alts;
        }
    }

    let mut by_dish: HashMap<Id, Vec<Ingredient>> = HashMap::new();
    for ingredient in ingredients {
        by_dish.entry(ingredient.dish_id).or_default().push(ingredient);
    }
    Ok(by_dish)
}

async fn fetch_categories_for_dishes(
    conn: &mut PgConnection,
    dish_ids: &[Id],
) -> Result<HashMap<Id, Vec<Category>>> {
    if dish_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        "SELECT dc.dish_id, c.id, c.name \
         FROM dish_categories dc \
         JOIN d_category c ON c.id = dc.category_id \
         WHERE dc.dish_id = ANY($1) \
         ORDER BY c.id",
    )
    .bind(dish_ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch dish categories")?;

    let mut by_dish: HashMap<Id, Vec<Category>> = HashMap::new();
    for row in &rows {
        by_dish.entry(row.get("dish_id")).or_default().push(Category {
            id: row.get("id"),
            name: row.get("name"),
        });
    }
    Ok(by_dish)
}

/// Hydrate full dishes (categories + ingredients) for a set of ids
async fn fetch_dishes(conn: &mut PgConnection, dish_ids: &[Id]) -> Result<HashMap<Id, Dish>> {
    if dish_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        "SELECT id, name, description, portion, cook_time, all_time \
         FROM dish WHERE id = ANY($1)",
    )
    .bind(dish_ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch dishes")?;

    let mut categories = fetch_categories_for_dishes(&mut *conn, dish_ids).await?;
    let mut ingredients = fetch_ingredients_for_dishes(&mut *conn, dish_ids).await?;

    let mut dishes = HashMap::new();
    for row in &rows {
        let id: Id = row.get("id");
        dishes.insert(
            id,
            Dish {
                id,
                name: row.get("name"),
                description: row.get("description"),
                portion: row.get("portion"),
                cook_time: row.get("cook_time"),
                all_time: row.get("all_time"),
                categories: categories.remove(&id).unwrap_or_default(),
                ingredients: ingredients.remove(&id).unwrap_or_default(),
            },
        );
    }
    Ok(dishes)
}

#[async_trait::async_trait]
impl DictionaryStore for PostgresStore {
    async fn list_entries(&self, kind: DictionaryKind) -> Result<Vec<DictionaryEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT id, name FROM {} ORDER BY id DESC",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list {}", kind.table()))?;

        Ok(rows
            .iter()
            .map(|row| DictionaryEntry {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn get_entry(&self, kind: DictionaryKind, id: Id) -> Result<Option<DictionaryEntry>> {
        let row = sqlx::query(&format!(
            "SELECT id, name FROM {} WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch {} entry", kind.table()))?;

        Ok(row.map(|row| DictionaryEntry {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn create_entry(&self, kind: DictionaryKind, name: &str) -> Result<DictionaryEntry> {
        let row = sqlx::query(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            kind.table()
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to create {} entry", kind.table()))?;

        Ok(DictionaryEntry {
            id: row.get("id"),
            name: row.get("name"),
        })
    }

    async fn update_entry(
        &self,
        kind: DictionaryKind,
        id: Id,
        name: &str,
    ) -> Result<Option<DictionaryEntry>> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET name = $2 WHERE id = $1 RETURNING id, name",
            kind.table()
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to update {} entry", kind.table()))?;

        Ok(row.map(|row| DictionaryEntry {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn delete_entry(&self, kind: DictionaryKind, id: Id) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {} entry", kind.table()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn entry_in_use(&self, kind: DictionaryKind, id: Id) -> Result<bool> {
        let query = match kind {
            DictionaryKind::StoreSection => {
                "SELECT 1 FROM foodstuff WHERE store_section_id = $1 LIMIT 1"
            }
            DictionaryKind::Unit => "SELECT 1 FROM ingredient WHERE unit_id = $1 LIMIT 1",
            DictionaryKind::Stage => "SELECT 1 FROM ingredient WHERE stage_id = $1 LIMIT 1",
            DictionaryKind::PrePackType => {
                "SELECT 1 FROM ingredient WHERE pre_pack_type_id = $1 LIMIT 1"
            }
            DictionaryKind::Category => {
                "SELECT 1 FROM dish_categories WHERE category_id = $1 LIMIT 1"
            }
        };

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to check {} usage", kind.table()))?;

        Ok(row.is_some())
    }
}

#[async_trait::async_trait]
impl FoodstuffStore for PostgresStore {
    async fn list_foodstuffs(&self, filter: &FoodstuffFilter) -> Result<Vec<Foodstuff>> {
        // Filtered listings order by name, unfiltered by section, both
        // descending. These are the canonical listing orders of this API.
        let rows = match filter.store_section_id {
            Some(section_id) => {
                sqlx::query(&format!(
                    "{} WHERE f.store_section_id = $1 ORDER BY f.name DESC",
                    FOODSTUFF_SELECT
                ))
                .bind(section_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "{} ORDER BY f.store_section_id DESC",
                    FOODSTUFF_SELECT
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list foodstuffs")?;

        Ok(rows.iter().map(foodstuff_from_row).collect())
    }

    async fn get_foodstuff(&self, id: Id) -> Result<Option<Foodstuff>> {
        let row = sqlx::query(&format!("{} WHERE f.id = $1", FOODSTUFF_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch foodstuff")?;

        Ok(row.as_ref().map(foodstuff_from_row))
    }

    async fn create_foodstuff(&self, new: &NewFoodstuff) -> Result<Foodstuff> {
        let row = sqlx::query(
            "INSERT INTO foodstuff (name, store_section_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(&new.name)
        .bind(new.store_section_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create foodstuff")?;

        let id: Id = row.get("id");
        self.get_foodstuff(id)
            .await?
            .ok_or_else(|| anyhow!("foodstuff {} missing after insert", id))
    }

    async fn update_foodstuff(&self, id: Id, new: &NewFoodstuff) -> Result<Option<Foodstuff>> {
        let result = sqlx::query("UPDATE foodstuff SET name = $2, store_section_id = $3 WHERE id = $1")
            .bind(id)
            .bind(&new.name)
            .bind(new.store_section_id)
            .execute(&self.pool)
            .await
            .context("Failed to update foodstuff")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_foodstuff(id).await
    }

    async fn delete_foodstuff(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM foodstuff WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete foodstuff")?;

        Ok(result.rows_affected() > 0)
    }

    async fn foodstuff_name_exists(&self, name: &str, except_id: Option<Id>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM foodstuff WHERE name = $1 AND ($2::bigint IS NULL OR id <> $2) LIMIT 1",
        )
        .bind(name)
        .bind(except_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check foodstuff name")?;

        Ok(row.is_some())
    }

    async fn foodstuff_in_use(&self, id: Id) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM ingredient WHERE foodstuff_id = $1 \
             UNION ALL \
             SELECT 1 FROM ingredient_alternatives WHERE foodstuff_id = $1 \
             LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check foodstuff usage")?;

        Ok(row.is_some())
    }
}

#[async_trait::async_trait]
impl DishStore for PostgresStore {
    async fn list_dishes(&self) -> Result<Vec<DishSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, description, portion, cook_time, all_time \
             FROM dish ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list dishes")?;

        let dish_ids: Vec<Id> = rows.iter().map(|row| row.get("id")).collect();
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let mut categories = fetch_categories_for_dishes(&mut *conn, &dish_ids).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Id = row.get("id");
                DishSummary {
                    id,
                    name: row.get("name"),
                    description: row.get("description"),
                    portion: row.get("portion"),
                    cook_time: row.get("cook_time"),
                    all_time: row.get("all_time"),
                    categories: categories.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn get_dish(&self, id: Id) -> Result<Option<Dish>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let mut dishes = fetch_dishes(&mut *conn, &[id]).await?;
        Ok(dishes.remove(&id))
    }

    async fn create_dish(&self, new: &NewDish) -> Result<DishSummary> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            "INSERT INTO dish (name, description, portion, cook_time, all_time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.portion)
        .bind(new.cook_time)
        .bind(new.all_time)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create dish")?;
        let id: Id = row.get("id");

        for category_id in &new.categories {
            sqlx::query("INSERT INTO dish_categories (category_id, dish_id) VALUES ($1, $2)")
                .bind(category_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to attach dish category")?;
        }

        tx.commit().await.context("Failed to commit dish")?;

        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let mut categories = fetch_categories_for_dishes(&mut *conn, &[id]).await?;
        Ok(DishSummary {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            portion: new.portion,
            cook_time: new.cook_time,
            all_time: new.all_time,
            categories: categories.remove(&id).unwrap_or_default(),
        })
    }

    async fn update_dish(&self, id: Id, new: &NewDish) -> Result<Option<DishSummary>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            "UPDATE dish SET name = $2, description = $3, portion = $4, cook_time = $5, all_time = $6 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.portion)
        .bind(new.cook_time)
        .bind(new.all_time)
        .execute(&mut *tx)
        .await
        .context("Failed to update dish")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        // Category set is replaced wholesale on update
        sqlx::query("DELETE FROM dish_categories WHERE dish_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear dish categories")?;
        for category_id in &new.categories {
            sqlx::query("INSERT INTO dish_categories (category_id, dish_id) VALUES ($1, $2)")
                .bind(category_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to attach dish category")?;
        }

        tx.commit().await.context("Failed to commit dish update")?;

        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let mut categories = fetch_categories_for_dishes(&mut *conn, &[id]).await?;
        Ok(Some(DishSummary {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            portion: new.portion,
            cook_time: new.cook_time,
            all_time: new.all_time,
            categories: categories.remove(&id).unwrap_or_default(),
        }))
    }

    async fn delete_dish(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dish WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete dish")?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_ingredient(&self, dish_id: Id, new: &NewIngredient) -> Result<Ingredient> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            "INSERT INTO ingredient (dish_id, foodstuff_id, amount, unit_id, stage_id, pre_pack_type_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(dish_id)
        .bind(new.foodstuff_id)
        .bind(new.amount)
        .bind(new.unit_id)
        .bind(new.stage_id)
        .bind(new.pre_pack_type_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create ingredient")?;
        let id: Id = row.get("id");

        for alternative_id in &new.alternative_ids {
            sqlx::query(
                "INSERT INTO ingredient_alternatives (ingredient_id, foodstuff_id) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(alternative_id)
            .execute(&mut *tx)
            .await
            .context("Failed to attach ingredient alternative")?;
        }

        tx.commit().await.context("Failed to commit ingredient")?;

        self.get_ingredient(dish_id, id)
            .await?
            .ok_or_else(|| anyhow!("ingredient {} missing after insert", id))
    }

    async fn get_ingredient(&self, dish_id: Id, id: Id) -> Result<Option<Ingredient>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let ingredients = fetch_ingredients_for_dishes(&mut *conn, &[dish_id]).await?;
        Ok(ingredients
            .get(&dish_id)
            .and_then(|list| list.iter().find(|i| i.id == id).cloned()))
    }

    async fn update_ingredient(
        &self,
        dish_id: Id,
        id: Id,
        new: &NewIngredient,
    ) -> Result<Option<Ingredient>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            "UPDATE ingredient SET foodstuff_id = $3, amount = $4, unit_id = $5, stage_id = $6, pre_pack_type_id = $7 \
             WHERE id = $1 AND dish_id = $2",
        )
        .bind(id)
        .bind(dish_id)
        .bind(new.foodstuff_id)
        .bind(new.amount)
        .bind(new.unit_id)
        .bind(new.stage_id)
        .bind(new.pre_pack_type_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update ingredient")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        // Alternatives are replaced wholesale, preserving declared order
        sqlx::query("DELETE FROM ingredient_alternatives WHERE ingredient_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear ingredient alternatives")?;
        for alternative_id in &new.alternative_ids {
            sqlx::query(
                "INSERT INTO ingredient_alternatives (ingredient_id, foodstuff_id) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(alternative_id)
            .execute(&mut *tx)
            .await
            .context("Failed to attach ingredient alternative")?;
        }

        tx.commit().await.context("Failed to commit ingredient update")?;

        self.get_ingredient(dish_id, id).await
    }

    async fn delete_ingredient(&self, dish_id: Id, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredient WHERE id = $1 AND dish_id = $2")
            .bind(id)
            .bind(dish_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete ingredient")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl MenuStore for PostgresStore {
    async fn list_menus(&self) -> Result<Vec<MenuSummary>> {
        let rows = sqlx::query("SELECT id, name FROM menu ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list menus")?;

        Ok(rows
            .iter()
            .map(|row| MenuSummary {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn get_menu(&self, id: Id) -> Result<Option<MenuSummary>> {
        let row = sqlx::query("SELECT id, name FROM menu WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch menu")?;

        Ok(row.map(|row| MenuSummary {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn create_menu(&self, new: &NewMenu) -> Result<MenuSummary> {
        let row = sqlx::query("INSERT INTO menu (name) VALUES ($1) RETURNING id, name")
            .bind(&new.name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create menu")?;

        Ok(MenuSummary {
            id: row.get("id"),
            name: row.get("name"),
        })
    }

    async fn update_menu(&self, id: Id, new: &NewMenu) -> Result<Option<MenuSummary>> {
        let row = sqlx::query("UPDATE menu SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&new.name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update menu")?;

        Ok(row.map(|row| MenuSummary {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn delete_menu(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete menu")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_menu_entries(&self, menu_id: Id) -> Result<Vec<MenuEntryRow>> {
        let rows = sqlx::query(
            "SELECT id, menu_id, dish_id, portion FROM menu_dishes WHERE menu_id = $1 ORDER BY id DESC",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list menu entries")?;

        Ok(rows
            .iter()
            .map(|row| MenuEntryRow {
                id: row.get("id"),
                menu_id: row.get("menu_id"),
                dish_id: row.get("dish_id"),
                portion: row.get("portion"),
            })
            .collect())
    }

    async fn get_menu_entry(&self, menu_id: Id, id: Id) -> Result<Option<MenuEntryRow>> {
        let row = sqlx::query(
            "SELECT id, menu_id, dish_id, portion FROM menu_dishes WHERE menu_id = $1 AND id = $2",
        )
        .bind(menu_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch menu entry")?;

        Ok(row.map(|row| MenuEntryRow {
            id: row.get("id"),
            menu_id: row.get("menu_id"),
            dish_id: row.get("dish_id"),
            portion: row.get("portion"),
        }))
    }

    async fn create_menu_entry(&self, menu_id: Id, new: &NewMenuEntry) -> Result<MenuEntryRow> {
        let row = sqlx::query(
            "INSERT INTO menu_dishes (menu_id, dish_id, portion) VALUES ($1, $2, $3) \
             RETURNING id, menu_id, dish_id, portion",
        )
        .bind(menu_id)
        .bind(new.dish_id)
        .bind(new.portion)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create menu entry")?;

        Ok(MenuEntryRow {
            id: row.get("id"),
            menu_id: row.get("menu_id"),
            dish_id: row.get("dish_id"),
            portion: row.get("portion"),
        })
    }

    async fn update_menu_entry(
        &self,
        menu_id: Id,
        id: Id,
        new: &NewMenuEntry,
    ) -> Result<Option<MenuEntryRow>> {
        let row = sqlx::query(
            "UPDATE menu_dishes SET dish_id = $3, portion = $4 WHERE menu_id = $1 AND id = $2 \
             RETURNING id, menu_id, dish_id, portion",
        )
        .bind(menu_id)
        .bind(id)
        .bind(new.dish_id)
        .bind(new.portion)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update menu entry")?;

        Ok(row.map(|row| MenuEntryRow {
            id: row.get("id"),
            menu_id: row.get("menu_id"),
            dish_id: row.get("dish_id"),
            portion: row.get("portion"),
        }))
    }

    async fn delete_menu_entry(&self, menu_id: Id, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu_dishes WHERE menu_id = $1 AND id = $2")
            .bind(menu_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete menu entry")?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_menu_graph(&self, menu_id: Id) -> Result<Option<Menu>> {
        // One transaction so the aggregation never sees a half-edited menu
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let menu_row = sqlx::query("SELECT id, name FROM menu WHERE id = $1")
            .bind(menu_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch menu")?;
        let Some(menu_row) = menu_row else {
            return Ok(None);
        };

        let entry_rows = sqlx::query(
            "SELECT id, menu_id, dish_id, portion FROM menu_dishes WHERE menu_id = $1 ORDER BY id DESC",
        )
        .bind(menu_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to fetch menu entries")?;

        let dish_ids: Vec<Id> = entry_rows.iter().map(|row| row.get("dish_id")).collect();
        let dishes = fetch_dishes(&mut *tx, &dish_ids).await?;

        tx.commit().await.context("Failed to commit menu graph read")?;

        let mut entries = Vec::with_capacity(entry_rows.len());
        for row in &entry_rows {
            let dish_id: Id = row.get("dish_id");
            let dish = dishes
                .get(&dish_id)
                .cloned()
                .ok_or_else(|| anyhow!("menu {} references missing dish {}", menu_id, dish_id))?;
            entries.push(MenuEntry {
                id: row.get("id"),
                menu_id: row.get("menu_id"),
                dish,
                portion: row.get("portion"),
            });
        }

        Ok(Some(Menu {
            id: menu_row.get("id"),
            name: menu_row.get("name"),
            entries,
        }))
    }
}

impl Store for PostgresStore {}
