use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::api::{dictionary_handlers, handlers};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>(images_dir: &str) -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dishes and their ingredients
        .route("/dish", get(handlers::list_dishes::<S>))
        .route("/dish", post(handlers::create_dish::<S>))
        .route("/dish/:id", get(handlers::get_dish::<S>))
        .route("/dish/:id", put(handlers::update_dish::<S>))
        .route("/dish/:id", delete(handlers::delete_dish::<S>))
        .route(
            "/dish/:dish_id/ingredient",
            get(handlers::list_ingredients::<S>),
        )
        .route(
            "/dish/:dish_id/ingredient",
            post(handlers::create_ingredient::<S>),
        )
        .route(
            "/dish/:dish_id/ingredient/:id",
            get(handlers::get_ingredient::<S>),
        )
        .route(
            "/dish/:dish_id/ingredient/:id",
            put(handlers::update_ingredient::<S>),
        )
        .route(
            "/dish/:dish_id/ingredient/:id",
            delete(handlers::delete_ingredient::<S>),
        )
        // Foodstuffs
        .route("/foodstuff", get(handlers::list_foodstuffs::<S>))
        .route("/foodstuff", post(handlers::create_foodstuff::<S>))
        .route("/foodstuff/:id", get(handlers::get_foodstuff::<S>))
        .route("/foodstuff/:id", put(handlers::update_foodstuff::<S>))
        .route("/foodstuff/:id", delete(handlers::delete_foodstuff::<S>))
        // Dictionaries
        .route(
            "/store_section",
            get(dictionary_handlers::list_store_sections::<S>),
        )
        .route(
            "/store_section",
            post(dictionary_handlers::create_store_section::<S>),
        )
        .route(
            "/store_section/:id",
            get(dictionary_handlers::get_store_section::<S>),
        )
        .route(
            "/store_section/:id",
            put(dictionary_handlers::update_store_section::<S>),
        )
        .route(
            "/store_section/:id",
            delete(dictionary_handlers::delete_store_section::<S>),
        )
        .route("/unit", get(dictionary_handlers::list_units::<S>))
        .route("/unit", post(dictionary_handlers::create_unit::<S>))
        .route("/unit/:id", get(dictionary_handlers::get_unit::<S>))
        .route("/unit/:id", put(dictionary_handlers::update_unit::<S>))
        .route("/unit/:id", delete(dictionary_handlers::delete_unit::<S>))
        .route("/stage", get(dictionary_handlers::list_stages::<S>))
        .route("/stage", post(dictionary_handlers::create_stage::<S>))
        .route("/stage/:id", get(dictionary_handlers::get_stage::<S>))
        .route("/stage/:id", put(dictionary_handlers::update_stage::<S>))
        .route("/stage/:id", delete(dictionary_handlers::delete_stage::<S>))
        .route("/category", get(dictionary_handlers::list_categories::<S>))
        .route("/category", post(dictionary_handlers::create_category::<S>))
        .route("/category/:id", get(dictionary_handlers::get_category::<S>))
        .route(
            "/category/:id",
            put(dictionary_handlers::update_category::<S>),
        )
        .route(
            "/category/:id",
            delete(dictionary_handlers::delete_category::<S>),
        )
        .route(
            "/pre_pack_type",
            get(dictionary_handlers::list_pre_pack_types::<S>),
        )
        .route(
            "/pre_pack_type",
            post(dictionary_handlers::create_pre_pack_type::<S>),
        )
        .route(
            "/pre_pack_type/:id",
            get(dictionary_handlers::get_pre_pack_type::<S>),
        )
        .route(
            "/pre_pack_type/:id",
            put(dictionary_handlers::update_pre_pack_type::<S>),
        )
        .route(
            "/pre_pack_type/:id",
            delete(dictionary_handlers::delete_pre_pack_type::<S>),
        )
        // Menus and their dish instances
        .route("/menu", get(handlers::list_menus::<S>))
        .route("/menu", post(handlers::create_menu::<S>))
        .route("/menu/:id", get(handlers::get_menu::<S>))
        .route("/menu/:id", put(handlers::update_menu::<S>))
        .route("/menu/:id", delete(handlers::delete_menu::<S>))
        .route(
            "/menu/:menu_id/dish",
            get(handlers::list_menu_entries::<S>),
        )
        .route(
            "/menu/:menu_id/dish",
            post(handlers::create_menu_entry::<S>),
        )
        .route(
            "/menu/:menu_id/dish/:id",
            get(handlers::get_menu_entry::<S>),
        )
        .route(
            "/menu/:menu_id/dish/:id",
            put(handlers::update_menu_entry::<S>),
        )
        .route(
            "/menu/:menu_id/dish/:id",
            delete(handlers::delete_menu_entry::<S>),
        )
        // Aggregation
        .route(
            "/menu/:menu_id/shopping",
            get(handlers::get_shopping_list::<S>),
        )
        .route(
            "/menu/:menu_id/pre_pack",
            get(handlers::get_pre_pack_list::<S>),
        )
        // Dish images are plain static files, one per dish id
        .nest_service("/images", ServeDir::new(images_dir))
}
