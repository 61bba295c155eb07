//! CRUD handlers for the five dictionary tables. All dictionaries share
//! the `{id, name}` shape, so the per-table endpoints are thin wrappers
//! around one generic implementation parameterized by `DictionaryKind`.

use axum::{extract::Path, extract::State, http::StatusCode, response::Json, Json as RequestJson};

use crate::api::handlers::{ApiError, AppState};
use crate::model::{DictionaryEntry, DictionaryKind, Id, NewDictionaryEntry};
use crate::store::traits::Store;

async fn list_dictionary<S: Store>(
    store: AppState<S>,
    kind: DictionaryKind,
) -> Result<Json<Vec<DictionaryEntry>>, (StatusCode, Json<ApiError>)> {
    match store.list_entries(kind).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

async fn get_dictionary_entry<S: Store>(
    store: AppState<S>,
    kind: DictionaryKind,
    id: Id,
) -> Result<Json<DictionaryEntry>, (StatusCode, Json<ApiError>)> {
    match store.get_entry(kind, id).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Entry not found")),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

async fn create_dictionary_entry<S: Store>(
    store: AppState<S>,
    kind: DictionaryKind,
    new: NewDictionaryEntry,
) -> Result<(StatusCode, Json<DictionaryEntry>), (StatusCode, Json<ApiError>)> {
    if new.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::field_message("name", "Must not be empty")),
        ));
    }

    match store.create_entry(kind, &new.name).await {
        Ok(entry) => Ok((StatusCode::CREATED, Json(entry))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

async fn update_dictionary_entry<S: Store>(
    store: AppState<S>,
    kind: DictionaryKind,
    id: Id,
    new: NewDictionaryEntry,
) -> Result<Json<DictionaryEntry>, (StatusCode, Json<ApiError>)> {
    if new.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::field_message("name", "Must not be empty")),
        ));
    }

    match store.update_entry(kind, id, &new.name).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Entry not found")),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

/// Refuses the delete with 422 while the entry is still referenced
/// (sections by foodstuffs, units/stages/pre-pack types by ingredients,
/// categories by dishes).
async fn delete_dictionary_entry<S: Store>(
    store: AppState<S>,
    kind: DictionaryKind,
    id: Id,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match store.get_entry(kind, id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new("Entry not found")),
            ))
        }
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(&e.to_string())),
            ))
        }
    }

    match store.entry_in_use(kind, id).await {
        Ok(true) => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiError::field_message(kind.field(), "Already use")),
            ))
        }
        Ok(false) => {}
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(&e.to_string())),
            ))
        }
    }

    match store.delete_entry(kind, id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(&e.to_string())),
        )),
    }
}

macro_rules! dictionary_endpoints {
    ($kind:expr, $list:ident, $create:ident, $get:ident, $update:ident, $delete:ident) => {
        pub async fn $list<S: Store>(
            State(store): State<AppState<S>>,
        ) -> Result<Json<Vec<DictionaryEntry>>, (StatusCode, Json<ApiError>)> {
            list_dictionary(store, $kind).await
        }

        pub async fn $create<S: Store>(
            State(store): State<AppState<S>>,
            RequestJson(new): RequestJson<NewDictionaryEntry>,
        ) -> Result<(StatusCode, Json<DictionaryEntry>), (StatusCode, Json<ApiError>)> {
            create_dictionary_entry(store, $kind, new).await
        }

        pub async fn $get<S: Store>(
            State(store): State<AppState<S>>,
            Path(id): Path<Id>,
        ) -> Result<Json<DictionaryEntry>, (StatusCode, Json<ApiError>)> {
            get_dictionary_entry(store, $kind, id).await
        }

        pub async fn $update<S: Store>(
            State(store): State<AppState<S>>,
            Path(id): Path<Id>,
            RequestJson(new): RequestJson<NewDictionaryEntry>,
        ) -> Result<Json<DictionaryEntry>, (StatusCode, Json<ApiError>)> {
            update_dictionary_entry(store, $kind, id, new).await
        }

        pub async fn $delete<S: Store>(
            State(store): State<AppState<S>>,
            Path(id): Path<Id>,
        ) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
            delete_dictionary_entry(store, $kind, id).await
        }
    };
}

dictionary_endpoints!(
    DictionaryKind::StoreSection,
    list_store_sections,
    create_store_section,
    get_store_section,
    update_store_section,
    delete_store_section
);
dictionary_endpoints!(
    DictionaryKind::Unit,
    list_units,
    create_unit,
    get_unit,
    update_unit,
    delete_unit
);
dictionary_endpoints!(
    DictionaryKind::Stage,
    list_stages,
    create_stage,
    get_stage,
    update_stage,
    delete_stage
);
dictionary_endpoints!(
    DictionaryKind::Category,
    list_categories,
    create_category,
    get_category,
    update_category,
    delete_category
);
dictionary_endpoints!(
    DictionaryKind::PrePackType,
    list_pre_pack_types,
    create_pre_pack_type,
    get_pre_pack_type,
    update_pre_pack_type,
    delete_pre_pack_type
);
