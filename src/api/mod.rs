pub mod dictionary_handlers;
pub mod handlers;
pub mod routes;
