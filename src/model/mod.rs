pub mod common;
pub mod dictionary;
pub mod dish;
pub mod foodstuff;
pub mod menu;

pub use common::*;
pub use dictionary::*;
pub use dish::*;
pub use foodstuff::*;
pub use menu::*;
