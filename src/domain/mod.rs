pub mod models;
pub mod picker;
pub mod settings;
