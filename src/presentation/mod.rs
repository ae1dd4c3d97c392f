pub mod app;
pub mod components;
pub mod picker_dialog;
pub mod theme;
