pub mod app;
pub mod trim_widget;
