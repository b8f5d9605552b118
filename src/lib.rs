pub mod app;
pub mod browse;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod debounce;
pub mod models;
pub mod placeholder;
