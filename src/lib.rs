pub mod api;
pub mod config;
pub mod export;
pub mod models;
pub mod service;
pub mod vision;

pub use config::AppConfig;
pub use service::{CartExtractor, CartService};
