pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod model;

pub use config::Config;
pub use error::AppError;
