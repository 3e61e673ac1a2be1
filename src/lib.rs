pub mod accounts;
pub mod app;
pub mod auth;
pub mod client;
pub mod cookies;
pub mod csrf;
pub mod errors;
pub mod handlers;
pub mod likes;
pub mod models;
pub mod state;
pub mod storage;
pub mod ui;
pub mod validation;

pub use app::router;
pub use client::{LikeButton, LikeClient};
pub use models::LikeState;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
