pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use app::app;
pub use state::AppState;
