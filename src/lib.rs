pub mod app;
pub mod authz;
pub mod clock;
pub mod db;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod routes;
pub mod utils;

pub use app::{create_app, create_app_with_clock, AppState};
