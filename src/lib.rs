pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod period;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;
