pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod request;
pub mod routes;
pub mod state;
