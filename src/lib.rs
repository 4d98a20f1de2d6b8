pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
