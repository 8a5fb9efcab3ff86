pub mod app;
pub mod clients;
pub mod config;
pub mod handlers;
pub mod hooks;
pub mod pages;
pub mod query;
pub mod services;
pub mod state;
pub mod types;
