pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod search;
pub mod services;
pub mod startup;
pub mod utils;
