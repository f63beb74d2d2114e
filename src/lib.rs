pub mod collector;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod imagery;
pub mod models;
pub mod observability;
pub mod services;
pub mod stats;
pub mod utils;
pub mod web;
