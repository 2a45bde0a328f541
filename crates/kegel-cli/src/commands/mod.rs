pub mod auth;
pub mod config;
pub mod exercise;
pub mod progress;
