pub mod cache;
pub mod compare;
pub mod config;
pub mod error;
pub mod java;
pub mod models;
pub mod providers;
pub mod service;
