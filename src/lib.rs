// src/lib.rs

pub mod classifier;
pub mod config;
pub mod error;
pub mod provider;
pub mod server;
pub mod session;
pub mod video;
