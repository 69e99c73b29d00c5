pub mod backend;
pub mod config;
pub mod constants;
pub mod controller;
pub mod download;
pub mod executor;
pub mod message;
pub mod reveal;
pub mod session;
