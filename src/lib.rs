pub mod server;
pub mod identity;
pub mod cookie;
pub mod assets;
pub mod config;
pub mod error;
