pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod state;
pub mod types;
