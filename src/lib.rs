// Infrastructure
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod postgres;

// Domain
pub mod blocks;
pub mod display;
pub mod editor;
pub mod points;
pub mod variables;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
pub mod telemetry;
