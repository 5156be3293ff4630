//! Library crate for the battle orchestrator, exposing modules for binaries and tests.

/// Environment-driven startup configuration.
pub mod config;
/// Battle store abstraction, models and the Supabase adapter.
pub mod dao;
/// Request, response and broadcast payloads.
pub mod dto;
mod error;
/// HTTP routers.
pub mod routes;
/// Orchestration, broadcasting and read services.
pub mod services;
/// Shared application state, orchestrator registry and phase machine.
pub mod state;

#[cfg(test)]
mod test_support;
