/// Battle control and pull endpoint payloads.
pub mod battle;
/// Realtime broadcast envelope and event names.
pub mod broadcast;
/// Health check payload.
pub mod health;
