/// Typed helpers publishing each battle event.
pub mod battle_events;
/// Start and stop coordination.
pub mod battle_service;
/// Realtime broadcast client.
pub mod broadcaster;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Per-battle phase loop.
pub mod orchestrator;
/// Read-only pull projections.
pub mod public_service;
/// Short-lived realtime tokens.
pub mod token_issuer;
