/// Bearer-token sessions.
pub mod auth_service;
/// Promotional message feed.
pub mod buzz_service;
/// Catalog synchronisation and queries.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Score submission and the live top-N view.
pub mod leaderboard_service;
/// Per-player preferences.
pub mod preferences_service;
/// Interactive WebSocket sessions.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Document store connection supervisor.
pub mod storage_supervisor;
