/// Saving matches and reading the archive back.
pub mod archive_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Live scoring operations on the current match.
pub mod match_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Archive store connection supervisor.
pub mod storage_supervisor;
