/// Best-score tracking on play creation and deletion.
pub mod best_score;
/// Board rendering for the selected date range.
pub mod board_service;
/// Date-range modes and their intervals.
pub mod date_range;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Random start-player picker.
pub mod picker;
/// Add-play form editing, submission and play deletion.
pub mod play_service;
/// Player and game registration.
pub mod roster_service;
/// Statistics over the plays of a window.
pub mod stats;
/// Record store connection supervisor with backoff.
pub mod storage_supervisor;
