/// Comment Service Library
///
/// Posts with threaded comments, paginated reply listings, comment depth and
/// live per-post comment feeds. Transport-agnostic: an embedding server wires
/// `AppState` into its own request handlers.
///
/// # Modules
///
/// - `models`: Data structures for posts, comments and pagination
/// - `storage`: `CommentStore` trait with PostgreSQL and in-memory backends
/// - `subscription`: Per-post fan-out of newly created comments
/// - `services`: Business logic layer
/// - `state`: Startup wiring from configuration
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `logging`: Tracing subscriber setup for embedding binaries
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod subscription;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
