//! Web dashboard for the research data lifecycle.
//!
//! A local axum server renders the lifecycle diagram and the substage and
//! tool tables of the selected stage, and lets users curate tools. Open pages
//! are told about changes over a WebSocket.

mod error;
mod server;
mod watcher;
mod websocket;

pub use error::ApiError;
pub use server::{AppState, router, start_server};
pub use watcher::{LocalWrites, watch_database};
