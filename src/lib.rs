//! # Costbook
//!
//! A business budgeting server, usable both as a standalone binary and as a
//! library. Tracks planned spend (budgets) and actual spend (expenses) across
//! business lines and cost centers, with bulk import from CSV/XLSX files.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! costbook = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use costbook::server::{AppState, create_router};
//! use costbook::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/costbook.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the server binary's CLI. Disable with
//!   `default-features = false` when embedding.

pub mod config;
pub mod error;
pub mod import;
pub mod server;
pub mod store;
pub mod types;
