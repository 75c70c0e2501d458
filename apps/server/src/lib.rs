//! # Stockbook Server
//!
//! HTTP API behind the Stockbook browser UI.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stockbook Server                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Public        │  │  Protected     │  │  Reports                   ││
//! │  │                │  │  (Bearer JWT)  │  │                            ││
//! │  │ • /health      │  │ • items        │  │ • balance sheet            ││
//! │  │ • sign-up      │  │ • sales        │  │ • dashboard                ││
//! │  │ • sign-in      │  │ • purchases    │  │ • reports (json/text/csv)  ││
//! │  │                │  │ • expenses     │  │ • CSV exports              ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  stockbook-db (SQLite)   stockbook-core (rules)   jsonwebtoken    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `STOCKBOOK_HTTP_PORT` - listen port (default: 8080)
//! - `STOCKBOOK_DB_PATH` - SQLite file (default: ./stockbook.db)
//! - `STOCKBOOK_JWT_SECRET` - secret for session tokens
//! - `STOCKBOOK_JWT_LIFETIME_SECS` - session lifetime (default: 86400)
//! - `STOCKBOOK_LOW_STOCK_THRESHOLD` - low stock cut-off (default: 5)
//! - `STOCKBOOK_BUSINESS_NAME` - report header
//! - `STOCKBOOK_CURRENCY_SYMBOL` - amount prefix in reports (default: $)
//! - `STOCKBOOK_CORS_ORIGIN` - allowed browser origin (default: any)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;

// Re-exports
pub use api::router;
pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;
