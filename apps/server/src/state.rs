//! Shared application state.

use std::sync::Arc;

use chrono::Utc;
use stockbook_core::report::{DateRange, ReportContext};
use stockbook_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;

/// State handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            jwt: JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs),
            config: Arc::new(config),
        }
    }

    /// Report settings for `range`, resolved against the current time.
    pub fn report_context(&self, range: DateRange) -> ReportContext {
        ReportContext {
            business_name: self.config.business_name.clone(),
            currency_symbol: self.config.currency_symbol.clone(),
            low_stock_threshold: self.config.low_stock_threshold,
            ..ReportContext::new(range, Utc::now())
        }
    }
}
