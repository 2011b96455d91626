//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::JwtAdapter;
use crate::config::Config;
use solicare_core::ports::CareStore;
use solicare_core::services::Services;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Read by the access checks that need a care link lookup.
    pub care: Arc<dyn CareStore>,
    pub jwt: Arc<JwtAdapter>,
    pub config: Arc<Config>,
}
