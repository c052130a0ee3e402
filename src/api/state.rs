use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::context::ModelContext;

/// Shared application state for API handlers.
///
/// The model context is read-only after startup, so handlers share it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ModelContext>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(context: ModelContext) -> Self {
        Self {
            context: Arc::new(context),
            start_time: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds().max(0) as u64
    }
}
