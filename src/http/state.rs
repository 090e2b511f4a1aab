use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::device::RootDevice;

/// Shared application state injected into route handlers via
/// `axum::extract::State`. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub device: Arc<RootDevice>,
    /// Canonicalized media root, exposed as object id "0".
    pub root: Arc<PathBuf>,
    /// Process start time; doubles as the SCPD Last-Modified stamp.
    pub started: DateTime<Utc>,
}
