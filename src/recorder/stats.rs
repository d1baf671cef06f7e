use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::RecorderState;

/// Snapshot of the controller, queryable at any time.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStats {
    /// Current state of the state machine.
    pub state: RecorderState,

    /// Correlation id of the active recording, if one exists.
    pub recording_id: Option<Uuid>,

    /// When the active recording started.
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds the active recording has been running.
    pub duration_secs: f64,

    /// Fragments collected so far.
    pub chunks_collected: usize,
}
