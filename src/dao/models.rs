use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::scoreboard::ArchivedMatchRecord;

/// Name of the append-only table (or collection) holding saved matches.
pub const ARCHIVE_TABLE: &str = "championship_archive";

/// One saved match as persisted by every archive backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveRecordEntity {
    /// Identifier assigned when the record is appended.
    pub id: Uuid,
    /// Counter values keyed by counter name, in canonical order.
    pub counters: IndexMap<String, u32>,
    /// Home team name.
    pub team1_name: String,
    /// Away team name.
    pub team2_name: String,
    /// Stage label ("Group Stage" or "Final").
    pub stage: String,
    /// When the match was saved.
    pub saved_at: SystemTime,
}

impl From<ArchivedMatchRecord> for ArchiveRecordEntity {
    fn from(value: ArchivedMatchRecord) -> Self {
        let counters = value
            .counters()
            .map(|(key, count)| (key.name().to_string(), count))
            .collect();
        Self {
            id: Uuid::new_v4(),
            counters,
            team1_name: value.team1_name,
            team2_name: value.team2_name,
            stage: value.stage.label().to_string(),
            saved_at: value.saved_at,
        }
    }
}
