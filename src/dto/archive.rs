use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::ArchiveRecordEntity, dto::format_system_time};

/// A saved match as returned by the archive endpoints.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ArchivedMatch {
    pub id: Uuid,
    pub team1_name: String,
    pub team2_name: String,
    /// Stage label ("Group Stage" / "Final").
    pub stage: String,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    /// Counter values keyed by counter name.
    #[schema(value_type = Object)]
    pub counters: IndexMap<String, u32>,
}

impl From<ArchiveRecordEntity> for ArchivedMatch {
    fn from(value: ArchiveRecordEntity) -> Self {
        Self {
            id: value.id,
            team1_name: value.team1_name,
            team2_name: value.team2_name,
            stage: value.stage,
            saved_at: format_system_time(value.saved_at),
            counters: value.counters,
        }
    }
}
