use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{TimestampMilliSeconds, serde_as};
use uuid::Uuid;

use super::error::CouchDaoError;
use crate::{dao::models::ArchiveRecordEntity, state::scoreboard::CounterKey};

pub const ARCHIVE_PREFIX: &str = "archive::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchArchiveDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub archive: ArchiveBody,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveBody {
    #[serde(rename = "Team_1")]
    pub team1_name: String,
    #[serde(rename = "Team_2")]
    pub team2_name: String,
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Date")]
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub saved_at: SystemTime,
    #[serde(flatten)]
    pub counters: IndexMap<String, u32>,
}

impl From<ArchiveRecordEntity> for CouchArchiveDocument {
    fn from(value: ArchiveRecordEntity) -> Self {
        Self {
            id: archive_doc_id(value.id),
            rev: None,
            archive: ArchiveBody {
                team1_name: value.team1_name,
                team2_name: value.team2_name,
                stage: value.stage,
                saved_at: value.saved_at,
                counters: value.counters,
            },
        }
    }
}

impl TryFrom<CouchArchiveDocument> for ArchiveRecordEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchArchiveDocument) -> Result<Self, Self::Error> {
        let id = extract_uuid(&doc.id)?;
        let mut stored = doc.archive.counters;

        // Every counter must be present; the row is rebuilt in canonical order.
        let mut counters = IndexMap::with_capacity(stored.len());
        for key in CounterKey::all() {
            let count = stored.shift_remove(key.name()).ok_or_else(|| {
                CouchDaoError::InvalidDocument {
                    doc_id: doc.id.clone(),
                    reason: format!("missing counter `{key}`"),
                }
            })?;
            counters.insert(key.name().to_string(), count);
        }

        Ok(Self {
            id,
            counters,
            team1_name: doc.archive.team1_name,
            team2_name: doc.archive.team2_name,
            stage: doc.archive.stage,
            saved_at: doc.archive.saved_at,
        })
    }
}

pub fn archive_doc_id(id: Uuid) -> String {
    format!("{}{}", ARCHIVE_PREFIX, id)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let invalid = |reason: &str| CouchDaoError::InvalidDocument {
        doc_id: doc_id.to_string(),
        reason: reason.to_string(),
    };
    let id = doc_id
        .strip_prefix(ARCHIVE_PREFIX)
        .ok_or_else(|| invalid("missing archive prefix"))?;

    Uuid::parse_str(id).map_err(|_| invalid("invalid UUID"))
}
