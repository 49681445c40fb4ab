//! Mapping between archive records and MongoDB documents. Counters are stored as top-level
//! fields next to `Team_1`, `Team_2`, `Stage` and `Date`.

use indexmap::IndexMap;
use mongodb::bson::{Bson, DateTime, Document, doc};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{dao::models::ArchiveRecordEntity, state::scoreboard::CounterKey};

pub const ID_FIELD: &str = "_id";
pub const DATE_FIELD: &str = "Date";

/// Build the document inserted for `record`.
pub fn to_document(record: &ArchiveRecordEntity) -> Document {
    let mut document = doc! { ID_FIELD: record.id.to_string() };
    for key in CounterKey::all() {
        let count = record.counters.get(key.name()).copied().unwrap_or(0);
        document.insert(key.name(), i64::from(count));
    }
    document.insert("Team_1", record.team1_name.clone());
    document.insert("Team_2", record.team2_name.clone());
    document.insert("Stage", record.stage.clone());
    document.insert(DATE_FIELD, DateTime::from_system_time(record.saved_at));
    document
}

/// Decode a stored document back into an archive record.
pub fn from_document(document: &Document) -> MongoResult<ArchiveRecordEntity> {
    let invalid = |field: &str| MongoDaoError::InvalidDocument {
        field: field.to_string(),
    };
    let text = |field: &str| {
        document
            .get_str(field)
            .map(str::to_string)
            .map_err(|_| invalid(field))
    };

    let id = Uuid::parse_str(document.get_str(ID_FIELD).map_err(|_| invalid(ID_FIELD))?)
        .map_err(|_| invalid(ID_FIELD))?;

    let mut counters = IndexMap::new();
    for key in CounterKey::all() {
        let count = match document.get(key.name()) {
            Some(Bson::Int32(value)) => u32::try_from(*value).ok(),
            Some(Bson::Int64(value)) => u32::try_from(*value).ok(),
            _ => None,
        }
        .ok_or_else(|| invalid(key.name()))?;
        counters.insert(key.name().to_string(), count);
    }

    let saved_at = document
        .get_datetime(DATE_FIELD)
        .map_err(|_| invalid(DATE_FIELD))?
        .to_system_time();

    Ok(ArchiveRecordEntity {
        id,
        counters,
        team1_name: text("Team_1")?,
        team2_name: text("Team_2")?,
        stage: text("Stage")?,
        saved_at,
    })
}
