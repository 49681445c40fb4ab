//! Saving matches to the archive store and reading them back.

use tracing::{info, warn};

use crate::{
    dao::models::ArchiveRecordEntity,
    dto::archive::ArchivedMatch,
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Build the archive record for the live match and append it to the store.
///
/// Every call appends a new row. A failed write leaves the live match untouched so the
/// operator can retry.
pub async fn archive_match(state: &SharedState) -> Result<ArchivedMatch, ServiceError> {
    let store = state.require_archive_store().await?;
    let record: ArchiveRecordEntity = state.read_match(|game| game.archive()).await.into();
    let id = record.id;

    if let Err(err) = store.append_record(record.clone()).await {
        warn!(%id, error = %err, "failed to archive match");
        return Err(err.into());
    }

    info!(
        %id,
        team1 = %record.team1_name,
        team2 = %record.team2_name,
        stage = %record.stage,
        "match archived"
    );
    let archived = ArchivedMatch::from(record);
    sse_events::broadcast_match_archived(state, &archived);
    Ok(archived)
}

/// Return every archived match, oldest first.
pub async fn list_archive(state: &SharedState) -> Result<Vec<ArchivedMatch>, ServiceError> {
    let store = state.require_archive_store().await?;
    let records = store.list_records().await?;
    Ok(records.into_iter().map(ArchivedMatch::from).collect())
}
