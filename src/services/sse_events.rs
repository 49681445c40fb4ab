use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        archive::ArchivedMatch,
        scoreboard::MatchSnapshot,
        sse::{MatchArchivedEvent, MatchUpdatedEvent, ServerEvent, SystemStatus},
    },
    state::SharedState,
};

pub const EVENT_MATCH_UPDATED: &str = "match.updated";
pub const EVENT_MATCH_RESET: &str = "match.reset";
pub const EVENT_MATCH_ARCHIVED: &str = "match.archived";
pub const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the refreshed match after a mutation.
pub fn broadcast_match_updated(state: &SharedState, snapshot: &MatchSnapshot) {
    send_event(state, EVENT_MATCH_UPDATED, &MatchUpdatedEvent(snapshot.clone()));
}

/// Broadcast that a new match started, carrying the zeroed state.
pub fn broadcast_match_reset(state: &SharedState, snapshot: &MatchSnapshot) {
    send_event(state, EVENT_MATCH_RESET, &MatchUpdatedEvent(snapshot.clone()));
}

/// Broadcast that the match was appended to the archive.
pub fn broadcast_match_archived(state: &SharedState, archived: &ArchivedMatch) {
    send_event(state, EVENT_MATCH_ARCHIVED, &MatchArchivedEvent(archived.clone()));
}

/// Broadcast the degraded flag after it changed.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Serialize the current match as the `match.updated` event primed on new SSE streams.
pub fn match_updated_event(snapshot: &MatchSnapshot) -> Option<ServerEvent> {
    build_event(EVENT_MATCH_UPDATED, &MatchUpdatedEvent(snapshot.clone()))
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    if let Some(event) = build_event(event, payload) {
        state.sse().broadcast(event);
    }
}

fn build_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
