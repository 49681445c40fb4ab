//! Live scoring operations. Every mutation runs to completion under the match write lock,
//! returns the refreshed match and notifies SSE observers.

use tracing::debug;

use crate::{
    dto::scoreboard::{HistoryPoint, MatchSnapshot, UpdateSetupRequest},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        scoreboard::{CounterKey, TeamSide},
    },
};

fn team_side(number: u8) -> Result<TeamSide, ServiceError> {
    TeamSide::from_number(number)
        .ok_or_else(|| ServiceError::NotFound(format!("team `{number}` does not exist")))
}

/// Return the current match.
pub async fn current_match(state: &SharedState) -> MatchSnapshot {
    state.read_match(|game| MatchSnapshot::from(game)).await
}

/// Return the momentum history in chronological order.
pub async fn history(state: &SharedState) -> Vec<HistoryPoint> {
    state
        .read_match(|game| game.history().iter().map(HistoryPoint::from).collect())
        .await
}

/// Apply a validated setup update (team names, stage). Counters are left untouched.
pub async fn update_setup(state: &SharedState, request: UpdateSetupRequest) -> MatchSnapshot {
    let snapshot = state
        .write_match(|game| {
            if let Some(name) = request.team1_name {
                game.set_team_name(TeamSide::Team1, name.trim().to_string());
            }
            if let Some(name) = request.team2_name {
                game.set_team_name(TeamSide::Team2, name.trim().to_string());
            }
            if let Some(stage) = request.stage {
                game.set_stage(stage.into());
            }
            let snapshot = MatchSnapshot::from(&*game);
            sse_events::broadcast_match_updated(state, &snapshot);
            snapshot
        })
        .await;

    debug!(
        team1 = %snapshot.team1.name,
        team2 = %snapshot.team2.name,
        stage = %snapshot.stage_label,
        "match setup updated"
    );
    snapshot
}

/// Increment the counter named `key`.
pub async fn increment_counter(state: &SharedState, key: &str) -> Result<MatchSnapshot, ServiceError> {
    let key: CounterKey = key.parse()?;
    Ok(increment(state, key).await)
}

/// Decrement the counter named `key`, clamped at zero.
pub async fn decrement_counter(state: &SharedState, key: &str) -> Result<MatchSnapshot, ServiceError> {
    let key: CounterKey = key.parse()?;
    Ok(decrement(state, key).await)
}

/// Award a point to team `number` (1 or 2).
pub async fn score_point(state: &SharedState, number: u8) -> Result<MatchSnapshot, ServiceError> {
    let team = team_side(number)?;
    Ok(increment(state, CounterKey::Score(team)).await)
}

/// Take back a point from team `number` (1 or 2). The momentum history is kept as is.
pub async fn undo_point(state: &SharedState, number: u8) -> Result<MatchSnapshot, ServiceError> {
    let team = team_side(number)?;
    Ok(decrement(state, CounterKey::Score(team)).await)
}

/// Start a new match: zero every counter and clear the history, keeping names and stage.
pub async fn reset_match(state: &SharedState) -> MatchSnapshot {
    let snapshot = state
        .write_match(|game| {
            game.reset();
            let snapshot = MatchSnapshot::from(&*game);
            sse_events::broadcast_match_reset(state, &snapshot);
            snapshot
        })
        .await;

    debug!("match reset");
    snapshot
}

// Events are sent while the write lock is held so observers see mutations in lock order.
async fn increment(state: &SharedState, key: CounterKey) -> MatchSnapshot {
    let (value, snapshot) = state
        .write_match(|game| {
            game.increment(key);
            let snapshot = MatchSnapshot::from(&*game);
            sse_events::broadcast_match_updated(state, &snapshot);
            (game.value(key), snapshot)
        })
        .await;

    debug!(counter = %key, value, "counter incremented");
    snapshot
}

async fn decrement(state: &SharedState, key: CounterKey) -> MatchSnapshot {
    let (changed, snapshot) = state
        .write_match(|game| {
            let changed = game.decrement(key);
            let snapshot = MatchSnapshot::from(&*game);
            if changed {
                sse_events::broadcast_match_updated(state, &snapshot);
            }
            (changed, snapshot)
        })
        .await;

    if changed {
        debug!(counter = %key, "counter decremented");
    } else {
        debug!(counter = %key, "counter already at zero");
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::{config::AppConfig, dto::scoreboard::StageDto, state::AppState};

    #[tokio::test]
    async fn counters_are_addressed_by_name() {
        let state = AppState::new(&AppConfig::default());

        increment_counter(&state, "Score_T1").await.unwrap();
        increment_counter(&state, "Score_T1").await.unwrap();
        let snapshot = increment_counter(&state, "T1_P1_digs").await.unwrap();

        assert_eq!(snapshot.team1.score, 2);
        assert_eq!(snapshot.counters["T1_P1_digs"], 1);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(
            (snapshot.history[1].score_team1, snapshot.history[1].score_team2),
            (2, 0)
        );
    }

    #[tokio::test]
    async fn unknown_counters_and_teams_are_not_found() {
        let state = AppState::new(&AppConfig::default());

        assert!(matches!(
            increment_counter(&state, "T1_P3_digs").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            decrement_counter(&state, "score_t1").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(score_point(&state, 3).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(undo_point(&state, 0).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn undo_at_zero_changes_nothing_and_stays_quiet() {
        let state = AppState::new(&AppConfig::default());
        let mut events = state.sse().subscribe();

        let snapshot = undo_point(&state, 2).await.unwrap();

        assert_eq!(snapshot.team2.score, 0);
        assert!(snapshot.history.is_empty());
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn undo_keeps_history() {
        let state = AppState::new(&AppConfig::default());
        score_point(&state, 2).await.unwrap();

        let snapshot = undo_point(&state, 2).await.unwrap();

        assert_eq!(snapshot.team2.score, 0);
        assert_eq!(history(&state).await.len(), 1);
    }

    #[tokio::test]
    async fn setup_then_reset_keeps_names_and_stage() {
        let state = AppState::new(&AppConfig::default());
        update_setup(
            &state,
            UpdateSetupRequest {
                team1_name: Some("  Sand Sharks ".into()),
                team2_name: None,
                stage: Some(StageDto::Final),
            },
        )
        .await;
        score_point(&state, 1).await.unwrap();
        increment_counter(&state, "T2_P2_ace").await.unwrap();

        let mut events = state.sse().subscribe();
        let snapshot = reset_match(&state).await;

        assert_eq!(snapshot.team1.name, "Sand Sharks");
        assert_eq!(snapshot.team2.name, "Team 2");
        assert_eq!(snapshot.stage, StageDto::Final);
        assert!(snapshot.counters.values().all(|value| *value == 0));
        assert!(snapshot.history.is_empty());

        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(sse_events::EVENT_MATCH_RESET));
    }

    #[tokio::test]
    async fn every_mutation_is_broadcast() {
        let state = AppState::new(&AppConfig::default());
        let mut events = state.sse().subscribe();

        increment_counter(&state, "T1_P2_atk").await.unwrap();
        decrement_counter(&state, "T1_P2_atk").await.unwrap();

        for _ in 0..2 {
            let event = events.try_recv().unwrap();
            assert_eq!(event.event.as_deref(), Some(sse_events::EVENT_MATCH_UPDATED));
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_points_reach_observers_in_order() {
        for _ in 0..50 {
            let state = AppState::new(&AppConfig::default());
            let mut events = state.sse().subscribe();

            let tasks: Vec<_> = (0..16)
                .map(|_| {
                    let state = state.clone();
                    tokio::spawn(async move { score_point(&state, 1).await })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            let mut scores = Vec::new();
            while let Ok(event) = events.try_recv() {
                let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                scores.push(payload["team1"]["score"].as_u64().unwrap());
            }
            assert_eq!(scores, (1..=16).collect::<Vec<u64>>());
        }
    }
}
