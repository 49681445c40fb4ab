use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{format_system_time, validation::validate_team_name},
    state::{
        MatchState,
        scoreboard::{ScoreSnapshot, Stage, TeamSide},
    },
};

/// Tournament stage exposed to clients (REST/SSE).
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageDto {
    /// Pool play.
    GroupStage,
    /// Championship final.
    Final,
}

impl From<Stage> for StageDto {
    fn from(value: Stage) -> Self {
        match value {
            Stage::GroupStage => StageDto::GroupStage,
            Stage::Final => StageDto::Final,
        }
    }
}

impl From<StageDto> for Stage {
    fn from(value: StageDto) -> Self {
        match value {
            StageDto::GroupStage => Stage::GroupStage,
            StageDto::Final => Stage::Final,
        }
    }
}

/// Name and score of one team.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct TeamSummary {
    /// 1 for the home team, 2 for the away team.
    pub number: u8,
    pub name: String,
    pub score: u32,
}

/// One point of the momentum chart.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct HistoryPoint {
    /// RFC 3339 timestamp of the point.
    pub timestamp: String,
    pub score_team1: u32,
    pub score_team2: u32,
}

impl From<&ScoreSnapshot> for HistoryPoint {
    fn from(value: &ScoreSnapshot) -> Self {
        Self {
            timestamp: format_system_time(value.recorded_at),
            score_team1: value.team1,
            score_team2: value.team2,
        }
    }
}

/// Full view of the live match, returned after every mutation and pushed over SSE.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct MatchSnapshot {
    pub team1: TeamSummary,
    pub team2: TeamSummary,
    pub stage: StageDto,
    /// Human readable stage ("Group Stage" / "Final").
    pub stage_label: String,
    /// Every counter keyed by name, in canonical order.
    #[schema(value_type = Object)]
    pub counters: IndexMap<String, u32>,
    /// Score snapshots in chronological order.
    pub history: Vec<HistoryPoint>,
}

impl From<&MatchState> for MatchSnapshot {
    fn from(state: &MatchState) -> Self {
        let team = |side: TeamSide, number: u8| TeamSummary {
            number,
            name: state.team_name(side).to_string(),
            score: state.score(side),
        };

        Self {
            team1: team(TeamSide::Team1, 1),
            team2: team(TeamSide::Team2, 2),
            stage: state.stage().into(),
            stage_label: state.stage().label().to_string(),
            counters: state
                .counters()
                .map(|(key, value)| (key.name().to_string(), value))
                .collect(),
            history: state.history().iter().map(HistoryPoint::from).collect(),
        }
    }
}

/// Partial update of the match setup. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct UpdateSetupRequest {
    #[serde(default)]
    pub team1_name: Option<String>,
    #[serde(default)]
    pub team2_name: Option<String>,
    #[serde(default)]
    pub stage: Option<StageDto>,
}

impl Validate for UpdateSetupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.team1_name
            && let Err(e) = validate_team_name(name)
        {
            errors.add("team1_name", e);
        }
        if let Some(ref name) = self.team2_name
            && let Err(e) = validate_team_name(name)
        {
            errors.add("team2_name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::scoreboard::CounterKey;

    #[test]
    fn snapshot_mirrors_match_state() {
        let mut state = MatchState::new("Sand Sharks", "Dune Riders", Stage::Final);
        state.increment(CounterKey::Score(TeamSide::Team2));
        state.increment(CounterKey::Score(TeamSide::Team1));

        let snapshot = MatchSnapshot::from(&state);

        assert_eq!(snapshot.team1.name, "Sand Sharks");
        assert_eq!(snapshot.team1.score, 1);
        assert_eq!(snapshot.team2.number, 2);
        assert_eq!(snapshot.stage, StageDto::Final);
        assert_eq!(snapshot.stage_label, "Final");
        assert_eq!(snapshot.counters.len(), 18);
        assert_eq!(snapshot.counters.get_index(0).unwrap().0, "T1_P1_digs");
        assert_eq!(snapshot.counters["Score_T2"], 1);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(
            (snapshot.history[0].score_team1, snapshot.history[0].score_team2),
            (0, 1)
        );
    }

    #[test]
    fn setup_request_validates_provided_names_only() {
        let request: UpdateSetupRequest =
            serde_json::from_str(r#"{ "stage": "final" }"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.stage, Some(StageDto::Final));

        let request = UpdateSetupRequest {
            team1_name: Some("  ".into()),
            team2_name: Some("Dune Riders".into()),
            stage: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("team1_name"));
        assert!(!errors.field_errors().contains_key("team2_name"));
    }
}
