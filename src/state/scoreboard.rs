//! In-memory model of a single beach volleyball match: team scores, per-player tallies and the
//! momentum history used to draw the score chart.

use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tracked counters (16 player stats + 2 scores).
pub const COUNTER_COUNT: usize = 18;

/// Counter names in canonical order. The archive table uses the same names as columns.
const COUNTER_NAMES: [&str; COUNTER_COUNT] = [
    "T1_P1_digs",
    "T1_P2_digs",
    "T1_P1_atk",
    "T1_P2_atk",
    "T1_P1_ace",
    "T1_P2_ace",
    "T1_P1_miss",
    "T1_P2_miss",
    "T2_P1_digs",
    "T2_P2_digs",
    "T2_P1_atk",
    "T2_P2_atk",
    "T2_P1_ace",
    "T2_P2_ace",
    "T2_P1_miss",
    "T2_P2_miss",
    "Score_T1",
    "Score_T2",
];

const STATS_PER_TEAM: usize = StatKind::ALL.len() * PlayerSlot::ALL.len();
const FIRST_SCORE_INDEX: usize = STATS_PER_TEAM * TeamSide::ALL.len();

/// One of the two teams on court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamSide {
    /// Home team.
    Team1,
    /// Away team.
    Team2,
}

impl TeamSide {
    /// Both sides, home first.
    pub const ALL: [TeamSide; 2] = [TeamSide::Team1, TeamSide::Team2];

    /// Resolve the 1-based team number used by the UI surface.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(TeamSide::Team1),
            2 => Some(TeamSide::Team2),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            TeamSide::Team1 => 0,
            TeamSide::Team2 => 1,
        }
    }
}

/// Player position inside a beach volleyball pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    /// First player of the pair.
    Player1,
    /// Second player of the pair.
    Player2,
}

impl PlayerSlot {
    /// Both players, first player first.
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::Player1, PlayerSlot::Player2];

    fn index(self) -> usize {
        match self {
            PlayerSlot::Player1 => 0,
            PlayerSlot::Player2 => 1,
        }
    }
}

/// Individual statistic tracked for every player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Successful digs.
    Digs,
    /// Attacks.
    Attacks,
    /// Service aces.
    Aces,
    /// Missed serves.
    MissedServes,
}

impl StatKind {
    /// Every stat in canonical order.
    pub const ALL: [StatKind; 4] = [
        StatKind::Digs,
        StatKind::Attacks,
        StatKind::Aces,
        StatKind::MissedServes,
    ];

    fn index(self) -> usize {
        match self {
            StatKind::Digs => 0,
            StatKind::Attacks => 1,
            StatKind::Aces => 2,
            StatKind::MissedServes => 3,
        }
    }
}

/// Identifies one of the [`COUNTER_COUNT`] tallies of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKey {
    /// Points scored by a team.
    Score(TeamSide),
    /// A single stat of a single player.
    PlayerStat {
        /// Team the player belongs to.
        team: TeamSide,
        /// Player inside the team.
        player: PlayerSlot,
        /// Stat being counted.
        stat: StatKind,
    },
}

impl CounterKey {
    /// Iterate over every counter in canonical order.
    pub fn all() -> impl Iterator<Item = CounterKey> {
        (0..COUNTER_COUNT).map(Self::from_index)
    }

    /// Stable counter name (e.g. `T1_P2_atk`, `Score_T1`).
    pub fn name(self) -> &'static str {
        COUNTER_NAMES[self.index()]
    }

    /// Whether this counter is one of the two team scores.
    pub fn is_score(self) -> bool {
        matches!(self, CounterKey::Score(_))
    }

    fn index(self) -> usize {
        match self {
            CounterKey::PlayerStat { team, player, stat } => {
                team.index() * STATS_PER_TEAM + stat.index() * PlayerSlot::ALL.len() + player.index()
            }
            CounterKey::Score(team) => FIRST_SCORE_INDEX + team.index(),
        }
    }

    fn from_index(index: usize) -> Self {
        if index >= FIRST_SCORE_INDEX {
            return CounterKey::Score(TeamSide::ALL[index - FIRST_SCORE_INDEX]);
        }

        let within_team = index % STATS_PER_TEAM;
        CounterKey::PlayerStat {
            team: TeamSide::ALL[index / STATS_PER_TEAM],
            player: PlayerSlot::ALL[within_team % PlayerSlot::ALL.len()],
            stat: StatKind::ALL[within_team / PlayerSlot::ALL.len()],
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a counter name does not match any tracked counter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown counter `{0}`")]
pub struct UnknownCounter(pub String);

impl FromStr for CounterKey {
    type Err = UnknownCounter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COUNTER_NAMES
            .iter()
            .position(|name| *name == s)
            .map(Self::from_index)
            .ok_or_else(|| UnknownCounter(s.to_string()))
    }
}

/// Tournament stage the match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pool play.
    #[default]
    GroupStage,
    /// Championship final.
    Final,
}

impl Stage {
    /// Human readable label, also stored in the archive `Stage` column.
    pub fn label(self) -> &'static str {
        match self {
            Stage::GroupStage => "Group Stage",
            Stage::Final => "Final",
        }
    }

    /// Parse a label written by [`Stage::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Group Stage" => Some(Stage::GroupStage),
            "Final" => Some(Stage::Final),
            _ => None,
        }
    }
}

/// Score pair captured right after a team scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSnapshot {
    /// When the point was recorded.
    pub recorded_at: SystemTime,
    /// Team 1 score after the point.
    pub team1: u32,
    /// Team 2 score after the point.
    pub team2: u32,
}

/// Flattened summary of a match, ready to be appended to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedMatchRecord {
    counters: [u32; COUNTER_COUNT],
    /// Home team name at save time.
    pub team1_name: String,
    /// Away team name at save time.
    pub team2_name: String,
    /// Stage at save time.
    pub stage: Stage,
    /// When the record was built.
    pub saved_at: SystemTime,
}

impl ArchivedMatchRecord {
    /// Value of a counter when the record was built.
    pub fn value(&self, key: CounterKey) -> u32 {
        self.counters[key.index()]
    }

    /// Every counter with its value, in canonical order.
    pub fn counters(&self) -> impl Iterator<Item = (CounterKey, u32)> + '_ {
        CounterKey::all().map(|key| (key, self.value(key)))
    }
}

/// Live state of the match being scouted.
#[derive(Debug, Clone)]
pub struct MatchState {
    team1_name: String,
    team2_name: String,
    stage: Stage,
    counters: [u32; COUNTER_COUNT],
    history: Vec<ScoreSnapshot>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new("Team 1", "Team 2", Stage::GroupStage)
    }
}

impl MatchState {
    /// Fresh match with every counter at zero and an empty history.
    pub fn new(team1_name: impl Into<String>, team2_name: impl Into<String>, stage: Stage) -> Self {
        Self {
            team1_name: team1_name.into(),
            team2_name: team2_name.into(),
            stage,
            counters: [0; COUNTER_COUNT],
            history: Vec::new(),
        }
    }

    /// Add one to `key`. Scoring a point also appends a snapshot to the history.
    pub fn increment(&mut self, key: CounterKey) {
        let slot = &mut self.counters[key.index()];
        *slot = slot.saturating_add(1);

        if key.is_score() {
            self.history.push(ScoreSnapshot {
                recorded_at: SystemTime::now(),
                team1: self.score(TeamSide::Team1),
                team2: self.score(TeamSide::Team2),
            });
        }
    }

    /// Remove one from `key` unless it is already zero. Returns whether the value changed.
    ///
    /// The history is never touched, even when undoing a point.
    pub fn decrement(&mut self, key: CounterKey) -> bool {
        let slot = &mut self.counters[key.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Start a new match: zero every counter and clear the history, keeping names and stage.
    pub fn reset(&mut self) {
        self.counters = [0; COUNTER_COUNT];
        self.history.clear();
    }

    /// Build the archive record for the current state, timestamped now.
    pub fn archive(&self) -> ArchivedMatchRecord {
        ArchivedMatchRecord {
            counters: self.counters,
            team1_name: self.team1_name.clone(),
            team2_name: self.team2_name.clone(),
            stage: self.stage,
            saved_at: SystemTime::now(),
        }
    }

    /// Current value of a counter.
    pub fn value(&self, key: CounterKey) -> u32 {
        self.counters[key.index()]
    }

    /// Current score of a team.
    pub fn score(&self, team: TeamSide) -> u32 {
        self.value(CounterKey::Score(team))
    }

    /// Every counter with its value, in canonical order.
    pub fn counters(&self) -> impl Iterator<Item = (CounterKey, u32)> + '_ {
        CounterKey::all().map(|key| (key, self.value(key)))
    }

    /// Score snapshots in chronological order.
    pub fn history(&self) -> &[ScoreSnapshot] {
        &self.history
    }

    /// Display name of a team.
    pub fn team_name(&self, team: TeamSide) -> &str {
        match team {
            TeamSide::Team1 => &self.team1_name,
            TeamSide::Team2 => &self.team2_name,
        }
    }

    /// Stage of the match.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Rename one team.
    pub fn set_team_name(&mut self, team: TeamSide, name: String) {
        match team {
            TeamSide::Team1 => self.team1_name = name,
            TeamSide::Team2 => self.team2_name = name,
        }
    }

    /// Change the stage of the match.
    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1_P1_DIGS: CounterKey = CounterKey::PlayerStat {
        team: TeamSide::Team1,
        player: PlayerSlot::Player1,
        stat: StatKind::Digs,
    };

    #[test]
    fn counter_names_follow_canonical_order() {
        let names: Vec<_> = CounterKey::all().map(CounterKey::name).collect();
        assert_eq!(names, COUNTER_NAMES.to_vec());
        assert_eq!(
            CounterKey::PlayerStat {
                team: TeamSide::Team2,
                player: PlayerSlot::Player2,
                stat: StatKind::Attacks,
            }
            .name(),
            "T2_P2_atk"
        );
        assert_eq!(CounterKey::Score(TeamSide::Team2).name(), "Score_T2");
    }

    #[test]
    fn counter_keys_parse_from_their_names() {
        for key in CounterKey::all() {
            assert_eq!(key.name().parse::<CounterKey>(), Ok(key));
        }
        assert_eq!(
            "T3_P1_digs".parse::<CounterKey>(),
            Err(UnknownCounter("T3_P1_digs".into()))
        );
    }

    #[test]
    fn fresh_match_is_zeroed() {
        let state = MatchState::default();
        assert!(state.counters().all(|(_, value)| value == 0));
        assert!(state.history().is_empty());
        assert_eq!(state.team_name(TeamSide::Team1), "Team 1");
        assert_eq!(state.team_name(TeamSide::Team2), "Team 2");
        assert_eq!(state.stage(), Stage::GroupStage);
    }

    #[test]
    fn decrement_at_zero_is_a_noop() {
        let mut state = MatchState::default();
        for key in CounterKey::all() {
            assert!(!state.decrement(key));
            assert_eq!(state.value(key), 0);
        }
        assert!(state.history().is_empty());
    }

    #[test]
    fn increment_then_decrement_restores_value() {
        let mut state = MatchState::default();
        for key in CounterKey::all() {
            state.increment(key);
            state.increment(key);
        }
        for key in CounterKey::all() {
            state.increment(key);
            assert!(state.decrement(key));
            assert_eq!(state.value(key), 2, "counter {key}");
        }
    }

    #[test]
    fn only_score_increments_append_history() {
        let mut state = MatchState::default();
        for key in CounterKey::all() {
            let before = state.history().len();
            state.increment(key);
            let expected = if key.is_score() { before + 1 } else { before };
            assert_eq!(state.history().len(), expected, "counter {key}");
        }

        let last = state.history().last().unwrap();
        assert_eq!((last.team1, last.team2), (1, 1));
    }

    #[test]
    fn reset_clears_counters_and_history_but_keeps_setup() {
        let mut state = MatchState::new("Sand Sharks", "Dune Riders", Stage::Final);
        for key in CounterKey::all() {
            state.increment(key);
        }

        state.reset();

        assert!(state.counters().all(|(_, value)| value == 0));
        assert!(state.history().is_empty());
        assert_eq!(state.team_name(TeamSide::Team1), "Sand Sharks");
        assert_eq!(state.team_name(TeamSide::Team2), "Dune Riders");
        assert_eq!(state.stage(), Stage::Final);
    }

    #[test]
    fn archive_matches_current_counters() {
        let mut state = MatchState::new("Sand Sharks", "Dune Riders", Stage::Final);
        for (step, key) in CounterKey::all().enumerate() {
            for _ in 0..step {
                state.increment(key);
            }
        }

        let before = SystemTime::now();
        let record = state.archive();

        assert!(record.counters().eq(state.counters()));
        assert_eq!(record.team1_name, "Sand Sharks");
        assert_eq!(record.team2_name, "Dune Riders");
        assert_eq!(record.stage, Stage::Final);
        assert!(record.saved_at >= before);
    }

    #[test]
    fn two_points_and_a_dig() {
        let mut state = MatchState::default();
        state.increment(CounterKey::Score(TeamSide::Team1));
        state.increment(CounterKey::Score(TeamSide::Team1));
        state.increment(T1_P1_DIGS);

        assert_eq!(state.score(TeamSide::Team1), 2);
        assert_eq!(state.value(T1_P1_DIGS), 1);
        assert_eq!(state.history().len(), 2);
        assert_eq!((state.history()[1].team1, state.history()[1].team2), (2, 0));
        assert!(state.history()[0].recorded_at <= state.history()[1].recorded_at);
    }

    #[test]
    fn undoing_a_point_leaves_history_untouched() {
        let mut state = MatchState::default();
        state.increment(CounterKey::Score(TeamSide::Team1));
        let history_before = state.history().to_vec();

        assert!(!state.decrement(CounterKey::Score(TeamSide::Team2)));
        assert_eq!(state.score(TeamSide::Team2), 0);
        assert_eq!(state.history(), history_before.as_slice());

        assert!(state.decrement(CounterKey::Score(TeamSide::Team1)));
        assert_eq!(state.score(TeamSide::Team1), 0);
        assert_eq!(state.history(), history_before.as_slice());
    }

    #[test]
    fn stage_labels_round_trip() {
        assert_eq!(Stage::from_label(Stage::Final.label()), Some(Stage::Final));
        assert_eq!(Stage::GroupStage.label(), "Group Stage");
        assert_eq!(Stage::from_label("Semi Final"), None);
    }
}
