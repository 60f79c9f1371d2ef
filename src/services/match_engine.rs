//! The per-room match object (§3 "Match", §4.6 goal/state handlers):
//! dialect-A is a flat running score, dialect-B tracks per-half sub-scores
//! and drives an explicit `MatchState` machine.

use chrono::{DateTime, Utc};

use crate::utils::types::ProfileId;

/// dialect-B's clock/state machine (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    BeforeExtraTime,
    EtFirstHalf,
    EtBreak,
    EtSecondHalf,
    BeforePenalties,
    Penalties,
    Finished,
}

impl MatchState {
    /// Only these states accept goal events (§4.6 "Goal scored").
    pub fn accepts_goals(self) -> bool {
        matches!(
            self,
            MatchState::FirstHalf
                | MatchState::SecondHalf
                | MatchState::EtFirstHalf
                | MatchState::EtSecondHalf
                | MatchState::Penalties
        )
    }
}

/// Per-half goal sub-counters, one instance per side (§3).
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfScores {
    pub first_half: u32,
    pub second_half: u32,
    pub et_first_half: u32,
    pub et_second_half: u32,
    pub penalties: u32,
}

impl HalfScores {
    pub fn total(&self) -> u32 {
        self.first_half + self.second_half + self.et_first_half + self.et_second_half + self.penalties
    }

    fn add_goal(&mut self, state: MatchState) {
        match state {
            MatchState::FirstHalf => self.first_half += 1,
            MatchState::SecondHalf => self.second_half += 1,
            MatchState::EtFirstHalf => self.et_first_half += 1,
            MatchState::EtSecondHalf => self.et_second_half += 1,
            MatchState::Penalties => self.penalties += 1,
            _ => {}
        }
    }
}

/// Team selection captured before kickoff (dialect-B).
#[derive(Debug, Clone, Default)]
pub struct TeamSelection {
    pub home_captain: Option<ProfileId>,
    pub away_captain: Option<ProfileId>,
    pub home_extra: Vec<ProfileId>,
    pub away_extra: Vec<ProfileId>,
    pub home_team_id: Option<u32>,
    pub away_team_id: Option<u32>,
}

/// dialect-A: a flat running score plus per-side exit bookkeeping.
#[derive(Debug, Clone)]
pub struct MatchA {
    pub home_profile: ProfileId,
    pub away_profile: ProfileId,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub score_home: u32,
    pub score_away: u32,
    pub start: DateTime<Utc>,
    /// Per-side exit-type flag recorded by MatchExit (0x4370), consumed by
    /// the series-exit handler (0x3087).
    pub home_exit: Option<u8>,
    pub away_exit: Option<u8>,
}

impl MatchA {
    pub fn new(home_profile: ProfileId, away_profile: ProfileId, home_team_id: u32, away_team_id: u32) -> Self {
        Self {
            home_profile,
            away_profile,
            home_team_id,
            away_team_id,
            score_home: 0,
            score_away: 0,
            start: Utc::now(),
            home_exit: None,
            away_exit: None,
        }
    }

    pub fn goal(&mut self, home_side: bool) {
        if home_side {
            self.score_home += 1;
        } else {
            self.score_away += 1;
        }
    }
}

/// dialect-B: team-selection plus per-half scoring and an explicit
/// `MatchState` machine (§3 "Match" dialect-B variant).
#[derive(Debug, Clone)]
pub struct MatchB {
    pub selection: TeamSelection,
    pub home_scores: HalfScores,
    pub away_scores: HalfScores,
    pub clock_minute: u32,
    pub state: MatchState,
    pub start: DateTime<Utc>,
}

impl MatchB {
    pub fn new(selection: TeamSelection) -> Self {
        Self {
            selection,
            home_scores: HalfScores::default(),
            away_scores: HalfScores::default(),
            clock_minute: 0,
            state: MatchState::NotStarted,
            start: Utc::now(),
        }
    }

    /// Routes a goal to the correct half counter based on current state;
    /// no-ops if the current state does not accept goals (§4.6).
    pub fn goal(&mut self, home_side: bool) {
        if !self.state.accepts_goals() {
            return;
        }
        if home_side {
            self.home_scores.add_goal(self.state);
        } else {
            self.away_scores.add_goal(self.state);
        }
    }
}

#[derive(Debug, Clone)]
pub enum Match {
    A(MatchA),
    B(MatchB),
}

impl Match {
    pub fn start_datetime(&self) -> DateTime<Utc> {
        match self {
            Match::A(m) => m.start,
            Match::B(m) => m.start,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dialect_b_goal_routes_to_current_half() {
        let mut m = MatchB::new(TeamSelection::default());
        m.state = MatchState::FirstHalf;
        m.goal(true);
        m.state = MatchState::SecondHalf;
        m.goal(true);
        assert_eq!(m.home_scores.first_half, 1);
        assert_eq!(m.home_scores.second_half, 1);
        assert_eq!(m.home_scores.total(), 2);
    }

    #[test]
    fn dialect_b_goal_ignored_outside_playing_states() {
        let mut m = MatchB::new(TeamSelection::default());
        m.state = MatchState::HalfTime;
        m.goal(true);
        assert_eq!(m.home_scores.total(), 0);
    }

    #[test]
    fn dialect_a_goal_increments_flat_counter() {
        let mut m = MatchA::new(1, 2, 10, 20);
        m.goal(true);
        m.goal(false);
        m.goal(true);
        assert_eq!(m.score_home, 2);
        assert_eq!(m.score_away, 1);
    }
}
