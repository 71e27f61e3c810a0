//! Game result record
//!
//! Assembled once when a match ends and handed to whatever presents or
//! exports it. Every collection is present even when empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::MatchSettings;
use crate::sim::{
    ActionEntry, Difficulty, Elimination, HitDetail, MatchState, Metrics, MissDetail, PlayerId,
    RallyRecord, Side, TelemetrySample,
};

/// Display name used when the last paddles go out on the same frame
pub const NO_ONE: &str = "No One";

/// Who won the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
    Player { id: PlayerId, name: String },
    /// Everyone left was eliminated in the same frame
    NoOne,
}

impl Winner {
    pub fn name(&self) -> &str {
        match self {
            Winner::Player { name, .. } => name,
            Winner::NoOne => NO_ONE,
        }
    }

    pub fn id(&self) -> Option<PlayerId> {
        match self {
            Winner::Player { id, .. } => Some(*id),
            Winner::NoOne => None,
        }
    }
}

/// A single place in the final standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-indexed
    pub place: usize,
    pub id: PlayerId,
    pub name: String,
}

/// Final standings: the winner first, then the eliminated paddles, last out first
pub fn build_ranking(winner: &Winner, eliminations: &[Elimination]) -> Vec<RankingEntry> {
    let mut ranking = Vec::with_capacity(eliminations.len() + 1);
    if let Winner::Player { id, name } = winner {
        ranking.push(RankingEntry {
            place: 1,
            id: *id,
            name: name.clone(),
        });
    }
    for e in eliminations.iter().rev() {
        ranking.push(RankingEntry {
            place: ranking.len() + 1,
            id: e.id,
            name: e.name.clone(),
        });
    }
    ranking
}

/// End-of-match snapshot of one paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub side: Side,
    pub lives: u32,
    pub hits: u32,
    pub total_distance: f32,
    pub is_ai: bool,
    pub difficulty: Option<Difficulty>,
}

/// Terminal record of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: String,
    pub date: DateTime<Utc>,
    pub duration_secs: f64,
    pub winner: Winner,
    pub ranking: Vec<RankingEntry>,
    pub eliminations: Vec<Elimination>,
    pub final_ball_speed: f32,
    pub players: Vec<PlayerSummary>,
    pub action_log: Vec<ActionEntry>,
    pub telemetry: Vec<TelemetrySample>,
    pub hit_details: Vec<HitDetail>,
    pub miss_details: Vec<MissDetail>,
    pub rallies: Vec<RallyRecord>,
    pub metrics: Metrics,
    pub settings: MatchSettings,
}

impl GameResult {
    /// Snapshot a concluded match
    pub(crate) fn assemble(state: &MatchState) -> Self {
        let winner = state.winner().cloned().unwrap_or(Winner::NoOne);
        let recorder = state.recorder();
        let end_ms = state.clock_ms();

        let players = state
            .paddles()
            .iter()
            .map(|p| PlayerSummary {
                id: p.id,
                name: p.name.clone(),
                side: p.side,
                lives: p.lives,
                hits: p.hits,
                total_distance: p.total_distance,
                is_ai: p.is_ai(),
                difficulty: p.difficulty,
            })
            .collect();

        Self {
            game_id: state.game_id().to_string(),
            date: state.started_at(),
            duration_secs: end_ms / 1000.0,
            ranking: build_ranking(&winner, state.eliminations()),
            winner,
            eliminations: state.eliminations().to_vec(),
            final_ball_speed: state.ball().speed,
            players,
            action_log: recorder.actions.clone(),
            telemetry: recorder.samples.clone(),
            hit_details: recorder.hits.clone(),
            miss_details: recorder.misses.clone(),
            rallies: recorder.rallies.clone(),
            metrics: recorder.metrics(state.paddles(), state.eliminations(), end_ms),
            settings: state.settings().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerSummary> {
        self.players.iter().find(|p| p.id == id)
    }
}
