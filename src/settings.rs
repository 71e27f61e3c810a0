//! Match settings
//!
//! Everything the menu collects before a match: mode, per-slot names,
//! which slots the computer plays (and how well), and life counts.
//! Loadable from JSON so headless runs can be configured from a file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::{Difficulty, PlayerId, Side};

/// Number of contestants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    #[serde(rename = "2P")]
    TwoPlayer,
    #[serde(rename = "3P")]
    ThreePlayer,
    #[serde(rename = "4P")]
    FourPlayer,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::TwoPlayer => "2P",
            Mode::ThreePlayer => "3P",
            Mode::FourPlayer => "4P",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "2p" | "2" => Some(Mode::TwoPlayer),
            "3p" | "3" => Some(Mode::ThreePlayer),
            "4p" | "4" => Some(Mode::FourPlayer),
            _ => None,
        }
    }

    pub fn player_count(&self) -> usize {
        match self {
            Mode::TwoPlayer => 2,
            Mode::ThreePlayer => 3,
            Mode::FourPlayer => 4,
        }
    }

    /// Slots in play; sides fill left, right, bottom, top as the count grows
    pub fn players(&self) -> &'static [PlayerId] {
        &PlayerId::ALL[..self.player_count()]
    }

    pub fn sides(&self) -> impl Iterator<Item = Side> {
        self.players().iter().map(|id| id.side())
    }
}

fn default_lives() -> u32 {
    1
}

/// Construction input for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    pub mode: Mode,
    /// Display names; a missing slot falls back to "Player N"
    #[serde(default)]
    pub names: BTreeMap<PlayerId, String>,
    /// Computer-controlled slots; a slot absent here is human
    #[serde(default)]
    pub difficulties: BTreeMap<PlayerId, Difficulty>,
    /// Per-slot lives overriding `initial_lives`
    #[serde(default)]
    pub lives: BTreeMap<PlayerId, u32>,
    #[serde(default = "default_lives")]
    pub initial_lives: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl MatchSettings {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            names: BTreeMap::new(),
            difficulties: BTreeMap::new(),
            lives: BTreeMap::new(),
            initial_lives: default_lives(),
        }
    }

    pub fn with_name(mut self, id: PlayerId, name: impl Into<String>) -> Self {
        self.names.insert(id, name.into());
        self
    }

    pub fn with_ai(mut self, id: PlayerId, difficulty: Difficulty) -> Self {
        self.difficulties.insert(id, difficulty);
        self
    }

    pub fn with_lives(mut self, id: PlayerId, lives: u32) -> Self {
        self.lives.insert(id, lives);
        self
    }

    pub fn with_initial_lives(mut self, lives: u32) -> Self {
        self.initial_lives = lives;
        self
    }

    pub fn name_for(&self, id: PlayerId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.default_name())
    }

    pub fn difficulty_for(&self, id: PlayerId) -> Option<Difficulty> {
        self.difficulties.get(&id).copied()
    }

    pub fn lives_for(&self, id: PlayerId) -> u32 {
        self.lives.get(&id).copied().unwrap_or(self.initial_lives)
    }

    /// Drop entries for slots outside the mode and raise zero lives to one
    pub fn sanitized(mut self) -> Self {
        let in_play = self.mode.players();
        let before = self.names.len() + self.difficulties.len() + self.lives.len();
        self.names.retain(|id, _| in_play.contains(id));
        self.difficulties.retain(|id, _| in_play.contains(id));
        self.lives.retain(|id, _| in_play.contains(id));
        let after = self.names.len() + self.difficulties.len() + self.lives.len();
        if after != before {
            log::warn!(
                "Ignoring {} setting(s) for slots outside {}",
                before - after,
                self.mode.as_str()
            );
        }

        if self.initial_lives == 0 {
            log::warn!("initial_lives of 0 raised to 1");
            self.initial_lives = 1;
        }
        for (id, lives) in self.lives.iter_mut() {
            if *lives == 0 {
                log::warn!("{} lives of 0 raised to 1", id.as_str());
                *lives = 1;
            }
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded {} settings from {}",
            settings.mode.as_str(),
            path.as_ref().display()
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_sides_fill_in_fixed_order() {
        let sides: Vec<_> = Mode::FourPlayer.sides().collect();
        assert_eq!(sides, vec![Side::Left, Side::Right, Side::Bottom, Side::Top]);
        let sides: Vec<_> = Mode::ThreePlayer.sides().collect();
        assert_eq!(sides, vec![Side::Left, Side::Right, Side::Bottom]);
        assert_eq!(Mode::TwoPlayer.players(), &[PlayerId::P1, PlayerId::P2]);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from_str("3P"), Some(Mode::ThreePlayer));
        assert_eq!(Mode::from_str("4"), Some(Mode::FourPlayer));
        assert_eq!(Mode::from_str("5p"), None);
    }

    #[test]
    fn test_fallbacks() {
        let settings = MatchSettings::new(Mode::TwoPlayer)
            .with_name(PlayerId::P1, "Ada")
            .with_lives(PlayerId::P2, 3);
        assert_eq!(settings.name_for(PlayerId::P1), "Ada");
        assert_eq!(settings.name_for(PlayerId::P2), "Player 2");
        assert_eq!(settings.lives_for(PlayerId::P1), 1);
        assert_eq!(settings.lives_for(PlayerId::P2), 3);
        assert_eq!(settings.difficulty_for(PlayerId::P1), None);
    }

    #[test]
    fn test_sanitized() {
        let settings = MatchSettings::new(Mode::TwoPlayer)
            .with_ai(PlayerId::P4, Difficulty::Hard)
            .with_lives(PlayerId::P1, 0)
            .with_initial_lives(0)
            .sanitized();
        assert!(settings.difficulties.is_empty());
        assert_eq!(settings.lives_for(PlayerId::P1), 1);
        assert_eq!(settings.initial_lives, 1);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "mode": "4P",
            "names": { "p1": "Ada", "p3": "Bot" },
            "difficulties": { "p3": "hard", "p4": "superEasy" },
            "initial_lives": 2
        }"#;
        let settings = MatchSettings::from_json(json).expect("valid settings");
        assert_eq!(settings.mode, Mode::FourPlayer);
        assert_eq!(settings.name_for(PlayerId::P3), "Bot");
        assert_eq!(settings.difficulty_for(PlayerId::P4), Some(Difficulty::SuperEasy));
        assert_eq!(settings.lives_for(PlayerId::P2), 2);

        let back = MatchSettings::from_json(&settings.to_json().expect("serializes"))
            .expect("reparses");
        assert_eq!(back, settings);
    }

    #[test]
    fn test_from_json_rejects_unknown_mode() {
        assert!(MatchSettings::from_json(r#"{ "mode": "5P" }"#).is_err());
    }
}
