//! Best score per game
//!
//! One integer per game in a simple key-value store (LocalStorage in the
//! browser). Read once when a game mounts, written when a run beats it.

use std::collections::HashMap;

use crate::error::Result;

/// String key-value store
pub trait ScoreStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Successful writes so far
    pub writes: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Best score for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScores {
    game: String,
    best: Option<u64>,
}

impl HighScores {
    /// Storage key prefix
    const KEY_PREFIX: &'static str = "mini_arcade_highscore_";

    pub fn key_for(game: &str) -> String {
        format!("{}{}", Self::KEY_PREFIX, game)
    }

    /// Read the stored best; missing or unparseable values count as none
    pub fn load(store: &dyn ScoreStore, game: &str) -> Self {
        let best = store
            .read(&Self::key_for(game))
            .and_then(|raw| raw.trim().parse::<u64>().ok());
        match best {
            Some(best) => log::info!("Loaded high score {best} for {game}"),
            None => log::info!("No high score for {game}, starting fresh"),
        }
        Self {
            game: game.to_string(),
            best,
        }
    }

    pub fn best(&self) -> Option<u64> {
        self.best
    }

    /// Check if a score beats the record
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0 && self.best.is_none_or(|best| score > best)
    }

    /// Store `score` if it is a new best. Returns true when it was.
    ///
    /// A failed write is logged; the in-memory best is updated either way.
    pub fn record(&mut self, store: &mut dyn ScoreStore, score: u64) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.best = Some(score);
        match store.write(&Self::key_for(&self.game), &score.to_string()) {
            Ok(()) => log::info!("New high score for {}: {}", self.game, score),
            Err(e) => log::warn!("Could not save high score for {}: {}", self.game, e),
        }
        true
    }
}
