//! Best score tracking
//!
//! A single value, persisted under `highScore` as a decimal string.

use crate::error::{GameError, Result};
use crate::platform::KeyValueStore;

/// Storage key shared with earlier builds of the game
pub const STORAGE_KEY: &str = "highScore";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run. Returns true when the best was beaten.
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Read the stored best. A missing key is a fresh start.
    pub fn load(store: &impl KeyValueStore) -> Result<Self> {
        let Some(raw) = store.get(STORAGE_KEY)? else {
            return Ok(Self::new());
        };
        let best = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| GameError::CorruptValue {
                key: STORAGE_KEY.to_string(),
                value: raw.clone(),
            })?;
        Ok(Self { best })
    }

    /// Like `load`, but falls back to 0 and logs on any failure
    pub fn load_or_default(store: &impl KeyValueStore) -> Self {
        match Self::load(store) {
            Ok(hs) => {
                log::info!("Loaded high score {}", hs.best);
                hs
            }
            Err(e) => {
                log::warn!("High score unavailable, starting at 0: {e}");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        store.set(STORAGE_KEY, &self.best.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_record_only_beats() {
        let mut hs = HighScore::new();
        assert!(hs.record(500));
        assert!(!hs.record(500));
        assert!(!hs.record(100));
        assert!(hs.record(501));
        assert_eq!(hs.best, 501);
    }

    #[test]
    fn test_save_load() {
        let mut store = MemoryStore::new();
        assert_eq!(HighScore::load(&store).unwrap().best, 0);

        let hs = HighScore { best: 12_345 };
        hs.save(&mut store).unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("12345"));
        assert_eq!(HighScore::load(&store).unwrap(), hs);
    }

    #[test]
    fn test_corrupt_value() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "lots").unwrap();
        assert!(matches!(
            HighScore::load(&store),
            Err(GameError::CorruptValue { .. })
        ));
        assert_eq!(HighScore::load_or_default(&store).best, 0);
    }
}
