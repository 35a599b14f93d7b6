//! JSON persistence of the timer collection and the white noise registry.

use tracing::warn;

use super::KvStore;
use crate::audio::{default_tracks, WhiteNoise};
use crate::error::Result;
use crate::timer::Timer;

pub const TIMERS_KEY: &str = "tickwell-timers";
pub const WHITE_NOISES_KEY: &str = "tickwell-white-noises";

pub struct StateRepository<K: KvStore> {
    kv: K,
}

impl<K: KvStore> StateRepository<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    #[cfg(test)]
    pub(crate) fn kv(&self) -> &K {
        &self.kv
    }

    /// Stored timers, or an empty list if none are stored or the entry is
    /// unreadable.
    pub fn load_timers(&self) -> Result<Vec<Timer>> {
        let Some(json) = self.kv.get(TIMERS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&json) {
            Ok(timers) => Ok(timers),
            Err(e) => {
                warn!(error = %e, "stored timers are corrupt, starting empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_timers(&mut self, timers: &[Timer]) -> Result<()> {
        let json = serde_json::to_string(timers)?;
        self.kv.set(TIMERS_KEY, &json)?;
        Ok(())
    }

    /// Stored tracks, falling back to the built-in list.
    pub fn load_white_noises(&self) -> Result<Vec<WhiteNoise>> {
        let Some(json) = self.kv.get(WHITE_NOISES_KEY)? else {
            return Ok(default_tracks());
        };
        match serde_json::from_str(&json) {
            Ok(tracks) => Ok(tracks),
            Err(e) => {
                warn!(error = %e, "stored white noises are corrupt, using defaults");
                Ok(default_tracks())
            }
        }
    }

    pub fn save_white_noises(&mut self, tracks: &[WhiteNoise]) -> Result<()> {
        let json = serde_json::to_string(tracks)?;
        self.kv.set(WHITE_NOISES_KEY, &json)?;
        Ok(())
    }

    /// Remove both entries.
    pub fn clear(&mut self) -> Result<()> {
        self.kv.remove(TIMERS_KEY)?;
        self.kv.remove(WHITE_NOISES_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::NewTimer;

    #[test]
    fn empty_store_gives_defaults() {
        let repo = StateRepository::new(MemoryStore::new());
        assert!(repo.load_timers().unwrap().is_empty());
        assert_eq!(repo.load_white_noises().unwrap(), default_tracks());
    }

    #[test]
    fn timers_survive_save_and_load() {
        let mut repo = StateRepository::new(MemoryStore::new());
        let timer = Timer::new(NewTimer::countdown("Tea", 300), 1_000).unwrap();
        repo.save_timers(std::slice::from_ref(&timer)).unwrap();
        assert_eq!(repo.load_timers().unwrap(), vec![timer]);
    }

    #[test]
    fn corrupt_entries_fall_back() {
        let mut kv = MemoryStore::new();
        kv.set(TIMERS_KEY, "{not json").unwrap();
        kv.set(WHITE_NOISES_KEY, "42").unwrap();
        let repo = StateRepository::new(kv);
        assert!(repo.load_timers().unwrap().is_empty());
        assert_eq!(repo.load_white_noises().unwrap().len(), 3);
    }

    #[test]
    fn clear_removes_both_keys() {
        let mut repo = StateRepository::new(MemoryStore::new());
        repo.save_timers(&[]).unwrap();
        repo.save_white_noises(&default_tracks()).unwrap();
        repo.clear().unwrap();
        assert!(repo.kv().get(TIMERS_KEY).unwrap().is_none());
        assert!(repo.kv().get(WHITE_NOISES_KEY).unwrap().is_none());
    }
}
