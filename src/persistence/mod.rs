//! Best-score persistence
//!
//! The only thing a run persists is the best score. Hosts pick the backing
//! store: LocalStorage in the browser, a small JSON file on native, memory in
//! tests. A store that can't be read reports 0 and the game carries on.

use serde::{Deserialize, Serialize};

pub trait BestScoreStore {
    /// Best score on record, 0 if none
    fn read_best_score(&mut self) -> u64;
    fn write_best_score(&mut self, score: u64);
}

/// Keeps the score for the life of the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub best: u64,
    pub writes: u32,
}

impl BestScoreStore for MemoryStore {
    fn read_best_score(&mut self) -> u64 {
        self.best
    }

    fn write_best_score(&mut self, score: u64) {
        self.best = score;
        self.writes += 1;
    }
}

/// On-disk record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct BestScoreRecord {
    best_score: u64,
}

/// JSON file next to the binary (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BestScoreStore for FileStore {
    fn read_best_score(&mut self) -> u64 {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return 0;
            }
        };
        match serde_json::from_str::<BestScoreRecord>(&json) {
            Ok(record) => record.best_score,
            Err(e) => {
                log::warn!("Ignoring corrupt best score file {}: {}", self.path.display(), e);
                0
            }
        }
    }

    fn write_best_score(&mut self, score: u64) {
        let record = BestScoreRecord { best_score: score };
        let result = serde_json::to_string(&record)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&self.path, json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => log::info!("Best score {} saved to {}", score, self.path.display()),
            Err(e) => log::warn!("Failed to save best score: {}", e),
        }
    }
}

/// Browser LocalStorage, one key per title
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStorageStore {
    fn read_best_score(&mut self) -> u64 {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, best score starts at 0");
            return 0;
        };
        match storage.get_item(&self.key) {
            Ok(Some(json)) => serde_json::from_str::<BestScoreRecord>(&json)
                .map(|r| r.best_score)
                .unwrap_or_else(|e| {
                    log::warn!("Ignoring corrupt best score: {}", e);
                    0
                }),
            _ => 0,
        }
    }

    fn write_best_score(&mut self, score: u64) {
        let Some(storage) = Self::storage() else {
            return;
        };
        if let Ok(json) = serde_json::to_string(&BestScoreRecord { best_score: score }) {
            if storage.set_item(&self.key, &json).is_err() {
                log::warn!("Failed to save best score");
            } else {
                log::info!("Best score {} saved", score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert_eq!(store.read_best_score(), 0);
        store.write_best_score(1200);
        assert_eq!(store.read_best_score(), 1200);
        assert_eq!(store.writes, 1);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip_and_corruption() {
        let path = std::env::temp_dir().join(format!("tilecade_best_{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::new(&path);
        assert_eq!(store.read_best_score(), 0);
        store.write_best_score(4200);
        assert_eq!(FileStore::new(&path).read_best_score(), 4200);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(store.read_best_score(), 0);
        let _ = std::fs::remove_file(&path);
    }
}
