// Best finish time persistence. Every backend is best effort: a missing or
// unreadable record is "no record yet", a failed write is logged and dropped.

pub const BEST_TIME_KEY: &str = "dimension_n1.best_time";

pub trait BestTimeStore {
    fn load(&self) -> Option<f64>;
    fn save(&mut self, seconds: f64);
}

/// Only finite, positive values count as a record.
pub fn parse_best_time(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
}

/// In-process store, used by tests and when no persistent backend exists.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    value: Option<f64>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn new(value: Option<f64>) -> Self {
        Self { value, writes: 0 }
    }
}

impl BestTimeStore for MemoryStore {
    fn load(&self) -> Option<f64> {
        self.value
    }

    fn save(&mut self, seconds: f64) {
        self.value = Some(seconds);
        self.writes += 1;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;

    /// `window.localStorage` backed store.
    pub struct LocalStorageStore {
        storage: Option<web_sys::Storage>,
    }

    impl LocalStorageStore {
        pub fn new(window: &web_sys::Window) -> Self {
            let storage = match window.local_storage() {
                Ok(Some(storage)) => Some(storage),
                Ok(None) => {
                    tracing::warn!("localStorage unavailable, best time will not persist");
                    None
                }
                Err(e) => {
                    tracing::warn!("localStorage access denied: {e:?}");
                    None
                }
            };
            Self { storage }
        }
    }

    impl BestTimeStore for LocalStorageStore {
        fn load(&self) -> Option<f64> {
            let raw = self.storage.as_ref()?.get_item(BEST_TIME_KEY).ok()??;
            parse_best_time(&raw)
        }

        fn save(&mut self, seconds: f64) {
            if let Some(storage) = &self.storage {
                if let Err(e) = storage.set_item(BEST_TIME_KEY, &seconds.to_string()) {
                    tracing::warn!("failed to store best time: {e:?}");
                }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::path::PathBuf;

    /// Plain text file holding the best time in seconds.
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// `DIMENSION_BEST_FILE`, or `dimension_best_time.txt` in the working directory.
        pub fn from_env() -> Self {
            let path = std::env::var("DIMENSION_BEST_FILE")
                .unwrap_or_else(|_| "dimension_best_time.txt".to_string());
            Self::new(path)
        }
    }

    impl BestTimeStore for FileStore {
        fn load(&self) -> Option<f64> {
            let raw = std::fs::read_to_string(&self.path).ok()?;
            parse_best_time(&raw)
        }

        fn save(&mut self, seconds: f64) {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = std::fs::write(&self.path, seconds.to_string()) {
                tracing::warn!("failed to write {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_garbage_and_non_positive() {
        assert_eq!(parse_best_time(" 42.5\n"), Some(42.5));
        assert_eq!(parse_best_time("abc"), None);
        assert_eq!(parse_best_time("0"), None);
        assert_eq!(parse_best_time("-3"), None);
        assert_eq!(parse_best_time("NaN"), None);
        assert_eq!(parse_best_time("inf"), None);
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryStore::new(None);
        assert_eq!(store.load(), None);
        store.save(12.0);
        assert_eq!(store.load(), Some(12.0));
        assert_eq!(store.writes, 1);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_store_round_trips_and_tolerates_missing_file() {
        let dir = std::env::temp_dir().join(format!("dimension_n1_test_{}", std::process::id()));
        let path = dir.join("best.txt");
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::new(&path);
        assert_eq!(store.load(), None);
        store.save(33.25);
        assert_eq!(store.load(), Some(33.25));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
