//! Highest unlocked level, persisted between visits.

/// First level is always open.
pub const FIRST_LEVEL: u32 = 1;

/// Where the unlock counter lives.
pub trait UnlockStore {
    /// Highest unlocked level id. Never below [`FIRST_LEVEL`].
    fn get(&self) -> u32;
    fn set(&mut self, highest: u32);
}

/// Read a stored counter. Missing, unparsable or zero values mean level 1.
pub fn parse_unlocked(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n >= FIRST_LEVEL)
        .unwrap_or(FIRST_LEVEL)
}

/// In-process store for native builds and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUnlockStore {
    highest: u32,
}

impl MemoryUnlockStore {
    pub fn new() -> Self {
        Self {
            highest: FIRST_LEVEL,
        }
    }

    pub fn with_highest(highest: u32) -> Self {
        Self {
            highest: highest.max(FIRST_LEVEL),
        }
    }
}

impl Default for MemoryUnlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockStore for MemoryUnlockStore {
    fn get(&self) -> u32 {
        self.highest
    }

    fn set(&mut self, highest: u32) {
        self.highest = highest.max(FIRST_LEVEL);
    }
}

/// Browser LocalStorage under `protect_the_egg_unlocked`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageUnlockStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageUnlockStore {
    const STORAGE_KEY: &'static str = "protect_the_egg_unlocked";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl UnlockStore for LocalStorageUnlockStore {
    fn get(&self) -> u32 {
        let raw = Self::storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());
        parse_unlocked(raw.as_deref())
    }

    fn set(&mut self, highest: u32) {
        match Self::storage() {
            Some(storage) => {
                if storage
                    .set_item(Self::STORAGE_KEY, &highest.to_string())
                    .is_err()
                {
                    log::warn!("could not persist unlocked level {}", highest);
                } else {
                    log::info!("unlocked up to level {}", highest);
                }
            }
            None => log::warn!("no local storage, unlock progress is not saved"),
        }
    }
}

/// Persistent store on the web, in-memory elsewhere.
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn UnlockStore> {
    Box::new(LocalStorageUnlockStore)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn UnlockStore> {
    Box::new(MemoryUnlockStore::new())
}
