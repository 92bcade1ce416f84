use std::collections::BTreeMap;

pub const LOCALE_KEY: &str = "locale";
pub const PROJECT_INFO_DISMISSED_KEY: &str = "projectInfoDismissed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    StorageUnavailable,
    Io(String),
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefsError::StorageUnavailable => write!(f, "browser storage unavailable"),
            PrefsError::Io(msg) => write!(f, "preference storage error: {msg}"),
        }
    }
}

impl std::error::Error for PrefsError {}

/// Client-side string key/value preferences.
pub trait PrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
    fn remove(&mut self, key: &str) -> Result<(), PrefsError>;

    /// Reads `"true"`/`"false"`; anything else counts as unset.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        Ok(match self.get(key)?.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        })
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.set(key, if value { "true" } else { "false" })
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPrefsStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryPrefsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PrefsStore for InMemoryPrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{PrefsError, PrefsStore};

    /// `window.localStorage`, keys used verbatim.
    #[derive(Debug)]
    pub struct LocalStoragePrefsStore {
        storage: web_sys::Storage,
    }

    impl LocalStoragePrefsStore {
        pub fn new() -> Result<Self, PrefsError> {
            Ok(Self {
                storage: window_local_storage()?,
            })
        }
    }

    impl PrefsStore for LocalStoragePrefsStore {
        fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
            self.storage
                .get_item(key)
                .map_err(|e| PrefsError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
            self.storage
                .set_item(key, value)
                .map_err(|e| PrefsError::Io(format!("set_item({key}) failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
            self.storage
                .remove_item(key)
                .map_err(|e| PrefsError::Io(format!("remove_item({key}) failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, PrefsError> {
        let win = web_sys::window().ok_or(PrefsError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| PrefsError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(PrefsError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStoragePrefsStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStoragePrefsStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStoragePrefsStore {
    pub fn new() -> Result<Self, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PrefsStore for LocalStoragePrefsStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<(), PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

/// Browser storage when available, memory otherwise.
pub fn default_prefs_store() -> Box<dyn PrefsStore> {
    match LocalStoragePrefsStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::debug!(error = %e, "falling back to in-memory preferences");
            Box::new(InMemoryPrefsStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        InMemoryPrefsStore, LocalStoragePrefsStore, PROJECT_INFO_DISMISSED_KEY, PrefsError,
        PrefsStore, default_prefs_store,
    };

    #[test]
    fn bool_helpers_round_trip() {
        let mut prefs = InMemoryPrefsStore::new();
        assert_eq!(prefs.get_bool(PROJECT_INFO_DISMISSED_KEY), Ok(None));
        prefs.set_bool(PROJECT_INFO_DISMISSED_KEY, true).expect("set");
        assert_eq!(prefs.get_bool(PROJECT_INFO_DISMISSED_KEY), Ok(Some(true)));
        prefs.set(PROJECT_INFO_DISMISSED_KEY, "yes").expect("set");
        assert_eq!(prefs.get_bool(PROJECT_INFO_DISMISSED_KEY), Ok(None));
        prefs.remove(PROJECT_INFO_DISMISSED_KEY).expect("remove");
        assert!(prefs.is_empty());
    }

    #[test]
    fn native_local_storage_is_unavailable() {
        assert_eq!(
            LocalStoragePrefsStore::new().map(|_| ()),
            Err(PrefsError::StorageUnavailable)
        );
        let mut fallback = default_prefs_store();
        fallback.set("locale", "pl").expect("memory store accepts writes");
        assert_eq!(fallback.get("locale"), Ok(Some("pl".to_string())));
    }
}
