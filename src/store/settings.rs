use std::collections::BTreeMap;
use std::sync::RwLock;

/// Session-scoped persisted key/value settings.
pub trait SettingsProvider: Send + Sync {
    /// Every stored pair, in key order.
    fn entries(&self) -> Vec<(String, String)>;
}

/// Settings held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key)
    }
}

impl SettingsProvider for InMemorySettings {
    fn entries(&self) -> Vec<(String, String)> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrite_remove() {
        let settings = InMemorySettings::new();
        settings.set("hybrid.darkness_weight", "0.5");
        settings.set("hybrid.darkness_weight", "0.3");
        assert_eq!(
            settings.entries(),
            vec![("hybrid.darkness_weight".to_string(), "0.3".to_string())]
        );
        assert_eq!(settings.remove("hybrid.darkness_weight").as_deref(), Some("0.3"));
        assert!(settings.entries().is_empty());
    }

    #[test]
    fn test_entries_sorted_by_key() {
        let settings = InMemorySettings::new();
        settings.set("b", "2");
        settings.set("a", "1");
        let keys: Vec<String> = settings.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
