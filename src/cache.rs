use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

/// Key under which a source text is cached.
pub fn cache_key(text: &str) -> &str {
    text.trim()
}

/// Process-lifetime translation cache keyed by trimmed source text.
///
/// Each key owns a single [`OnceCell`] slot. Concurrent lookups of the same
/// key share that slot, so only the first caller runs the upstream call and
/// the rest await its result.
#[derive(Debug, Default)]
pub struct TranslationCache {
    slots: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed translation for `text`, if any.
    pub fn get(&self, text: &str) -> Option<String> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(cache_key(text)).and_then(|slot| slot.get().cloned())
    }

    /// The slot for `text`, created empty on first use.
    pub fn slot(&self, text: &str) -> Arc<OnceCell<String>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(cache_key(text).to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    pub fn insert(&self, text: &str, translated: String) {
        // An already-filled slot keeps its first value.
        let _ = self.slot(text).set(translated);
    }

    /// Drops the slot for `text` when it holds no value and nobody else is
    /// waiting on it, so failed keys do not accumulate.
    pub fn evict_pending(&self, text: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let key = cache_key(text);
        if slots
            .get(key)
            .is_some_and(|slot| !slot.initialized() && Arc::strong_count(slot) == 1)
        {
            slots.remove(key);
        }
    }

    /// Number of slots, completed or not.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::TranslationCache;

    #[test]
    fn keys_are_trimmed() {
        let cache = TranslationCache::new();
        cache.insert("  Rated input ", "額定輸入".to_string());
        assert_eq!(cache.get("Rated input").as_deref(), Some("額定輸入"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn first_value_wins_and_slots_are_shared() {
        let cache = TranslationCache::new();
        let first = cache.slot("PASS");
        let second = cache.slot(" PASS");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_empty());

        cache.insert("PASS", "符合".to_string());
        cache.insert("PASS", "通過".to_string());
        assert_eq!(cache.get("PASS").as_deref(), Some("符合"));
    }

    #[test]
    fn only_unused_empty_slots_are_evicted() {
        let cache = TranslationCache::new();
        cache.insert("PASS", "符合".to_string());
        cache.evict_pending("PASS");
        assert_eq!(cache.slot_count(), 1);

        let held = cache.slot("FAIL");
        cache.evict_pending("FAIL");
        assert_eq!(cache.slot_count(), 2);

        drop(held);
        cache.evict_pending(" FAIL ");
        assert_eq!(cache.slot_count(), 1);
        assert_eq!(cache.get("PASS").as_deref(), Some("符合"));
    }
}
