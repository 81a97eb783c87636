//! Lock-guarded list of strings.
//!
//! Readers use it to remember which channels they have joined. Every
//! operation takes the same exclusive lock, so no caller ever observes
//! half of another caller's mutation.

use std::sync::Mutex;

use crate::error::{CoreError, CoreResult};

/// An ordered list of strings behind a single mutex.
///
/// `add` does not deduplicate; joining the same channel twice records it
/// twice and it then takes two `remove` calls to forget it.
#[derive(Debug, Default)]
pub struct ConcurrentStringSet {
    items: Mutex<Vec<String>>,
}

impl ConcurrentStringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string.
    pub fn add(&self, item: impl Into<String>) {
        let mut items = self.items.lock().expect("string set lock");
        items.push(item.into());
    }

    /// Whether the string is present.
    pub fn has(&self, item: &str) -> bool {
        let items = self.items.lock().expect("string set lock");
        items.iter().any(|s| s == item)
    }

    /// Remove the last occurrence of `item`. Returns whether anything was removed.
    pub fn remove(&self, item: &str) -> bool {
        let mut items = self.items.lock().expect("string set lock");
        match items.iter().rposition(|s| s == item) {
            Some(idx) => {
                items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> CoreResult<String> {
        let items = self.items.lock().expect("string set lock");
        items
            .get(index)
            .cloned()
            .ok_or(CoreError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Independent copy of the current contents.
    pub fn list(&self) -> Vec<String> {
        let items = self.items.lock().expect("string set lock");
        items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("string set lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_on_creation() {
        let set = ConcurrentStringSet::new();
        assert!(set.list().is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn add_get_has_remove() {
        let set = ConcurrentStringSet::new();
        set.add("apple");
        assert_eq!(set.len(), 1);
        set.add("banana");
        assert_eq!(set.len(), 2);

        assert_eq!(set.get(0).unwrap(), "apple");
        assert!(!set.has("orange"));
        assert!(set.has("apple"));

        assert!(set.remove("apple"));
        assert!(!set.has("apple"));

        set.add("raspberry");
        set.add("peach");
        set.add("strawberry");
        set.add("kiwi");

        assert_eq!(
            set.list(),
            vec!["banana", "raspberry", "peach", "strawberry", "kiwi"]
        );
    }

    #[test]
    fn get_out_of_range_fails() {
        let set = ConcurrentStringSet::new();
        set.add("only");

        let err = set.get(1).unwrap_err();
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn remove_absent_is_noop() {
        let set = ConcurrentStringSet::new();
        set.add("a");
        assert!(!set.remove("b"));
        assert_eq!(set.list(), vec!["a"]);
    }

    #[test]
    fn duplicates_are_kept_and_removed_from_the_end() {
        let set = ConcurrentStringSet::new();
        set.add("#x");
        set.add("#y");
        set.add("#x");

        assert!(set.remove("#x"));
        assert_eq!(set.list(), vec!["#x", "#y"]);

        assert!(set.remove("#x"));
        assert_eq!(set.list(), vec!["#y"]);
    }

    #[test]
    fn list_is_a_snapshot() {
        let set = ConcurrentStringSet::new();
        set.add("a");
        set.add("b");

        let mut snapshot = set.list();
        set.add("c");
        set.remove("a");
        assert_eq!(snapshot, vec!["a", "b"]);

        snapshot.push("z".to_string());
        assert_eq!(set.list(), vec!["b", "c"]);
    }

    #[test]
    fn matches_reference_model() {
        // Deterministic pseudo-random op sequence checked against a plain Vec.
        let set = ConcurrentStringSet::new();
        let mut model: Vec<String> = Vec::new();
        let words = ["#a", "#b", "#c", "#d"];
        let mut seed: u32 = 0x2545_f491;

        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let word = words[(seed % 4) as usize];
            match (seed >> 8) % 3 {
                0 => {
                    set.add(word);
                    model.push(word.to_string());
                }
                1 => {
                    set.remove(word);
                    if let Some(idx) = model.iter().rposition(|s| s == word) {
                        model.remove(idx);
                    }
                }
                _ => assert_eq!(set.has(word), model.iter().any(|s| s == word)),
            }
        }

        assert_eq!(set.list(), model);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        use std::sync::Arc;
        use std::thread;

        let set = Arc::new(ConcurrentStringSet::new());
        let mut handles = vec![];

        for t in 0..8 {
            let set = set.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    set.add(format!("#t{t}-{i}"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(set.len(), 800);

        let mut handles = vec![];
        for t in 0..8 {
            let set = set.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    assert!(set.remove(&format!("#t{t}-{i}")));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(set.is_empty());
    }
}
