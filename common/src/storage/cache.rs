use std::collections::HashMap;

use tokio::sync::RwLock;

/// Process-lifetime answer memo keyed on the exact query text.
///
/// Keys are compared byte for byte: no trimming, case folding or other
/// normalisation. Entries are never evicted. Concurrent writers for the same
/// key resolve last-writer-wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, String>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, query: &str) -> Option<String> {
        self.entries.read().await.get(query).cloned()
    }

    pub async fn put(&self, query: String, answer: String) {
        self.entries.write().await.insert(query, answer);
    }

    pub async fn contains(&self, query: &str) -> bool {
        self.entries.read().await.contains_key(query)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn keys_are_exact_strings() {
        let cache = ResponseCache::new();
        cache.put("What is X?".into(), "X is Y.".into()).await;

        assert_eq!(cache.get("What is X?").await.as_deref(), Some("X is Y."));
        assert_eq!(cache.get("what is x?").await, None);
        assert_eq!(cache.get(" What is X?").await, None);
        assert_eq!(cache.get("What is X? ").await, None);
    }

    #[tokio::test]
    async fn later_put_replaces_earlier_answer() {
        let cache = ResponseCache::new();
        cache.put("q".into(), "first".into()).await;
        cache.put("q".into(), "second".into()).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("q").await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn racing_writers_leave_one_consistent_entry() {
        let cache = Arc::new(ResponseCache::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.put("same question".into(), format!("answer {i}")).await;
            }));
        }
        for handle in handles {
            handle.await.expect("join");
        }

        assert_eq!(cache.len().await, 1);
        let answer = cache.get("same question").await.expect("entry present");
        assert!(answer.starts_with("answer "));
    }
}
