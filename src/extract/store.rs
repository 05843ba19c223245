use std::collections::{HashMap, HashSet};

/// Insertion-ordered set of strings
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    /// Inserts a value, returning true if it was not present
    pub fn insert(&mut self, value: &str) -> bool {
        if self.seen.contains(value) {
            return false;
        }
        self.seen.insert(value.to_string());
        self.items.push(value.to_string());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in first-insertion order
    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }
}

/// Canonical URLs captured so far, per crawl target and overall
///
/// Both views enforce uniqueness, so inserting the same URL twice is a no-op.
/// The store lives inside an [`ExtractionEngine`](super::ExtractionEngine)
/// and is only reached through its methods.
#[derive(Debug, Default)]
pub struct ExtractionStore {
    by_target: HashMap<String, OrderedSet>,
    global: OrderedSet,
}

impl ExtractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a canonical URL for a target
    ///
    /// Returns true if the URL was new for that target.
    pub fn insert(&mut self, target_id: &str, url: &str) -> bool {
        self.global.insert(url);
        self.by_target
            .entry(target_id.to_string())
            .or_default()
            .insert(url)
    }

    pub fn target_urls(&self, target_id: &str) -> Vec<String> {
        self.by_target
            .get(target_id)
            .map(OrderedSet::to_vec)
            .unwrap_or_default()
    }

    pub fn all_urls(&self) -> Vec<String> {
        self.global.to_vec()
    }

    pub fn target_count(&self, target_id: &str) -> usize {
        self.by_target.get(target_id).map_or(0, OrderedSet::len)
    }

    pub fn total_count(&self) -> usize {
        self.global.len()
    }

    /// Empties both views
    pub fn clear(&mut self) {
        self.by_target.clear();
        self.global = OrderedSet::default();
    }
}
