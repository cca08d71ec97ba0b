//! Single-threaded map abstraction wrapped by the coordinators
//!
//! Nothing here is thread-safe on its own. A coordinator moves its `Map` into
//! one worker task and every operation runs there.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Trait for key-value storage backends driven by a coordinator worker.
///
/// Implementations must be synchronous and fast: they run on the only worker
/// task, so a slow call stalls every caller.
pub trait Map: Send + 'static {
    type Key: Eq + Hash + Clone + Send + 'static;
    type Value: Clone + Send + 'static;

    /// Remove every entry.
    fn clear(&mut self);

    fn contains(&self, key: &Self::Key) -> bool;

    /// Remove `key`, returning the value it held.
    fn delete(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn get(&self, key: &Self::Key) -> Option<Self::Value>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys, in no particular order.
    fn keys(&self) -> Vec<Self::Key>;

    /// Insert or overwrite, returning the previous value.
    fn set(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Raw copy of the stored entries.
    fn storage(&self) -> HashMap<Self::Key, Self::Value>;
}

/// Default `Map` backed by a `HashMap`
#[derive(Debug, Clone)]
pub struct BasicMap<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> BasicMap<K, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }
}

impl<K, V> Default for BasicMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<HashMap<K, V>> for BasicMap<K, V> {
    fn from(map: HashMap<K, V>) -> Self {
        Self { map }
    }
}

impl<K, V> FromIterator<(K, V)> for BasicMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl<K, V> Map for BasicMap<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    type Key = K;
    type Value = V;

    fn clear(&mut self) {
        self.map.clear();
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn keys(&self) -> Vec<K> {
        self.map.keys().cloned().collect()
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn storage(&self) -> HashMap<K, V> {
        self.map.clone()
    }
}

/// Renders `map[k1:v1 k2:v2]`, entries sorted by their rendered text.
impl<K, V> fmt::Display for BasicMap<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .map
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect();
        entries.sort();
        write!(f, "map[{}]", entries.join(" "))
    }
}
