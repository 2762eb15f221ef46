//! Most-recently-used ordering.
//!
//! [`MruOrder`] is an ordered list of [`MruKey`]s, most recent first.  Keys
//! may refer to items that are no longer running; those are skipped when a
//! candidate list is built and only move when the key is promoted again.

use crate::item::MruKey;
use serde::{Deserialize, Serialize};

/// Ordered MRU keys without duplicates, head = most recent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MruOrder {
    keys: Vec<MruKey>,
}

impl MruOrder {
    /// Build an order from persisted keys.  Later duplicates are dropped.
    pub fn from_keys(keys: impl IntoIterator<Item = MruKey>) -> Self {
        let mut order = Self::default();
        for key in keys {
            if !order.keys.contains(&key) {
                order.keys.push(key);
            }
        }
        order
    }

    /// Move `key` to the front, removing any earlier occurrence.
    pub fn promote(&mut self, key: MruKey) {
        self.keys.retain(|k| k != &key);
        self.keys.insert(0, key);
    }

    /// Delete every occurrence of `key`.
    pub fn remove(&mut self, key: &MruKey) {
        self.keys.retain(|k| k != key);
    }

    /// Position of `key`, if present.
    pub fn rank(&self, key: &MruKey) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn keys(&self) -> &[MruKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MruKey {
        MruKey::new(s)
    }

    fn order(keys: &[&str]) -> MruOrder {
        MruOrder::from_keys(keys.iter().map(|k| key(k)))
    }

    #[test]
    fn promote_moves_existing_key_to_front() {
        let mut o = order(&["a", "b", "c"]);
        o.promote(key("c"));
        assert_eq!(o, order(&["c", "a", "b"]));
    }

    #[test]
    fn promote_inserts_new_key_at_front() {
        let mut o = order(&["a"]);
        o.promote(key("z"));
        assert_eq!(o, order(&["z", "a"]));
    }

    #[test]
    fn promote_twice_equals_promote_once() {
        let mut once = order(&["a", "b", "c"]);
        once.promote(key("b"));
        let mut twice = order(&["a", "b", "c"]);
        twice.promote(key("b"));
        twice.promote(key("b"));
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_deletes_key() {
        let mut o = order(&["a", "b", "c"]);
        o.remove(&key("b"));
        assert_eq!(o, order(&["a", "c"]));
        o.remove(&key("missing"));
        assert_eq!(o.len(), 2);
    }

    #[test]
    fn from_keys_drops_duplicates() {
        let o = order(&["a", "b", "a", "c", "b"]);
        assert_eq!(o.keys(), &[key("a"), key("b"), key("c")]);
    }

    #[test]
    fn persisted_form_is_plain_array() {
        let o = order(&["x:1", "y:2"]);
        assert_eq!(serde_json::to_string(&o).unwrap(), r#"["x:1","y:2"]"#);
        let back: MruOrder = serde_json::from_str(r#"["x:1","y:2"]"#).unwrap();
        assert_eq!(back.rank(&key("y:2")), Some(1));
    }
}
