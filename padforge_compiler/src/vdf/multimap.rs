//! Insertion-ordered multi-valued map backing the VDF document model.

use std::collections::HashMap;

/// One VDF value: a scalar string or a nested table.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(String),
    Table(Document),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Document> {
        match self {
            Value::Scalar(_) => None,
            Value::Table(t) => Some(t),
        }
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::Scalar(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::Scalar(val.to_owned())
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Scalar(if val { "1".to_owned() } else { "0".to_owned() })
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::Scalar(val.to_string())
    }
}

impl From<Document> for Value {
    fn from(val: Document) -> Self {
        Value::Table(val)
    }
}

/// Sink filled by the parser; lets the same descent build either a
/// multi-valued document or a plain last-write-wins map.
pub trait Store: Default {
    fn insert_scalar(&mut self, key: String, value: String);
    fn insert_table(&mut self, key: String, table: Self);
}

/// Mapping from string keys to values, preserving the first-insertion
/// order of keys. Assigning to an existing key appends another value for
/// it; single-valued access returns the last assignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Distinct keys in first-insertion order.
    order: Vec<String>,

    /// Per-key values in assignment order.
    slots: HashMap<String, Vec<Value>>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Assign `value` to `key`. A repeated key grows that key's sequence.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let slot = self.slots.entry(key.clone()).or_default();
        if slot.is_empty() {
            self.order.push(key);
        }
        slot.push(value.into());
    }

    /// Last value assigned to `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.slots.get(key).and_then(|values| values.last())
    }

    /// The `n`-th value assigned to `key`.
    pub fn get_at(&self, key: &str, n: usize) -> Option<&Value> {
        self.slots.get(key).and_then(|values| values.get(n))
    }

    /// Every value assigned to `key`, in assignment order.
    pub fn get_all(&self, key: &str) -> Option<&[Value]> {
        self.slots.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Remove the key entirely, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<Value>> {
        let removed = self.slots.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Distinct keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Yields one `(key, value)` pair per assignment; a multi-valued key
    /// yields its values consecutively in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order.iter().flat_map(move |key| {
            self.slots
                .get(key)
                .into_iter()
                .flatten()
                .map(move |value| (key.as_str(), value))
        })
    }
}

impl Store for Document {
    fn insert_scalar(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    fn insert_table(&mut self, key: String, table: Self) {
        self.insert(key, table);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (key, value) in iter {
            doc.insert(key, value);
        }
        doc
    }
}

/// Value of a [`FlatDocument`].
#[derive(Clone, Debug, PartialEq)]
pub enum FlatValue {
    Scalar(String),
    Table(FlatDocument),
}

/// Last-write-wins variant of [`Document`], still insertion-ordered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatDocument {
    order: Vec<String>,
    slots: HashMap<String, FlatValue>,
}

impl FlatDocument {
    pub fn insert(&mut self, key: impl Into<String>, value: FlatValue) {
        let key = key.into();
        if self.slots.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.slots.get(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.order.iter().filter_map(move |key| {
            self.slots.get(key).map(|value| (key.as_str(), value))
        })
    }
}

impl Store for FlatDocument {
    fn insert_scalar(&mut self, key: String, value: String) {
        self.insert(key, FlatValue::Scalar(value));
    }

    fn insert_table(&mut self, key: String, table: Self) {
        self.insert(key, FlatValue::Table(table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_assignment_evolution() {
        let mut d = Document::new();
        d.insert("a", "1");
        d.insert("a", "2");
        assert_eq!(d.get("a").and_then(Value::as_str), Some("2"));
        d.insert("a", "3");
        assert_eq!(d.get("a").and_then(Value::as_str), Some("3"));

        let all: Vec<&str> =
            d.get_all("a").unwrap().iter().filter_map(Value::as_str).collect();
        assert_eq!(all, vec!["1", "2", "3"]);
        assert_eq!(d.get_at("a", 0).and_then(Value::as_str), Some("1"));
        assert_eq!(d.get_at("a", 2).and_then(Value::as_str), Some("3"));
        assert!(d.get_at("a", 3).is_none());

        d.remove("a");
        assert!(d.get("a").is_none());
        assert!(d.get_all("a").is_none());
        assert!(d.is_empty());
    }

    #[test]
    fn iteration_groups_by_first_insertion() {
        let mut d = Document::new();
        d.insert("a", "1");
        d.insert("b", "2");
        d.insert("a", "3");

        let pairs: Vec<(&str, &str)> =
            d.iter().map(|(k, v)| (k, v.as_str().unwrap())).collect();
        assert_eq!(pairs, vec![("a", "1"), ("a", "3"), ("b", "2")]);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn scalar_conversions() {
        let mut d = Document::new();
        d.insert("flag", true);
        d.insert("count", 42i64);
        assert_eq!(d.get("flag").and_then(Value::as_str), Some("1"));
        assert_eq!(d.get("count").and_then(Value::as_str), Some("42"));
    }

    #[test]
    fn flat_store_overwrites() {
        let mut d = FlatDocument::default();
        d.insert_scalar("a".into(), "1".into());
        d.insert_scalar("b".into(), "2".into());
        d.insert_scalar("a".into(), "3".into());
        assert_eq!(d.len(), 2);
        assert_eq!(d.get("a"), Some(&FlatValue::Scalar("3".into())));

        let order: Vec<&str> = d.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["a", "b"]);
    }
}
