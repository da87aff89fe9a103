//! Records: ordered string/index keyed property maps
//!
//! Keys iterate in insertion order. Deleting a key removes it from the order;
//! re-inserting it appends it at the end.

use crate::descriptor::{PropertyAttributes, PropertyDescriptor};
use crate::error::{ProxyError, ProxyResult};
use crate::key::{MAX_INDEX, PropertyKey};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A record shared between its owner and any handles wrapping it
pub type SharedRecord = Rc<RefCell<Record>>;

#[derive(Clone, Debug)]
struct Slot {
    value: Value,
    attributes: PropertyAttributes,
}

/// An ordered property map
#[derive(Clone, Debug, Default)]
pub struct Record {
    properties: IndexMap<PropertyKey, Slot>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array-shaped record with index keys `0..n`
    ///
    /// Values past the largest valid index are dropped.
    pub fn array<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut record = Self::new();
        for (index, value) in (0..=MAX_INDEX).zip(values) {
            record.set(index, value);
        }
        record
    }

    /// Move into a shared reference
    pub fn into_shared(self) -> SharedRecord {
        Rc::new(RefCell::new(self))
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the record has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Get an own property value
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        self.properties.get(key).map(|slot| slot.value.clone())
    }

    /// Whether an own property exists
    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// Assign a property
    ///
    /// New properties get default data attributes; existing ones keep theirs.
    /// Returns `false` (and leaves the record untouched) when the existing
    /// property is non-writable.
    pub fn set(&mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.properties.get_mut(&key) {
            Some(slot) if !slot.attributes.writable => false,
            Some(slot) => {
                slot.value = value;
                true
            }
            None => {
                self.properties.insert(
                    key,
                    Slot {
                        value,
                        attributes: PropertyAttributes::data(),
                    },
                );
                true
            }
        }
    }

    /// Define (or redefine) a property with explicit attributes
    ///
    /// A descriptor without a value keeps the existing value, or stores
    /// undefined for a new property.
    pub fn define_property(&mut self, key: impl Into<PropertyKey>, desc: PropertyDescriptor) {
        let key = key.into();
        let value = match desc.value {
            Some(value) => value,
            None => self.get(&key).unwrap_or_default(),
        };
        match self.properties.get_mut(&key) {
            Some(slot) => {
                slot.value = value;
                slot.attributes = desc.attributes;
            }
            None => {
                self.properties.insert(
                    key,
                    Slot {
                        value,
                        attributes: desc.attributes,
                    },
                );
            }
        }
    }

    /// Delete an own property
    ///
    /// Returns `true` if the property is gone afterwards (including when it
    /// never existed) and `false` if it is non-configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(slot) if !slot.attributes.configurable => false,
            Some(_) => {
                self.properties.shift_remove(key);
                true
            }
            None => true,
        }
    }

    /// Natural descriptor of an own property
    pub fn get_own_property_descriptor(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.properties
            .get(key)
            .map(|slot| PropertyDescriptor::data_with_attrs(slot.value.clone(), slot.attributes))
    }

    /// Own keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.keys()
    }

    /// Own keys in insertion order, collected
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.properties.keys().cloned().collect()
    }

    /// Own values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.properties.values().map(|slot| &slot.value)
    }

    /// Own key/value pairs in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&PropertyKey, &Value)> {
        self.properties.iter().map(|(k, slot)| (k, &slot.value))
    }

    /// Index one past the highest index key
    ///
    /// Fails once the highest valid index is taken.
    pub fn next_index(&self) -> ProxyResult<u32> {
        match self.properties.keys().filter_map(PropertyKey::as_index).max() {
            None => Ok(0),
            Some(MAX_INDEX) => Err(ProxyError::type_error("Invalid array length")),
            Some(i) => Ok(i + 1),
        }
    }

    /// Append at [`Record::next_index`], returning the index used
    pub fn push(&mut self, value: impl Into<Value>) -> ProxyResult<u32> {
        let index = self.next_index()?;
        self.set(index, value);
        Ok(index)
    }

    /// Whether the keys are exactly the dense indices `0..len` in order
    pub fn is_array_like(&self) -> bool {
        !self.properties.is_empty()
            && self
                .properties
                .keys()
                .enumerate()
                .all(|(i, key)| key.as_index() == Some(i as u32))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<PropertyKey>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.set(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    #[test]
    fn test_insertion_order() {
        let record: Record = [("name", Value::from("John")), ("age", Value::from(30))]
            .into_iter()
            .collect();
        let keys: Vec<String> = record.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["name", "age"]);
    }

    #[test]
    fn test_delete_and_reinsert_moves_to_end() {
        let mut record: Record = [("a", 1), ("b", 2)].into_iter().collect();
        assert!(record.delete(&key("a")));
        record.set("a", 3);
        assert_eq!(record.own_keys(), vec![key("b"), key("a")]);
    }

    #[test]
    fn test_frozen_property() {
        let mut record = Record::new();
        record.define_property("id", PropertyDescriptor::data_with_attrs(7.into(), PropertyAttributes::frozen()));
        assert!(!record.set("id", 8));
        assert!(!record.delete(&key("id")));
        assert_eq!(record.get(&key("id")), Some(Value::number(7.0)));
    }

    #[test]
    fn test_delete_missing_is_true() {
        let mut record = Record::new();
        assert!(record.delete(&key("nothing")));
    }

    #[test]
    fn test_array_push() {
        let mut record = Record::array([1, 2, 3]);
        assert!(record.is_array_like());
        assert_eq!(record.push(4).unwrap(), 3);
        assert_eq!(record.get(&PropertyKey::Index(3)), Some(Value::number(4.0)));

        let mut sparse = Record::new();
        sparse.set(5u32, 1);
        assert_eq!(sparse.next_index().unwrap(), 6);
        assert!(!sparse.is_array_like());
    }

    #[test]
    fn test_push_stops_at_last_index() {
        let mut record = Record::new();
        assert_eq!(record.push("first").unwrap(), 0);
        record.set(MAX_INDEX - 1, "almost");
        assert_eq!(record.push("last").unwrap(), MAX_INDEX);
        assert_eq!(record.get(&PropertyKey::from("4294967294")), Some(Value::from("last")));

        let err = record.push("overflow").unwrap_err();
        assert_eq!(err, ProxyError::type_error("Invalid array length"));
        assert!(record.next_index().is_err());
        assert_eq!(record.len(), 3);
        assert_eq!(record.get(&PropertyKey::Index(MAX_INDEX)), Some(Value::from("last")));
    }

    #[test]
    fn test_define_without_value_keeps_value() {
        let mut record: Record = [("x", 1)].into_iter().collect();
        record.define_property("x", PropertyDescriptor::flags(false, true));
        let desc = record.get_own_property_descriptor(&key("x")).unwrap();
        assert_eq!(desc.value(), Some(&Value::number(1.0)));
        assert!(!desc.is_enumerable());
    }
}
