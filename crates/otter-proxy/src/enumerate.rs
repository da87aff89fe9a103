//! Key enumeration
//!
//! [`OwnKeys`] is what `list_keys` produces: an ordered, finite key list that
//! can be iterated any number of times. The `for..in` style consumers below
//! combine it with `describe` and only surface keys whose descriptor is
//! enumerable; a key without a descriptor (for example one invented by an
//! `ownKeys` trap over an empty record) is skipped.

use crate::error::ProxyResult;
use crate::handle::InterceptingHandle;
use crate::key::PropertyKey;
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::slice;

/// Ordered own keys of a handle or record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnKeys(Vec<PropertyKey>);

impl OwnKeys {
    /// Iterate the keys in order; each call starts from the beginning
    pub fn iter(&self) -> slice::Iter<'_, PropertyKey> {
        self.0.iter()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `key` is listed
    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.0.contains(key)
    }

    /// Keys as a slice
    pub fn as_slice(&self) -> &[PropertyKey] {
        &self.0
    }

    /// Keys rendered as strings
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Take the underlying vector
    pub fn into_vec(self) -> Vec<PropertyKey> {
        self.0
    }
}

impl From<Vec<PropertyKey>> for OwnKeys {
    fn from(keys: Vec<PropertyKey>) -> Self {
        Self(keys)
    }
}

impl IntoIterator for OwnKeys {
    type Item = PropertyKey;
    type IntoIter = std::vec::IntoIter<PropertyKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OwnKeys {
    type Item = &'a PropertyKey;
    type IntoIter = slice::Iter<'a, PropertyKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Keys a `for..in` loop over the handle would visit
///
/// Listed keys are kept in order when `describe` reports them enumerable.
/// Repeated keys are visited once.
pub fn visible_keys(handle: &InterceptingHandle) -> ProxyResult<Vec<PropertyKey>> {
    let listed = handle.list_keys()?;
    let mut seen = FxHashSet::default();
    let mut visible = Vec::with_capacity(listed.len());
    for key in &listed {
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(desc) = handle.describe(key)?
            && desc.is_enumerable()
        {
            visible.push(key.clone());
        }
    }
    Ok(visible)
}

/// Visible keys paired with the values read through the handle
pub fn visible_entries(handle: &InterceptingHandle) -> ProxyResult<Vec<(PropertyKey, Value)>> {
    visible_keys(handle)?
        .into_iter()
        .map(|key| {
            let value = handle.read(&key)?;
            Ok((key, value))
        })
        .collect()
}
