// Flat property bags
//
// The appliance stores every user and group as a flat map of string
// properties. Multi-valued fields are spread over numbered keys
// (`access_to.0`, `access_to.1`, ...) and MAC addresses over five fixed
// slots. This module owns those naming conventions.

use crate::xmlrpc::{Member, Value};

/// Fixed slot names for up to five hardware addresses, in order.
pub const HW_ADDR_SLOTS: [&str; 5] = [
    "pvt_hw_addr",
    "pvt_hw_addr2",
    "pvt_hw_addr3",
    "pvt_hw_addr4",
    "pvt_hw_addr5",
];

/// Ordered string-to-string property map.
///
/// Insertion order is preserved so encoded structs are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: Vec<(String, String)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect scalar members of a decoded struct.
    ///
    /// Non-scalar members (nested structs, arrays, nil) carry no
    /// property text and are dropped.
    pub fn from_struct(members: &[Member]) -> Self {
        let entries = members
            .iter()
            .filter_map(|m| m.value.scalar_text().map(|v| (m.name.clone(), v)))
            .collect();
        Self { entries }
    }

    /// Set a property, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set a property only when the value is non-empty.
    pub fn insert_non_empty(&mut self, key: impl Into<String>, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or `""` when absent.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// `true` when the property is `"true"` or `"1"`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v == "true" || v == "1")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values of `base.N` keys, ordered by the numeric suffix.
    ///
    /// Keys whose suffix is not a non-negative integer are ignored.
    pub fn indexed(&self, base: &str) -> Vec<&str> {
        self.indexed_entries(base)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    /// The `base.N` keys present, ordered by suffix. Gaps in the numbering
    /// are kept as they are.
    pub fn indexed_keys(&self, base: &str) -> Vec<String> {
        self.indexed_entries(base)
            .into_iter()
            .map(|(k, _)| k.to_owned())
            .collect()
    }

    fn indexed_entries(&self, base: &str) -> Vec<(&str, &str)> {
        let mut found: Vec<(u32, &str, &str)> = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                let suffix = k.strip_prefix(base)?.strip_prefix('.')?;
                let idx = suffix.parse::<u32>().ok()?;
                Some((idx, k.as_str(), v.as_str()))
            })
            .collect();
        found.sort_by_key(|(idx, _, _)| *idx);
        found.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    /// Write `values` as `base.0`, `base.1`, ...
    pub fn push_indexed<S: AsRef<str>>(&mut self, base: &str, values: &[S]) {
        for (i, v) in values.iter().enumerate() {
            self.insert(format!("{base}.{i}"), v.as_ref());
        }
    }

    /// Non-empty hardware address slots, in slot order.
    pub fn hw_addrs(&self) -> Vec<&str> {
        HW_ADDR_SLOTS
            .iter()
            .filter_map(|slot| self.get(slot))
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Hardware address slots present, empty ones included.
    pub fn hw_addr_keys(&self) -> Vec<String> {
        HW_ADDR_SLOTS
            .iter()
            .filter(|slot| self.get(slot).is_some())
            .map(|slot| (*slot).to_owned())
            .collect()
    }

    /// Write up to five addresses into the fixed slots.
    ///
    /// Addresses beyond the fifth are ignored.
    pub fn push_hw_addrs<S: AsRef<str>>(&mut self, addrs: &[S]) {
        for (slot, addr) in HW_ADDR_SLOTS.iter().zip(addrs) {
            self.insert(*slot, addr.as_ref());
        }
    }

    /// Encode as an XML-RPC struct of string members.
    pub fn to_struct(&self) -> Value {
        Value::Struct(
            self.entries
                .iter()
                .map(|(k, v)| Member::new(k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Property names, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}
